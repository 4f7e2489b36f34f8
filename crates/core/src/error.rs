//! Structured error handling with context and recovery suggestions
//!
//! This module provides structured error types with:
//! - Detailed error context
//! - Recovery suggestions
//! - Error codes for programmatic handling
//! - Serializable error reports

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // General errors (1xxx)
    Unknown = 1000,
    Internal = 1001,

    // IO errors (2xxx)
    IoError = 2000,
    FileNotFound = 2001,
    PermissionDenied = 2002,
    InvalidPath = 2003,
    DirectoryNotFound = 2004,

    // Configuration errors (3xxx)
    ConfigError = 3000,
    ConfigNotFound = 3001,
    ConfigParseError = 3002,
    InvalidConfigValue = 3003,

    // Metadata errors (4xxx)
    MetadataError = 4000,
    MalformedSdkValue = 4001,

    // Manifest errors (5xxx)
    ManifestError = 5000,
    ManifestParseError = 5001,
    MissingAttribute = 5002,

    // Process errors (6xxx)
    ProcessError = 6000,
    CommandNotFound = 6001,
    CommandFailed = 6002,
    ApktoolFailed = 6003,
    EmptyDecodeOutput = 6004,

    // Workspace errors (7xxx)
    WorkspaceError = 7000,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            1 => "General",
            2 => "IO",
            3 => "Configuration",
            4 => "Metadata",
            5 => "Manifest",
            6 => "Process",
            7 => "Workspace",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {}", ctx)?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {}", suggestion)?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Convert to a serializable report
    pub fn to_report(&self) -> ErrorReport {
        ErrorReport {
            code: self.code,
            code_str: self.code.to_string(),
            category: self.code.category().to_string(),
            message: self.message.clone(),
            context: self.context.clone(),
            suggestion: self.suggestion.clone(),
            source: self.source.as_ref().map(|e| e.to_string()),
        }
    }

    // Convenience constructors

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::IoError, message)
    }

    pub fn file_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::FileNotFound,
            format!("File not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Check that the file exists and you have read permissions")
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .apkscout.toml file or use --config to specify a path")
    }

    pub fn metadata(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MetadataError, message)
    }

    pub fn malformed_sdk_value(field: &str, raw: &str) -> Self {
        Self::new(
            ErrorCode::MalformedSdkValue,
            format!("Malformed {} value: {:?}", field, raw),
        )
        .with_suggestion("Re-decode the APK; the apktool.yml metadata may be corrupted")
    }

    pub fn manifest(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ManifestError, message)
    }

    pub fn missing_attribute(element: &str, attribute: &str) -> Self {
        Self::new(
            ErrorCode::MissingAttribute,
            format!("Element <{}> is missing the {} attribute", element, attribute),
        )
        .with_suggestion("The manifest may be obfuscated or decoded incompletely")
    }

    pub fn process(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ProcessError, message)
    }

    pub fn command_not_found(cmd: &str) -> Self {
        Self::new(
            ErrorCode::CommandNotFound,
            format!("Command not found: {}", cmd),
        )
        .with_suggestion(format!("Install {} and ensure it's in your PATH", cmd))
    }

    pub fn apktool_failed(status: Option<i32>, stderr: &str) -> Self {
        let message = match status {
            Some(code) => format!("apktool exited with status {}", code),
            None => "apktool was terminated by a signal".to_string(),
        };
        let err = Self::new(ErrorCode::ApktoolFailed, message)
            .with_suggestion("Run with --verbose to see the full apktool invocation");
        let stderr = stderr.trim();
        if stderr.is_empty() {
            err
        } else {
            err.with_context(stderr.to_string())
        }
    }

    pub fn empty_decode_output(dir: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::EmptyDecodeOutput,
            format!(
                "apktool produced no output in {}",
                dir.as_ref().display()
            ),
        )
        .with_suggestion("Check that the input file is a valid APK")
    }

    pub fn workspace(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::WorkspaceError, message)
    }
}

/// Serializable error report for logging and API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub code_str: String,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Exit codes for CLI commands
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const FAILURE: i32 = 1;
    pub const DANGEROUS_PERMISSIONS: i32 = 2;
    pub const CONFIG_ERROR: i32 = 3;
    pub const DECODE_ERROR: i32 = 4;
    pub const TIMEOUT: i32 = 124;
    pub const COMMAND_NOT_FOUND: i32 = 127;
}

// Implement From for common error types

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("JSON parse error: {}", err))
            .with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {}", err))
            .with_source(err)
    }
}

impl From<quick_xml::Error> for Error {
    fn from(err: quick_xml::Error) -> Self {
        Error::new(ErrorCode::ManifestParseError, format!("XML parse error: {}", err))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    fn context(self, context: impl Into<String>) -> Result<T>;
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::FileNotFound.to_string(), "E2001");
        assert_eq!(ErrorCode::MissingAttribute.to_string(), "E5002");
        assert_eq!(ErrorCode::ApktoolFailed.to_string(), "E6003");
    }

    #[test]
    fn test_error_code_category() {
        assert_eq!(ErrorCode::IoError.category(), "IO");
        assert_eq!(ErrorCode::MalformedSdkValue.category(), "Metadata");
        assert_eq!(ErrorCode::ManifestParseError.category(), "Manifest");
        assert_eq!(ErrorCode::EmptyDecodeOutput.category(), "Process");
    }

    #[test]
    fn test_error_with_context() {
        let err = Error::file_not_found("/path/to/app.apk")
            .with_context("While reading decode output");

        assert_eq!(err.code, ErrorCode::FileNotFound);
        assert!(err.context.is_some());
        assert!(err.suggestion.is_some());
    }

    #[test]
    fn test_apktool_failed_includes_stderr() {
        let err = Error::apktool_failed(Some(1), "brut.androlib.AndrolibException: bad magic\n");

        assert_eq!(err.code, ErrorCode::ApktoolFailed);
        assert!(err.message.contains("status 1"));
        assert_eq!(
            err.context.as_deref(),
            Some("brut.androlib.AndrolibException: bad magic")
        );
    }

    #[test]
    fn test_apktool_failed_signal() {
        let err = Error::apktool_failed(None, "");

        assert!(err.message.contains("signal"));
        assert!(err.context.is_none());
    }

    #[test]
    fn test_error_report_serialization() {
        let err = Error::manifest("Failed to read AndroidManifest.xml")
            .with_context("During permission scan");

        let report = err.to_report();
        let json = serde_json::to_string(&report).unwrap();

        assert!(json.contains("E5000"));
        assert!(json.contains("Manifest"));
    }
}
