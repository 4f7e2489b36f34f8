//! Configuration file loading

use super::schema::ConfigSchema;
use crate::error::{Error, ErrorCode, Result};
use std::path::{Path, PathBuf};

/// Environment variable overriding the configured apktool jar path
pub const APKTOOL_ENV: &str = "APKSCOUT_APKTOOL";

/// Configuration wrapper
#[derive(Debug, Clone)]
pub struct Config {
    pub schema: ConfigSchema,
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file path or use defaults
    ///
    /// Without an explicit path, standard locations are searched; when no
    /// file is found anywhere the built-in defaults apply.
    pub fn load(path: Option<&str>) -> Result<Self> {
        if let Some(p) = path {
            let p = Path::new(p);
            if !p.exists() {
                return Err(Error::config_not_found(p));
            }
            return Ok(Self {
                schema: load_config_file(p)?,
                path: Some(p.to_path_buf()),
            });
        }

        match find_config_file() {
            Some(p) => Ok(Self {
                schema: load_config_file(&p)?,
                path: Some(p),
            }),
            None => Ok(Self::default()),
        }
    }

    /// Load with defaults only (no file)
    pub fn default() -> Self {
        Self {
            schema: ConfigSchema::default(),
            path: None,
        }
    }

    /// Resolved apktool jar path
    ///
    /// `APKSCOUT_APKTOOL` overrides the configured value; `~` is expanded in
    /// either case.
    pub fn apktool_jar(&self) -> PathBuf {
        let configured = match std::env::var(APKTOOL_ENV) {
            Ok(v) if !v.is_empty() => v,
            _ => self.schema.apktool.jar.clone(),
        };
        expand_path(&configured)
    }

    /// Resolved java launcher
    ///
    /// A bare command name is left for PATH lookup; anything with a
    /// separator is treated as a path and `~`-expanded.
    pub fn java_launcher(&self) -> PathBuf {
        expand_path(&self.schema.apktool.java)
    }

    /// Resolved parent directory for temporary workspaces, if configured
    pub fn temp_dir(&self) -> Option<PathBuf> {
        self.schema.general.temp_dir.as_deref().map(expand_path)
    }
}

fn expand_path(raw: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(raw).as_ref())
}

/// Find configuration file in standard locations
fn find_config_file() -> Option<PathBuf> {
    let candidates = [".apkscout.toml", "apkscout.toml"];

    for candidate in candidates {
        let p = Path::new(candidate);
        if p.exists() {
            return Some(p.to_path_buf());
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let p = config_dir.join("apkscout.toml");
        if p.exists() {
            return Some(p);
        }
    }

    None
}

/// Load and parse a TOML configuration file
fn load_config_file(path: &Path) -> Result<ConfigSchema> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::config(format!("Failed to read config file {}", path.display())).with_source(e)
    })?;

    toml::from_str(&content).map_err(|e| {
        Error::new(
            ErrorCode::ConfigParseError,
            format!("Failed to parse config file {}", path.display()),
        )
        .with_source(e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.path.is_none());
        assert_eq!(config.schema.apktool.jar, "apktool.jar");
        assert_eq!(config.schema.apktool.java, "java");
        assert!(config.schema.general.temp_dir.is_none());
    }

    #[test]
    fn test_config_load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[apktool]\njar = \"/opt/apktool/apktool_2.9.3.jar\"").unwrap();

        let config = Config::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.schema.apktool.jar, "/opt/apktool/apktool_2.9.3.jar");
        assert_eq!(config.schema.apktool.java, "java");
        assert!(config.path.is_some());
    }

    #[test]
    fn test_config_load_missing_explicit_file() {
        let err = Config::load(Some("/nonexistent/apkscout.toml")).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigNotFound);
    }

    #[test]
    fn test_config_load_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[apktool\njar =").unwrap();

        let err = Config::load(Some(file.path().to_str().unwrap())).unwrap_err();
        assert_eq!(err.code, ErrorCode::ConfigParseError);
    }

    #[test]
    fn test_temp_dir_resolution() {
        let mut config = Config::default();
        assert!(config.temp_dir().is_none());

        config.schema.general.temp_dir = Some("/var/tmp/apkscout".to_string());
        assert_eq!(
            config.temp_dir(),
            Some(PathBuf::from("/var/tmp/apkscout"))
        );
    }
}
