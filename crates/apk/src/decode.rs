//! apktool decode front-end
//!
//! Drives `java -jar apktool.jar decode` and hands back the decoded tree.
//! Every decode runs with `-f` into a fresh directory that doubles as the
//! framework path, so runs never contaminate each other or the user's
//! framework cache.

use crate::manifest::Manifest;
use crate::metadata::SdkVersions;
use crate::report::ScanReport;
use apkscout_core::config::Config;
use apkscout_core::error::{Error, Result};
use apkscout_core::process::{run_command, which_command};
use apkscout_core::workspace::Workspace;
use once_cell::sync::Lazy;
use owo_colors::OwoColorize;
use regex::Regex;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

/// File name of the decoded manifest
pub const MANIFEST_FILE: &str = "AndroidManifest.xml";

/// File name of apktool's decode metadata
pub const APKTOOL_YML: &str = "apktool.yml";

/// How much of the APK to decode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodeMode {
    /// Sources and resources
    #[default]
    Full,
    /// Resources only (`--no-src`)
    ResourcesOnly,
    /// Sources only (`--no-res`)
    SourcesOnly,
}

impl DecodeMode {
    fn flag(self) -> Option<&'static str> {
        match self {
            DecodeMode::Full => None,
            DecodeMode::ResourcesOnly => Some("--no-src"),
            DecodeMode::SourcesOnly => Some("--no-res"),
        }
    }
}

/// Handle on a resolved apktool installation
#[derive(Debug, Clone)]
pub struct Apktool {
    java: PathBuf,
    jar: PathBuf,
}

impl Apktool {
    /// Wrap a launcher and jar without checking either
    pub fn new(java: impl Into<PathBuf>, jar: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            jar: jar.into(),
        }
    }

    /// Resolve the launcher and jar from configuration
    ///
    /// The jar must exist; the launcher must exist as a file when configured
    /// as a path, or be findable on PATH when configured as a bare name.
    pub fn from_config(config: &Config) -> Result<Self> {
        let jar = config.apktool_jar();
        if !jar.is_file() {
            return Err(Error::file_not_found(&jar)
                .with_context("Locating the apktool jar")
                .with_suggestion(
                    "Set [apktool] jar in .apkscout.toml or export APKSCOUT_APKTOOL",
                ));
        }

        let java = resolve_launcher(config.java_launcher())?;
        Ok(Self { java, jar })
    }

    /// The resolved java launcher
    pub fn java(&self) -> &Path {
        &self.java
    }

    /// The resolved apktool jar
    pub fn jar(&self) -> &Path {
        &self.jar
    }

    /// Report apktool's version (`java -jar apktool.jar --version`)
    pub fn version(&self) -> Result<String> {
        let args: Vec<OsString> = vec![
            "-jar".into(),
            self.jar.as_path().into(),
            "--version".into(),
        ];
        let result = run_command(&self.java, &args)?;
        if !result.success {
            return Err(Error::apktool_failed(result.exit_code, &result.stderr));
        }
        Ok(result.stdout.trim().to_string())
    }

    /// Decode into a scoped workspace under the system temp directory
    ///
    /// The workspace is removed when the returned handle drops, and on every
    /// error path.
    pub fn decode(&self, apk: impl AsRef<Path>, mode: DecodeMode) -> Result<DecodedApk> {
        self.decode_into(apk.as_ref(), mode, Workspace::new()?)
    }

    /// Decode into a scoped workspace under a caller-supplied parent
    pub fn decode_in(
        &self,
        apk: impl AsRef<Path>,
        mode: DecodeMode,
        parent: impl AsRef<Path>,
    ) -> Result<DecodedApk> {
        self.decode_into(apk.as_ref(), mode, Workspace::in_dir(parent)?)
    }

    /// Decode straight into a named directory that outlives this call
    ///
    /// apktool's `-f` clears a previous tree at the same spot.
    pub fn decode_to(
        &self,
        apk: impl AsRef<Path>,
        mode: DecodeMode,
        out_dir: impl AsRef<Path>,
    ) -> Result<PathBuf> {
        let out_dir = out_dir.as_ref();
        self.run_decode(apk.as_ref(), mode, out_dir)?;
        Ok(out_dir.to_path_buf())
    }

    /// Decode resources only, skipping smali disassembly
    pub fn decode_resources(&self, apk: impl AsRef<Path>) -> Result<DecodedApk> {
        self.decode(apk, DecodeMode::ResourcesOnly)
    }

    /// Decode sources only, skipping resource decoding
    pub fn decode_sources(&self, apk: impl AsRef<Path>) -> Result<DecodedApk> {
        self.decode(apk, DecodeMode::SourcesOnly)
    }

    fn decode_into(
        &self,
        apk: &Path,
        mode: DecodeMode,
        workspace: Workspace,
    ) -> Result<DecodedApk> {
        self.run_decode(apk, mode, workspace.path())?;
        Ok(DecodedApk {
            workspace,
            apk: apk.to_path_buf(),
        })
    }

    fn run_decode(&self, apk: &Path, mode: DecodeMode, out_dir: &Path) -> Result<()> {
        if !apk.is_file() {
            return Err(Error::file_not_found(apk).with_context("Locating the APK to decode"));
        }

        let args = build_decode_args(&self.jar, apk, mode, out_dir);
        eprintln!(
            "{}",
            format!("...... {}", render_command(&self.java, &args)).dimmed()
        );

        let result = run_command(&self.java, &args)?;
        if !result.success {
            return Err(Error::apktool_failed(result.exit_code, &result.stderr));
        }
        if !out_dir.join(APKTOOL_YML).is_file() {
            return Err(Error::empty_decode_output(out_dir));
        }
        Ok(())
    }
}

/// A decoded APK tree, removed when dropped unless kept
#[derive(Debug)]
pub struct DecodedApk {
    workspace: Workspace,
    apk: PathBuf,
}

impl DecodedApk {
    /// Root of the decoded tree
    pub fn root(&self) -> &Path {
        self.workspace.path()
    }

    /// The APK this tree was decoded from
    pub fn apk(&self) -> &Path {
        &self.apk
    }

    /// Path of the decoded AndroidManifest.xml
    pub fn manifest_path(&self) -> PathBuf {
        self.root().join(MANIFEST_FILE)
    }

    /// Path of apktool's metadata file
    pub fn apktool_yml_path(&self) -> PathBuf {
        self.root().join(APKTOOL_YML)
    }

    /// SDK bounds recorded in the decode metadata
    pub fn sdk_versions(&self) -> Result<SdkVersions> {
        SdkVersions::from_file(self.apktool_yml_path())
    }

    /// Parsed manifest of the decoded tree
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::parse(self.manifest_path())
    }

    /// Consolidated scan report for the decoded tree
    pub fn report(&self) -> Result<ScanReport> {
        ScanReport::build(&self.apk, self.root())
    }

    /// Number of files in the decoded tree
    pub fn file_count(&self) -> usize {
        crate::report::count_files(self.root())
    }

    /// Detach the tree from cleanup and return its root
    pub fn keep(self) -> PathBuf {
        self.workspace.keep()
    }
}

/// Resolve a configured launcher to something spawnable
///
/// A bare name is looked up on PATH; anything with a separator must exist
/// as a file.
pub fn resolve_launcher(configured: PathBuf) -> Result<PathBuf> {
    if configured.components().count() > 1 {
        if configured.is_file() {
            Ok(configured)
        } else {
            Err(Error::file_not_found(&configured).with_context("Locating the java launcher"))
        }
    } else {
        which_command(&configured)
            .ok_or_else(|| Error::command_not_found(&configured.to_string_lossy()))
    }
}

/// Arguments for one decode invocation, in apktool's expected order
fn build_decode_args(jar: &Path, apk: &Path, mode: DecodeMode, out_dir: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-jar".into(), jar.into(), "decode".into(), "-f".into()];
    if let Some(flag) = mode.flag() {
        args.push(flag.into());
    }
    args.push("--output".into());
    args.push(out_dir.into());
    args.push("--frame-path".into());
    args.push(out_dir.into());
    args.push(apk.into());
    args
}

fn render_command(program: &Path, args: &[OsString]) -> String {
    let mut parts = vec![program.display().to_string()];
    parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

static JAVA_VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"version "([^"]+)""#).unwrap());

/// Version string of a java launcher (`java -version`)
pub fn java_version(java: impl AsRef<OsStr>) -> Result<String> {
    let result = run_command(&java, ["-version"])?;
    // java prints its version banner to stderr
    let combined = result.combined_output();
    parse_java_version(&combined).ok_or_else(|| {
        Error::process("Could not parse java version output")
            .with_context(combined.lines().next().unwrap_or_default().to_string())
    })
}

fn parse_java_version(output: &str) -> Option<String> {
    JAVA_VERSION_RE
        .captures(output)
        .map(|captures| captures[1].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use apkscout_core::error::ErrorCode;
    use std::io::Write;

    fn fake_apk() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".apk").tempfile().unwrap();
        file.write_all(b"PK\x03\x04fake").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_decode_args_order() {
        let args = build_decode_args(
            Path::new("/opt/apktool.jar"),
            Path::new("/apps/app.apk"),
            DecodeMode::Full,
            Path::new("/tmp/work"),
        );
        let expected: Vec<OsString> = [
            "-jar",
            "/opt/apktool.jar",
            "decode",
            "-f",
            "--output",
            "/tmp/work",
            "--frame-path",
            "/tmp/work",
            "/apps/app.apk",
        ]
        .into_iter()
        .map(OsString::from)
        .collect();
        assert_eq!(args, expected);
    }

    #[test]
    fn test_decode_args_mode_flags() {
        let jar = Path::new("apktool.jar");
        let apk = Path::new("app.apk");
        let out = Path::new("out");

        let resources = build_decode_args(jar, apk, DecodeMode::ResourcesOnly, out);
        assert_eq!(resources[4], OsString::from("--no-src"));

        let sources = build_decode_args(jar, apk, DecodeMode::SourcesOnly, out);
        assert_eq!(sources[4], OsString::from("--no-res"));

        let full = build_decode_args(jar, apk, DecodeMode::Full, out);
        assert!(!full.contains(&OsString::from("--no-src")));
        assert!(!full.contains(&OsString::from("--no-res")));
    }

    #[test]
    fn test_missing_apk_fails_before_launch() {
        let tool = Apktool::new("false", "apktool.jar");
        let err = tool.decode("/nonexistent/app.apk", DecodeMode::Full).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }

    #[cfg(unix)]
    #[test]
    fn test_silent_success_is_empty_output() {
        let apk = fake_apk();
        let tool = Apktool::new("true", "apktool.jar");

        let err = tool.decode(apk.path(), DecodeMode::Full).unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyDecodeOutput);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_surfaced() {
        let apk = fake_apk();
        let tool = Apktool::new("false", "apktool.jar");

        let err = tool.decode(apk.path(), DecodeMode::Full).unwrap_err();
        assert_eq!(err.code, ErrorCode::ApktoolFailed);
        assert!(err.message.contains("status 1"));
    }

    #[test]
    fn test_unlaunchable_java_is_process_error() {
        let apk = fake_apk();
        let tool = Apktool::new("/nonexistent/bin/java", "apktool.jar");

        let err = tool.decode(apk.path(), DecodeMode::Full).unwrap_err();
        assert_eq!(err.code, ErrorCode::ProcessError);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_decode_in_cleans_workspace() {
        let apk = fake_apk();
        let parent = tempfile::tempdir().unwrap();
        let tool = Apktool::new("true", "apktool.jar");

        let err = tool
            .decode_in(apk.path(), DecodeMode::Full, parent.path())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyDecodeOutput);
        assert_eq!(std::fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_decode_to_leaves_no_metadata_unchecked() {
        let apk = fake_apk();
        let out = tempfile::tempdir().unwrap();
        let tool = Apktool::new("true", "apktool.jar");

        let err = tool
            .decode_to(apk.path(), DecodeMode::ResourcesOnly, out.path())
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::EmptyDecodeOutput);
    }

    #[test]
    fn test_decoded_apk_accessors() {
        let workspace = Workspace::new().unwrap();
        std::fs::write(
            workspace.path().join(APKTOOL_YML),
            "sdkInfo:\n  minSdkVersion: '21'\n  targetSdkVersion: '33'\n",
        )
        .unwrap();
        std::fs::write(
            workspace.path().join(MANIFEST_FILE),
            r#"<manifest xmlns:android="http://schemas.android.com/apk/res/android"
                package="com.example.decoded">
                <uses-permission android:name="android.permission.RECORD_AUDIO"/>
            </manifest>"#,
        )
        .unwrap();
        std::fs::create_dir(workspace.path().join("res")).unwrap();
        std::fs::write(workspace.path().join("res/strings.xml"), "<resources/>").unwrap();

        let decoded = DecodedApk {
            workspace,
            apk: PathBuf::from("/apps/app.apk"),
        };

        assert_eq!(decoded.file_count(), 3);
        assert_eq!(decoded.sdk_versions().unwrap().min_sdk, 21);

        let manifest = decoded.manifest().unwrap();
        assert_eq!(manifest.package.as_deref(), Some("com.example.decoded"));
        assert!(manifest.requests_dangerous());

        let root = decoded.keep();
        assert!(root.join(MANIFEST_FILE).is_file());
        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_resolve_launcher_bare_name() {
        let resolved = resolve_launcher(PathBuf::from("echo")).unwrap();
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_resolve_launcher_missing_name() {
        let err = resolve_launcher(PathBuf::from("nonexistent_command_12345")).unwrap_err();
        assert_eq!(err.code, ErrorCode::CommandNotFound);
    }

    #[test]
    fn test_resolve_launcher_missing_path() {
        let err = resolve_launcher(PathBuf::from("/nonexistent/bin/java")).unwrap_err();
        assert_eq!(err.code, ErrorCode::FileNotFound);
    }

    #[test]
    fn test_parse_java_version_banner() {
        let banner = "openjdk version \"17.0.9\" 2023-10-17\nOpenJDK Runtime Environment";
        assert_eq!(parse_java_version(banner).as_deref(), Some("17.0.9"));

        let legacy = "java version \"1.8.0_392\"";
        assert_eq!(parse_java_version(legacy).as_deref(), Some("1.8.0_392"));

        assert_eq!(parse_java_version("no banner here"), None);
    }
}
