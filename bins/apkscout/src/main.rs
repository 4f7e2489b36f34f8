//! apkscout CLI
//!
//! APK metadata extraction and dangerous-permission scanning on top of
//! apktool.

use apkscout_apk::decode::{self, Apktool, DecodeMode, DecodedApk};
use apkscout_apk::manifest::Manifest;
use apkscout_apk::metadata::{SdkVersions, UNSPECIFIED};
use apkscout_apk::permissions::{self, PermissionGroup};
use apkscout_apk::report::{self, ScanReport};
use apkscout_cli::output::{format_count, format_duration, format_size, Status};
use apkscout_cli::progress;
use apkscout_core::config::Config;
use apkscout_core::error::{exit_codes, Error, ErrorCode};
use apkscout_core::workspace::Workspace;
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "apkscout")]
#[command(about = "APK metadata extraction and dangerous-permission scanning")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase output verbosity
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode an APK with apktool
    Decode {
        /// APK to decode
        apk: PathBuf,
        /// Decode resources only (skip sources)
        #[arg(long, conflicts_with = "sources_only")]
        resources_only: bool,
        /// Decode sources only (skip resources)
        #[arg(long)]
        sources_only: bool,
        /// Decode into this directory instead of a temporary workspace
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the SDK versions recorded by apktool
    Sdk {
        /// An apktool.yml file, a decoded tree, or an APK
        input: PathBuf,
    },

    /// List requested permissions and flag dangerous ones
    Permissions {
        /// An AndroidManifest.xml file, a decoded tree, or an APK
        input: PathBuf,
        /// Exit non-zero when a dangerous permission is requested
        #[arg(long)]
        fail_on_dangerous: bool,
    },

    /// Decode an APK and emit a full scan report
    Scan {
        /// APK to scan
        apk: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose the apktool environment
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        owo_colors::set_override(false);
    }

    let config_path = cli
        .config
        .as_deref()
        .map(|p| p.to_string_lossy().into_owned());
    let config = Config::load(config_path.as_deref())?;

    let verbose = cli.verbose > 0;
    let quiet = cli.quiet;

    let exit_code = match cli.command {
        Commands::Decode {
            apk,
            resources_only,
            sources_only,
            output,
        } => run_decode(
            &apk,
            decode_mode(resources_only, sources_only),
            output.as_deref(),
            &config,
            verbose,
            quiet,
        ),
        Commands::Sdk { input } => run_sdk(&input, &config, verbose, quiet),
        Commands::Permissions {
            input,
            fail_on_dangerous,
        } => run_permissions(&input, fail_on_dangerous, &config, verbose, quiet),
        Commands::Scan { apk, json } => run_scan(&apk, json, &config, verbose, quiet),
        Commands::Doctor { json } => run_doctor(json, &config),
    };

    std::process::exit(exit_code);
}

fn decode_mode(resources_only: bool, sources_only: bool) -> DecodeMode {
    if resources_only {
        DecodeMode::ResourcesOnly
    } else if sources_only {
        DecodeMode::SourcesOnly
    } else {
        DecodeMode::Full
    }
}

/// Whether an input path names an APK rather than an already-decoded file
fn is_apk(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("apk"))
}

/// Resolve a metadata input: a decoded tree root means the file inside it
fn resolve_input(input: &Path, file_name: &str) -> PathBuf {
    if input.is_dir() {
        input.join(file_name)
    } else {
        input.to_path_buf()
    }
}

fn exit_code_for(err: &Error) -> i32 {
    match err.code {
        ErrorCode::ConfigError
        | ErrorCode::ConfigNotFound
        | ErrorCode::ConfigParseError
        | ErrorCode::InvalidConfigValue => exit_codes::CONFIG_ERROR,
        ErrorCode::ApktoolFailed | ErrorCode::EmptyDecodeOutput => exit_codes::DECODE_ERROR,
        ErrorCode::CommandNotFound => exit_codes::COMMAND_NOT_FOUND,
        _ => exit_codes::FAILURE,
    }
}

/// Decode into a scoped workspace, honoring the configured temp parent
fn decode_with_config(
    tool: &Apktool,
    apk: &Path,
    mode: DecodeMode,
    config: &Config,
) -> Result<DecodedApk, Error> {
    match config.temp_dir() {
        Some(parent) => tool.decode_in(apk, mode, parent),
        None => tool.decode(apk, mode),
    }
}

/// Decode resources-only into a scoped workspace and apply `f` to the tree
fn decode_and<T>(
    apk: &Path,
    config: &Config,
    verbose: bool,
    quiet: bool,
    f: impl FnOnce(&DecodedApk) -> Result<T, Error>,
) -> Result<T, Error> {
    let tool = Apktool::from_config(config)?;
    if verbose && !quiet {
        Status::info(&format!(
            "Using {} with {}",
            tool.java().display(),
            tool.jar().display()
        ));
    }

    let spinner =
        (!quiet).then(|| progress::spinner(&format!("Decoding {}...", apk.display())));
    match decode_with_config(&tool, apk, DecodeMode::ResourcesOnly, config) {
        Ok(decoded) => {
            if let Some(pb) = &spinner {
                progress::finish_success(pb, "Decoded");
            }
            f(&decoded)
        }
        Err(e) => {
            if let Some(pb) = &spinner {
                progress::finish_error(pb, "Decode failed");
            }
            Err(e)
        }
    }
}

fn run_decode(
    apk: &Path,
    mode: DecodeMode,
    output: Option<&Path>,
    config: &Config,
    verbose: bool,
    quiet: bool,
) -> i32 {
    let tool = match Apktool::from_config(config) {
        Ok(t) => t,
        Err(e) => {
            Status::error(&e.to_string());
            return exit_code_for(&e);
        }
    };
    if verbose && !quiet {
        Status::info(&format!(
            "Using {} with {}",
            tool.java().display(),
            tool.jar().display()
        ));
    }

    let started = Instant::now();
    let spinner =
        (!quiet).then(|| progress::spinner(&format!("Decoding {}...", apk.display())));

    let outcome = match output {
        Some(dir) => tool.decode_to(apk, mode, dir).map(|root| {
            let files = report::count_files(&root);
            (root, files, true)
        }),
        None => decode_with_config(&tool, apk, mode, config).map(|decoded| {
            let files = decoded.file_count();
            (decoded.root().to_path_buf(), files, false)
        }),
    };

    match outcome {
        Ok((root, files, kept)) => {
            if let Some(pb) = &spinner {
                progress::finish_success(
                    pb,
                    &format!("Decoded in {}", format_duration(started.elapsed())),
                );
            }
            if kept {
                Status::success(&format!(
                    "Decoded {} into {} ({})",
                    apk.display(),
                    root.display(),
                    format_count(files, "file", "files")
                ));
            } else {
                Status::success(&format!(
                    "Decode verified: {} ({})",
                    apk.display(),
                    format_count(files, "file", "files")
                ));
                if !quiet {
                    Status::info("Workspace removed; use --output to keep the decoded tree");
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            if let Some(pb) = &spinner {
                progress::finish_error(pb, "Decode failed");
            }
            Status::error(&e.to_string());
            exit_code_for(&e)
        }
    }
}

fn run_sdk(input: &Path, config: &Config, verbose: bool, quiet: bool) -> i32 {
    let versions = if is_apk(input) {
        decode_and(input, config, verbose, quiet, |decoded| {
            decoded.sdk_versions()
        })
    } else {
        SdkVersions::from_file(resolve_input(input, decode::APKTOOL_YML))
    };

    match versions {
        Ok(versions) => {
            print_sdk(&versions);
            exit_codes::SUCCESS
        }
        Err(e) => {
            Status::error(&e.to_string());
            exit_code_for(&e)
        }
    }
}

fn print_sdk(versions: &SdkVersions) {
    println!("  min:    {}", render_sdk(versions.min_sdk));
    println!("  target: {}", render_sdk(versions.target_sdk));
    println!("  max:    {}", render_sdk(versions.max_sdk));
}

fn render_sdk(level: i32) -> String {
    if level == UNSPECIFIED {
        "unspecified".dimmed().to_string()
    } else {
        level.to_string()
    }
}

fn print_permission_line(name: &str, group: Option<PermissionGroup>) {
    match group {
        Some(group) => println!(
            "  {} {}  {}",
            "!".red().bold(),
            name,
            format!("[{}]", group).yellow()
        ),
        None => println!("    {}", name),
    }
}

fn run_permissions(
    input: &Path,
    fail_on_dangerous: bool,
    config: &Config,
    verbose: bool,
    quiet: bool,
) -> i32 {
    let manifest = if is_apk(input) {
        decode_and(input, config, verbose, quiet, |decoded| decoded.manifest())
    } else {
        Manifest::parse(resolve_input(input, decode::MANIFEST_FILE))
    };

    let manifest = match manifest {
        Ok(m) => m,
        Err(e) => {
            Status::error(&e.to_string());
            return exit_code_for(&e);
        }
    };

    if !quiet {
        if let Some(package) = &manifest.package {
            Status::info(&format!("Package: {}", package));
        }
    }

    if manifest.permissions.is_empty() {
        Status::info("No permissions requested");
        return exit_codes::SUCCESS;
    }

    let mut dangerous_count = 0;
    for name in &manifest.permissions {
        let group = permissions::group_of(name);
        if group.is_some() {
            dangerous_count += 1;
        }
        print_permission_line(name, group);
    }

    println!();
    if dangerous_count > 0 {
        let groups = permissions::dangerous_groups(&manifest.permissions);
        let names: Vec<&str> = groups.iter().map(|g| g.as_str()).collect();
        Status::warning(&format!(
            "{} of {} dangerous ({})",
            dangerous_count,
            format_count(manifest.permissions.len(), "permission", "permissions"),
            names.join(", ")
        ));
        if fail_on_dangerous {
            return exit_codes::DANGEROUS_PERMISSIONS;
        }
    } else {
        Status::success(&format!(
            "{}, none dangerous",
            format_count(manifest.permissions.len(), "permission", "permissions")
        ));
    }

    exit_codes::SUCCESS
}

fn run_scan(apk: &Path, json: bool, config: &Config, verbose: bool, quiet: bool) -> i32 {
    let started = Instant::now();

    match decode_and(apk, config, verbose, quiet, |decoded| decoded.report()) {
        Ok(report) => {
            if json {
                match report.to_json() {
                    Ok(rendered) => {
                        println!("{}", rendered);
                        exit_codes::SUCCESS
                    }
                    Err(e) => {
                        Status::error(&e.to_string());
                        exit_code_for(&e)
                    }
                }
            } else {
                print_report(&report, started.elapsed());
                exit_codes::SUCCESS
            }
        }
        Err(e) => {
            Status::error(&e.to_string());
            exit_code_for(&e)
        }
    }
}

fn print_report(report: &ScanReport, elapsed: std::time::Duration) {
    Status::header(&format!("Scan: {}", report.apk.display()));

    if let Some(package) = &report.package {
        println!("  package:  {}", package);
    }
    println!("  sha256:   {}", report.sha256.dimmed());
    if let Ok(meta) = std::fs::metadata(&report.apk) {
        println!("  size:     {}", format_size(meta.len()));
    }

    Status::subheader("SDK versions");
    print_sdk(&report.sdk);

    Status::subheader(&format!("Permissions ({})", report.permissions.len()));
    for entry in &report.permissions {
        print_permission_line(&entry.name, entry.group);
    }

    println!();
    if report.dangerous {
        let names: Vec<&str> = report.dangerous_groups.iter().map(|g| g.as_str()).collect();
        Status::warning(&format!(
            "Dangerous permissions requested ({})",
            names.join(", ")
        ));
    } else {
        Status::success("No dangerous permissions requested");
    }
    Status::info(&format!(
        "Scanned {} in {}",
        format_count(report.files_scanned, "file", "files"),
        format_duration(elapsed)
    ));
}

#[derive(Serialize)]
struct DoctorReport {
    config: Option<PathBuf>,
    java_path: Option<PathBuf>,
    java_version: Option<String>,
    apktool_jar: Option<PathBuf>,
    apktool_version: Option<String>,
    workspace_writable: bool,
    ready: bool,
}

fn run_doctor(json: bool, config: &Config) -> i32 {
    let mut report = DoctorReport {
        config: config.path.clone(),
        java_path: None,
        java_version: None,
        apktool_jar: None,
        apktool_version: None,
        workspace_writable: false,
        ready: false,
    };

    let java = decode::resolve_launcher(config.java_launcher()).ok();
    if let Some(path) = &java {
        report.java_version = decode::java_version(path).ok();
        report.java_path = Some(path.clone());
    }

    let jar = config.apktool_jar();
    if jar.is_file() {
        report.apktool_jar = Some(jar.clone());
        if let Some(path) = &java {
            report.apktool_version = Apktool::new(path.clone(), jar.clone()).version().ok();
        }
    }

    report.workspace_writable = match config.temp_dir() {
        Some(parent) => Workspace::in_dir(parent).is_ok(),
        None => Workspace::new().is_ok(),
    };

    report.ready =
        report.java_path.is_some() && report.apktool_jar.is_some() && report.workspace_writable;

    if json {
        match serde_json::to_string_pretty(&report) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => {
                Status::error(&format!("Failed to render report: {}", e));
                return exit_codes::FAILURE;
            }
        }
        return if report.ready {
            exit_codes::SUCCESS
        } else {
            exit_codes::FAILURE
        };
    }

    println!("Environment Check");
    println!();

    match &report.config {
        Some(path) => Status::info(&format!("config: {}", path.display())),
        None => Status::info("config: built-in defaults"),
    }

    match (&report.java_path, &report.java_version) {
        (Some(path), Some(version)) => {
            Status::success(&format!("java: {} ({})", version, path.display()));
        }
        (Some(path), None) => {
            Status::warning(&format!(
                "java: found at {} but version not recognized",
                path.display()
            ));
        }
        _ => Status::error("java: not found"),
    }

    match (&report.apktool_jar, &report.apktool_version) {
        (Some(jar), Some(version)) => {
            Status::success(&format!("apktool: {} ({})", version, jar.display()));
        }
        (Some(jar), None) => {
            Status::warning(&format!(
                "apktool: jar at {} but version check failed",
                jar.display()
            ));
        }
        _ => {
            Status::error(&format!(
                "apktool: jar not found at {}",
                config.apktool_jar().display()
            ));
        }
    }

    if report.workspace_writable {
        Status::success("workspace: writable");
    } else {
        Status::error("workspace: cannot create temporary directories");
    }

    if report.ready {
        exit_codes::SUCCESS
    } else {
        exit_codes::FAILURE
    }
}
