//! Core utilities for apkscout
//!
//! This crate provides shared functionality used across the APK-facing
//! crates and the CLI:
//!
//! - **Error handling**: structured errors with codes, context, and recovery suggestions
//! - **Process execution**: safe command execution with output capture
//! - **Workspaces**: scoped temporary directories for decode output
//! - **Configuration**: TOML-based configuration with discovery
//!
//! # Example
//!
//! ```rust,no_run
//! use apkscout_core::{config::Config, workspace::Workspace};
//!
//! // Resolve configuration and carve out scratch space
//! let config = Config::load(None).expect("Failed to load configuration");
//! let workspace = match config.temp_dir() {
//!     Some(parent) => Workspace::in_dir(parent),
//!     None => Workspace::new(),
//! }
//! .expect("Failed to create workspace");
//!
//! println!("decoding into {}", workspace.path().display());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod process;
pub mod workspace;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, APKTOOL_ENV};
    pub use crate::error::{exit_codes, Error, ErrorCode, Result, ResultExt};
    pub use crate::process::{command_exists, run_command, which_command, CommandResult};
    pub use crate::workspace::Workspace;
}
