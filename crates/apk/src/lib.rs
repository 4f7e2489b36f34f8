//! APK inspection for apkscout
//!
//! This crate provides the APK-facing functionality:
//! - SDK version extraction from apktool.yml
//! - Dangerous-permission classification
//! - Decoded AndroidManifest.xml parsing
//! - apktool decode invocation with scoped workspaces
//! - Consolidated scan reports

#![warn(missing_docs)]

pub mod decode;
pub mod manifest;
pub mod metadata;
pub mod permissions;
pub mod report;

pub use decode::{Apktool, DecodeMode, DecodedApk};
pub use manifest::Manifest;
pub use metadata::{SdkField, SdkVersions, UNSPECIFIED};
pub use permissions::PermissionGroup;
pub use report::ScanReport;
