//! SDK version extraction from apktool.yml
//!
//! apktool records the SDK bounds of a decoded APK in the `sdkInfo` block of
//! its `apktool.yml`, one `key: 'value'` line per field. The extractor scans
//! the file top to bottom for a field token and parses the first
//! single-quoted value on the matching line.

use apkscout_core::error::{Error, Result, ResultExt};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Sentinel for SDK fields the app does not declare
///
/// Most apps omit `maxSdkVersion`; an absent field is reported as this value,
/// not as an error.
pub const UNSPECIFIED: i32 = -1;

/// An SDK bound recorded in apktool.yml
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SdkField {
    /// Minimum platform API level the app supports
    Min,
    /// Maximum platform API level the app supports
    Max,
    /// API level the app targets
    Target,
}

impl SdkField {
    /// The token identifying this field's line in apktool.yml
    pub fn token(&self) -> &'static str {
        match self {
            SdkField::Min => "minSdkVersion",
            SdkField::Max => "maxSdkVersion",
            SdkField::Target => "targetSdkVersion",
        }
    }
}

/// Extract one SDK field from an apktool.yml file
///
/// The first line containing the field token wins. A field that appears
/// nowhere yields [`UNSPECIFIED`]; a matching line whose value is not a
/// properly quoted integer is an error, never a silent default.
pub fn extract_sdk_field(path: impl AsRef<Path>, field: SdkField) -> Result<i32> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .map_err(Error::from)
        .context(format!("While reading {}", path.display()))?;

    for line in content.lines() {
        if line.contains(field.token()) {
            return parse_quoted_value(line, field);
        }
    }

    Ok(UNSPECIFIED)
}

/// Extract `minSdkVersion`
pub fn extract_min_sdk(path: impl AsRef<Path>) -> Result<i32> {
    extract_sdk_field(path, SdkField::Min)
}

/// Extract `maxSdkVersion`
pub fn extract_max_sdk(path: impl AsRef<Path>) -> Result<i32> {
    extract_sdk_field(path, SdkField::Max)
}

/// Extract `targetSdkVersion`
pub fn extract_target_sdk(path: impl AsRef<Path>) -> Result<i32> {
    extract_sdk_field(path, SdkField::Target)
}

/// Parse the value between the first pair of single quotes on a line
fn parse_quoted_value(line: &str, field: SdkField) -> Result<i32> {
    let open = line
        .find('\'')
        .ok_or_else(|| Error::malformed_sdk_value(field.token(), line.trim()))?;
    let rest = &line[open + 1..];
    let close = rest
        .find('\'')
        .ok_or_else(|| Error::malformed_sdk_value(field.token(), line.trim()))?;
    let raw = &rest[..close];

    raw.trim()
        .parse::<i32>()
        .map_err(|e| Error::malformed_sdk_value(field.token(), raw).with_source(e))
}

/// All three SDK bounds of a decoded APK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SdkVersions {
    /// `minSdkVersion`, or [`UNSPECIFIED`]
    pub min_sdk: i32,
    /// `maxSdkVersion`, or [`UNSPECIFIED`]
    pub max_sdk: i32,
    /// `targetSdkVersion`, or [`UNSPECIFIED`]
    pub target_sdk: i32,
}

impl SdkVersions {
    /// Read all three bounds from an apktool.yml file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        Ok(Self {
            min_sdk: extract_min_sdk(path)?,
            max_sdk: extract_max_sdk(path)?,
            target_sdk: extract_target_sdk(path)?,
        })
    }
}
