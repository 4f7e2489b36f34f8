//! Consolidated scan reports
//!
//! Ties the metadata, manifest, and permission modules together into one
//! serializable summary of a decoded APK.

use crate::decode::{APKTOOL_YML, MANIFEST_FILE};
use crate::manifest::Manifest;
use crate::metadata::SdkVersions;
use crate::permissions::{self, PermissionGroup};
use apkscout_core::error::{Error, Result, ResultExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// One requested permission and its dangerous group, if any
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionEntry {
    /// The permission identifier as requested
    pub name: String,
    /// Dangerous group the identifier belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<PermissionGroup>,
}

/// Summary of everything apkscout extracts from one APK
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    /// The APK that was scanned
    pub apk: PathBuf,
    /// Hex SHA-256 of the APK bytes
    pub sha256: String,
    /// When the report was generated
    pub generated_at: DateTime<Utc>,
    /// Application package name, when the manifest declares one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// SDK bounds from the decode metadata
    pub sdk: SdkVersions,
    /// Requested permissions, sorted by identifier
    pub permissions: Vec<PermissionEntry>,
    /// Whether any requested permission is dangerous
    pub dangerous: bool,
    /// Dangerous groups the permission set touches, sorted
    pub dangerous_groups: Vec<PermissionGroup>,
    /// Number of files in the decoded tree
    pub files_scanned: usize,
}

impl ScanReport {
    /// Build a report from an APK and its decoded tree
    ///
    /// Works on any decoded tree, whether it came from a scoped workspace or
    /// a directory decoded earlier.
    pub fn build(apk: impl AsRef<Path>, decoded_root: impl AsRef<Path>) -> Result<Self> {
        let apk = apk.as_ref();
        let root = decoded_root.as_ref();

        let sha256 = fingerprint(apk)?;
        let sdk = SdkVersions::from_file(root.join(APKTOOL_YML))?;
        let manifest = Manifest::parse(root.join(MANIFEST_FILE))?;

        let entries: Vec<PermissionEntry> = manifest
            .permissions
            .iter()
            .map(|name| PermissionEntry {
                name: name.clone(),
                group: permissions::group_of(name),
            })
            .collect();
        let dangerous_groups: Vec<PermissionGroup> =
            permissions::dangerous_groups(&manifest.permissions)
                .into_iter()
                .collect();

        Ok(Self {
            apk: apk.to_path_buf(),
            sha256,
            generated_at: Utc::now(),
            package: manifest.package.clone(),
            sdk,
            dangerous: manifest.requests_dangerous(),
            permissions: entries,
            dangerous_groups,
            files_scanned: count_files(root),
        })
    }

    /// Render the report as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Hex SHA-256 of a file's bytes
pub fn fingerprint(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let mut file = std::fs::File::open(path)
        .map_err(Error::from)
        .context(format!("While reading {}", path.display()))?;

    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)
        .map_err(Error::from)
        .context(format!("While hashing {}", path.display()))?;

    Ok(hex::encode(hasher.finalize()))
}

/// Number of regular files under a directory
pub fn count_files(root: &Path) -> usize {
    walkdir::WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
