//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub apktool: ApktoolConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    /// Parent directory for temporary decode workspaces
    ///
    /// Defaults to the system temp directory when unset.
    #[serde(default)]
    pub temp_dir: Option<String>,
}

/// Apktool invocation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApktoolConfig {
    /// Path to the apktool jar
    #[serde(default = "default_jar")]
    pub jar: String,

    /// Java launcher used to run the jar
    #[serde(default = "default_java")]
    pub java: String,
}

impl Default for ApktoolConfig {
    fn default() -> Self {
        Self {
            jar: default_jar(),
            java: default_java(),
        }
    }
}

fn default_jar() -> String {
    "apktool.jar".to_string()
}

fn default_java() -> String {
    "java".to_string()
}
