//! Configuration schema for fragkey
//!
//! Configuration is stored at `~/.config/fragkey/config.toml`

use crate::interner::DEFAULT_SHARDS;
use serde::{Deserialize, Serialize};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Key interner settings
    pub interner: InternerConfig,

    /// Codec settings
    pub codec: CodecConfig,

    /// Known fragment types
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fragments: Vec<FragmentConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level for the fragkey target
    pub log_level: String,

    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
            log_format: "text".to_string(),
        }
    }
}

/// Key interner configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InternerConfig {
    /// Number of lock shards
    pub shards: usize,
}

impl Default for InternerConfig {
    fn default() -> Self {
        Self {
            shards: DEFAULT_SHARDS,
        }
    }
}

/// Codec configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Refuse to serialize keys whose fragment type is not registered
    pub validate_on_serialize: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            validate_on_serialize: true,
        }
    }
}

/// A registered fragment type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentConfig {
    /// Globally unique fragment type name
    pub name: String,

    /// Option categories the fragment reads
    #[serde(default)]
    pub options: Vec<String>,
}
