//! Scene Configuration
//!
//! Scene tunables, loaded in priority order:
//!
//! 1. Environment variables: `VOID_SCENE_MAX_DEPTH`, `VOID_SCENE_VALIDATE`
//! 2. Config file (TOML)
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! [scene]
//! name = "Level 1"
//! initial_capacity = 4096
//! max_hierarchy_depth = 64
//! validate_on_mutation = true
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum hierarchy depth
pub const DEFAULT_MAX_DEPTH: u32 = 1000;

/// Environment variable overriding `max_hierarchy_depth`
pub const ENV_MAX_DEPTH: &str = "VOID_SCENE_MAX_DEPTH";

/// Environment variable overriding `validate_on_mutation`
pub const ENV_VALIDATE: &str = "VOID_SCENE_VALIDATE";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML for this schema
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// An override carried an unusable value
    #[error("Invalid value {value:?} for {key}")]
    InvalidValue {
        /// Setting name
        key: &'static str,
        /// Rejected value
        value: String,
    },
}

/// Scene configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Scene name
    pub name: String,
    /// Entities to reserve room for up front
    pub initial_capacity: usize,
    /// Maximum parent-chain length from a root to its deepest descendant
    pub max_hierarchy_depth: u32,
    /// Run `validate_hierarchy` after every hierarchy mutation
    pub validate_on_mutation: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            name: "Untitled".to_string(),
            initial_capacity: 0,
            max_hierarchy_depth: DEFAULT_MAX_DEPTH,
            validate_on_mutation: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    scene: SceneConfig,
}

impl SceneConfig {
    /// Create a default config with the given name
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Parse from TOML (the `[scene]` table)
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.scene)
    }

    /// Load from a TOML file, then apply environment overrides
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?.with_env_overrides()?;
        log::info!(
            "Loaded scene config '{}' from {}",
            config.name,
            path.display()
        );
        Ok(config)
    }

    /// Apply `VOID_SCENE_*` environment variables
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(value) = lookup(ENV_MAX_DEPTH) {
            self.max_hierarchy_depth = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    key: ENV_MAX_DEPTH,
                    value: value.clone(),
                })?;
            log::info!("Max hierarchy depth from env: {}", self.max_hierarchy_depth);
        }

        if let Some(value) = lookup(ENV_VALIDATE) {
            self.validate_on_mutation = match value.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: ENV_VALIDATE,
                        value,
                    })
                }
            };
        }

        Ok(self)
    }
}
