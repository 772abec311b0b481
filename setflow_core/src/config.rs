//! Configuration file support for setflow.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/setflow/config.toml`.
//! Every section and key is optional; anything missing takes the built-in
//! protocol defaults.

use crate::instance::ProtocolConfig;
use crate::protocol::{DropSetConfig, GiantSetConfig, MyoRepsConfig, SupersetConfig};
use crate::types::ProtocolMethod;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub protocols: ProtocolDefaults,

    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Per-method configuration injected into a fresh protocol instance
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct ProtocolDefaults {
    #[serde(default)]
    pub myo_reps: MyoRepsConfig,

    #[serde(default)]
    pub drop_set: DropSetConfig,

    #[serde(default)]
    pub superset: SupersetConfig,

    #[serde(default)]
    pub giant_set: GiantSetConfig,
}

impl ProtocolDefaults {
    /// Setup configuration for `method`; `None` for standard sets
    pub fn config_for(&self, method: ProtocolMethod) -> Option<ProtocolConfig> {
        match method {
            ProtocolMethod::Standard => None,
            ProtocolMethod::MyoReps => Some(ProtocolConfig::MyoReps(self.myo_reps.clone())),
            ProtocolMethod::DropSet => Some(ProtocolConfig::DropSet(self.drop_set.clone())),
            ProtocolMethod::Superset => Some(ProtocolConfig::Superset(self.superset.clone())),
            ProtocolMethod::GiantSet => Some(ProtocolConfig::GiantSet(self.giant_set.clone())),
        }
    }
}

/// Terminal-write behaviour
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct PersistenceConfig {
    /// Attempts for the single terminal write, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed pause between attempts
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("setflow")
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    50
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("setflow").join("config.toml")
    }

    /// Reject values no protocol could start with
    pub fn validate(&self) -> Result<()> {
        if self.persistence.max_attempts == 0 {
            return Err(Error::Config("persistence.max_attempts must be at least 1".into()));
        }
        if self.protocols.drop_set.max_drops == 0 {
            return Err(Error::Config("drop_set.max_drops must be at least 1".into()));
        }
        if self.protocols.superset.target_supersets == 0 {
            return Err(Error::Config("superset.target_supersets must be at least 1".into()));
        }
        if self.protocols.giant_set.target_circuits == 0 {
            return Err(Error::Config("giant_set.target_circuits must be at least 1".into()));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_protocol_defaults() {
        let config = Config::default();
        let protocols = &config.protocols;
        assert_eq!(protocols.myo_reps.rest_interval, 20);
        assert_eq!(protocols.drop_set.max_drops, 4);
        assert_eq!(protocols.drop_set.rest_between_drops, 0);
        assert_eq!(protocols.superset.rest_between_exercises, 10);
        assert_eq!(protocols.superset.rest_between_supersets, 120);
        assert_eq!(protocols.superset.target_supersets, 3);
        assert_eq!(protocols.giant_set.rest_between_exercises, 15);
        assert_eq!(protocols.giant_set.rest_between_circuits, 180);
        assert_eq!(protocols.giant_set.target_circuits, 3);
        assert_eq!(config.persistence.max_attempts, 3);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");

        let mut config = Config::default();
        config.protocols.myo_reps.rest_interval = 25;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.protocols, config.protocols);
        assert_eq!(loaded.persistence, config.persistence);
    }

    #[test]
    fn test_partial_config() {
        let toml_str = r#"
[protocols.drop_set]
max_drops = 3

[protocols.superset]
rest_between_supersets = 90
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.protocols.drop_set.max_drops, 3);
        assert_eq!(config.protocols.drop_set.rest_between_drops, 0); // default
        assert_eq!(config.protocols.superset.rest_between_supersets, 90);
        assert_eq!(config.protocols.superset.rest_between_exercises, 10); // default
        assert_eq!(config.protocols.myo_reps.rest_interval, 20); // default
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "[protocols.giant_set]\ntarget_circuits = 0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(Error::Config(_))));
    }

    #[test]
    fn test_config_for_method() {
        let defaults = ProtocolDefaults::default();
        assert!(defaults.config_for(ProtocolMethod::Standard).is_none());
        assert_eq!(
            defaults.config_for(ProtocolMethod::MyoReps).map(|c| c.method()),
            Some(ProtocolMethod::MyoReps)
        );
    }
}
