//! Gate configuration.
//!
//! Loaded once at startup from YAML and passed explicitly to whatever needs
//! it. Nothing here is mutated after [`GateConfig::load`] returns.

use fleetgate_interceptors::prelude::{DenialDetail, DeviceIdPolicy, MAX_DEVICE_ID_LEN};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GateConfig {
    pub device_id: DeviceIdConfig,
    pub authn: AuthnConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceIdConfig {
    /// Longest accepted device id, in characters.
    pub max_len: usize,
    /// Characters refused on top of the built-in set.
    pub extra_forbidden: String,
}

impl Default for DeviceIdConfig {
    fn default() -> Self {
        Self {
            max_len: MAX_DEVICE_ID_LEN,
            extra_forbidden: String::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthnConfig {
    pub denial_detail: DenialDetail,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl GateConfig {
    /// `$XDG_CONFIG_HOME/fleetgate/gate.yaml` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("fleetgate");
        path.push("gate.yaml");
        Some(path)
    }

    /// Reads `path` when given; it must exist. Otherwise reads the default
    /// path if present and falls back to built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => match Self::default_path().filter(|path| path.exists()) {
                Some(path) => Self::from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=MAX_DEVICE_ID_LEN).contains(&self.device_id.max_len) {
            return Err(ConfigError::Invalid(format!(
                "device_id.max_len must lie in 1..={MAX_DEVICE_ID_LEN}, got {}",
                self.device_id.max_len
            )));
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(ConfigError::Invalid(format!(
                "logging.level {:?} is not a log level",
                self.logging.level
            )));
        }
        Ok(())
    }

    pub fn device_id_policy(&self) -> DeviceIdPolicy {
        DeviceIdPolicy::new(self.device_id.max_len).forbid(self.device_id.extra_forbidden.chars())
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}
