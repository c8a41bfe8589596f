//! Device configuration.
//!
//! Devices and the capabilities they expose can be declared in a TOML file
//! instead of being wired up in code:
//!
//! ```toml
//! [[devices]]
//! id = "5dc1564130xxxxxxxxxxxxxx"
//! name = "Living room TV"
//! capabilities = ["selectInput"]
//! ```
//!
//! A loaded [`Config`] has been validated: ids are non-empty and unique, and
//! every capability name is one this crate implements. Build the devices with
//! [`DeviceManager::from_config`](crate::manager::DeviceManager::from_config),
//! then register callbacks on them.

use crate::capability;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::info;

/// One configured device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Action names, e.g. `"selectInput"`.
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// Serializable set of device declarations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!("loaded {} device(s) from {:?}", config.devices.len(), path);
        Ok(config)
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = BTreeSet::new();
        for device in &self.devices {
            if device.id.trim().is_empty() {
                return Err(ConfigError::EmptyDeviceId);
            }
            if !seen.insert(device.id.as_str()) {
                return Err(ConfigError::DuplicateDevice(device.id.clone()));
            }
            if let Some(action) = device
                .capabilities
                .iter()
                .find(|action| capability::for_action(action).is_none())
            {
                return Err(ConfigError::UnknownCapability {
                    device: device.id.clone(),
                    action: action.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_devices() {
        let config = Config::from_toml_str(
            r#"
            [[devices]]
            id = "tv-1"
            name = "Living room TV"
            capabilities = ["selectInput"]

            [[devices]]
            id = "amp"
            "#,
        )
        .unwrap();

        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].name.as_deref(), Some("Living room TV"));
        assert_eq!(config.devices[0].capabilities, vec!["selectInput"]);
        assert!(config.devices[1].capabilities.is_empty());
    }

    #[test]
    fn empty_file_is_empty_config() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let err = Config::from_toml_str(
            r#"
            [[devices]]
            id = "tv-1"
            [[devices]]
            id = "tv-1"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateDevice(id) if id == "tv-1"));
    }

    #[test]
    fn rejects_blank_id() {
        let err = Config::from_toml_str("[[devices]]\nid = \"  \"\n").unwrap_err();
        assert!(matches!(err, ConfigError::EmptyDeviceId));
    }

    #[test]
    fn rejects_unknown_capability() {
        let err = Config::from_toml_str(
            r#"
            [[devices]]
            id = "tv-1"
            capabilities = ["selectInput", "setVolume"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownCapability { ref action, .. } if action == "setVolume"
        ));
    }

    #[test]
    fn syntax_error_is_parse_error() {
        let err = Config::from_toml_str("[[devices]\nid = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Config::from_file("/nonexistent/cloudcap.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
