use crate::error::{DealerError, Result};
use crate::store::{DEFAULT_BACKUP_RETENTION, DEFAULT_STORAGE_KEY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

const CONFIG_FILENAME: &str = "config.json";
const DEFAULT_PLACEHOLDER_IMAGE: &str = "/images/placeholder-car.jpg";

/// Configuration for dealerlot, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DealerConfig {
    /// Key of the state document; backups are stored under `{key}-backup-*`
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Number of backups to keep. `0` keeps all of them.
    #[serde(default = "default_backup_retention")]
    pub backup_retention: usize,

    /// Image used when a vehicle is added without one
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_backup_retention() -> usize {
    DEFAULT_BACKUP_RETENTION
}

fn default_placeholder_image() -> String {
    DEFAULT_PLACEHOLDER_IMAGE.to_string()
}

impl Default for DealerConfig {
    fn default() -> Self {
        Self {
            storage_key: default_storage_key(),
            backup_retention: default_backup_retention(),
            placeholder_image: default_placeholder_image(),
        }
    }
}

pub const CONFIG_KEYS: [&str; 3] = ["storage_key", "backup_retention", "placeholder_image"];

impl DealerConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(DealerError::Io)?;
        let config: DealerConfig =
            serde_json::from_str(&content).map_err(DealerError::Serialization)?;
        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();
        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(DealerError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(DealerError::Serialization)?;
        fs::write(config_path, content).map_err(DealerError::Io)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match key {
            "storage_key" => Some(self.storage_key.clone()),
            "backup_retention" => Some(self.backup_retention.to_string()),
            "placeholder_image" => Some(self.placeholder_image.clone()),
            _ => None,
        }
    }

    pub fn set(&mut self, key: &str, value: &str) -> std::result::Result<(), String> {
        match key {
            "storage_key" => {
                let value = value.trim();
                if value.is_empty() {
                    return Err("storage_key cannot be empty".to_string());
                }
                if !value
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
                {
                    return Err(format!(
                        "Invalid storage_key '{}': use letters, digits, '-' or '_'",
                        value
                    ));
                }
                self.storage_key = value.to_string();
            }
            "backup_retention" => {
                self.backup_retention = value
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid backup_retention: {}", value))?;
            }
            "placeholder_image" => self.placeholder_image = value.to_string(),
            other => return Err(format!("Unknown config key: {}", other)),
        }
        Ok(())
    }
}
