use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::models::BackendKind;

#[allow(unused_imports)]
use super::CONFIG;

use super::constants::{LOG_FILE_PATH, MAX_CONVERSATIONS, STORAGE_DIR, STORAGE_KEY};
use super::defaults::*;

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct Configuration {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub log: LogConfig,

    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogConfig {
    #[serde(default = "log_level")]
    pub level: Option<String>,

    #[serde(default)]
    pub filters: Option<Vec<LogFilter>>,

    #[serde(default)]
    pub file: LogFile,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFilter {
    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub level: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LogFile {
    #[serde(default = "log_file_path")]
    pub path: String,

    #[serde(default)]
    pub append: bool,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct BackendConfig {
    #[serde(default)]
    pub kind: BackendKind,

    /// Falls back to the default endpoint of `kind`
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub model: Option<String>,

    #[serde(default)]
    pub temperature: Option<f32>,

    #[serde(default)]
    pub timeout_secs: Option<u16>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct StorageConfig {
    #[serde(default = "max_conversations")]
    pub max_conversations: usize,

    #[serde(default)]
    pub slot: SlotConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub enum SlotConfig {
    #[serde(rename = "file")]
    File(FileSlotConfig),

    #[serde(rename = "memory")]
    Memory(MemorySlotConfig),
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FileSlotConfig {
    #[serde(default = "storage_dir")]
    pub dir: String,

    #[serde(default = "storage_key")]
    pub key: String,

    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

#[derive(Deserialize, Serialize, Debug, Clone, Default)]
pub struct MemorySlotConfig {
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

impl Configuration {
    #[cfg(not(test))]
    pub fn instance() -> &'static Configuration {
        CONFIG.get_or_init(Configuration::default)
    }

    #[cfg(not(test))]
    pub fn init(config: Configuration) -> Result<()> {
        CONFIG
            .set(config)
            .map_err(|_| eyre::eyre!("Config already initialized"))?;
        Ok(())
    }

    #[cfg(test)]
    pub fn instance() -> &'static Configuration {
        use super::TEST_CONFIG;
        TEST_CONFIG.with(|config| *config.borrow())
    }

    #[cfg(test)]
    pub fn init(config: Configuration) -> Result<()> {
        use super::TEST_CONFIG;
        TEST_CONFIG.with(|test_config| {
            *test_config.borrow_mut() = Box::leak(Box::new(config));
        });
        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Some("info".to_string()),
            file: LogFile::default(),
            filters: None,
        }
    }
}

impl Default for LogFile {
    fn default() -> Self {
        Self {
            path: LOG_FILE_PATH.to_string(),
            append: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_conversations: MAX_CONVERSATIONS,
            slot: SlotConfig::default(),
        }
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::File(FileSlotConfig::default())
    }
}

impl Default for FileSlotConfig {
    fn default() -> Self {
        Self {
            dir: STORAGE_DIR.to_string(),
            key: STORAGE_KEY.to_string(),
            quota_bytes: None,
        }
    }
}
