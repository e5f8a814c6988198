use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which backing the local store should use.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StorageMode {
    /// SQLite when the platform supports it, key/value otherwise or on failure.
    #[default]
    Auto,
    Sqlite,
    KeyValue,
}

impl StorageMode {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(StorageMode::Auto),
            "sqlite" => Some(StorageMode::Sqlite),
            "key_value" | "kv" | "web" => Some(StorageMode::KeyValue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub sync: SyncConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub mode: StorageMode,
    /// Directory for the key/value fallback file.
    pub data_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    pub auto_sync: bool,
    pub sync_interval: u64,
    pub batch_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        Self {
            database: DatabaseConfig {
                url: format!("sqlite://{}", data_dir.join("printdesk.db").display()),
                max_connections: 5,
                connection_timeout: 30,
            },
            storage: StorageConfig {
                mode: StorageMode::Auto,
                data_dir: data_dir.display().to_string(),
            },
            remote: RemoteConfig {
                base_url: None,
                api_key: None,
                timeout_secs: 15,
            },
            sync: SyncConfig {
                auto_sync: true,
                sync_interval: 300, // 5 minutes
                batch_size: 100,
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(v) = std::env::var("PRINTDESK_DATA_DIR") {
            if !v.trim().is_empty() {
                let dir = PathBuf::from(v.trim());
                cfg.database.url = format!("sqlite://{}", dir.join("printdesk.db").display());
                cfg.storage.data_dir = dir.display().to_string();
            }
        }
        if let Ok(v) = std::env::var("PRINTDESK_DATABASE_URL") {
            if !v.trim().is_empty() {
                cfg.database.url = v.trim().to_string();
            }
        }
        if let Ok(v) = std::env::var("PRINTDESK_DATABASE_MAX_CONNECTIONS") {
            if let Some(value) = parse_u32(&v) {
                cfg.database.max_connections = value.max(1);
            }
        }
        if let Ok(v) = std::env::var("PRINTDESK_DATABASE_CONNECTION_TIMEOUT") {
            if let Some(value) = parse_u64(&v) {
                cfg.database.connection_timeout = value;
            }
        }
        if let Ok(v) = std::env::var("PRINTDESK_STORAGE_MODE") {
            if let Some(mode) = StorageMode::parse(&v) {
                cfg.storage.mode = mode;
            }
        }
        if let Ok(v) = std::env::var("PRINTDESK_REMOTE_URL") {
            cfg.remote.base_url = Some(v.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Ok(v) = std::env::var("PRINTDESK_REMOTE_API_KEY") {
            cfg.remote.api_key = Some(v.trim().to_string()).filter(|s| !s.is_empty());
        }
        if let Ok(v) = std::env::var("PRINTDESK_REMOTE_TIMEOUT_SECS") {
            if let Some(value) = parse_u64(&v) {
                cfg.remote.timeout_secs = value;
            }
        }
        if let Ok(v) = std::env::var("PRINTDESK_AUTO_SYNC") {
            cfg.sync.auto_sync = parse_bool(&v, cfg.sync.auto_sync);
        }
        if let Ok(v) = std::env::var("PRINTDESK_SYNC_INTERVAL") {
            if let Some(value) = parse_u64(&v) {
                cfg.sync.sync_interval = value;
            }
        }
        if let Ok(v) = std::env::var("PRINTDESK_SYNC_BATCH_SIZE") {
            if let Some(value) = parse_u32(&v) {
                cfg.sync.batch_size = value;
            }
        }

        cfg
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.database.url.trim().is_empty() {
            return Err("Database url must not be empty".to_string());
        }
        if self.database.max_connections == 0 {
            return Err("Database max_connections must be greater than 0".to_string());
        }
        if self.storage.mode == StorageMode::KeyValue && self.storage.data_dir.trim().is_empty()
        {
            return Err("Storage data_dir is required for key/value mode".to_string());
        }
        if self.remote.timeout_secs == 0 {
            return Err("Remote timeout_secs must be greater than 0".to_string());
        }
        if self.sync.batch_size == 0 {
            return Err("Sync batch_size must be greater than 0".to_string());
        }
        if self.sync.auto_sync && self.sync.sync_interval == 0 {
            return Err("Sync sync_interval must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("printdesk"))
        .unwrap_or_else(|| PathBuf::from("./data"))
}

fn parse_bool(s: &str, default: bool) -> bool {
    match s.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

fn parse_u64(value: &str) -> Option<u64> {
    value.trim().parse::<u64>().ok()
}

fn parse_u32(value: &str) -> Option<u32> {
    value.trim().parse::<u32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.storage.mode, StorageMode::Auto);
        assert!(cfg.database.url.starts_with("sqlite://"));
    }

    #[test]
    fn validate_rejects_zero_batch_size() {
        let mut cfg = AppConfig::default();
        cfg.sync.batch_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn storage_mode_parses_aliases() {
        assert_eq!(StorageMode::parse("KV"), Some(StorageMode::KeyValue));
        assert_eq!(StorageMode::parse(" sqlite "), Some(StorageMode::Sqlite));
        assert_eq!(StorageMode::parse("postgres"), None);
    }

    #[test]
    fn parse_bool_falls_back_to_default() {
        assert!(parse_bool("on", false));
        assert!(!parse_bool("off", true));
        assert!(parse_bool("maybe", true));
    }
}
