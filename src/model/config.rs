use serde::{Deserialize, Serialize};

/// Default storage key for the store snapshot
pub const DEFAULT_STORAGE_KEY: &str = "foreman";
pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 5000;

/// Configuration from foreman.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub seed: SeedConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Key the snapshot is stored under
    #[serde(default = "default_storage_key")]
    pub key: String,
    /// How long a write waits for another fm holding the data directory
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            key: default_storage_key(),
            lock_timeout_ms: default_lock_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Fill an empty store with sample data on first load
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        SeedConfig { enabled: true }
    }
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_lock_timeout_ms() -> u64 {
    DEFAULT_LOCK_TIMEOUT_MS
}

fn default_true() -> bool {
    true
}
