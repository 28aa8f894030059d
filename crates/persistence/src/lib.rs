use std::{collections::HashMap, sync::Arc};

use anyhow::Result;
use async_trait::async_trait;
use shared::domain::Theme;
use tokio::sync::Mutex;
use tracing::warn;

pub mod codec;

pub use codec::{decode_counts, encode_counts, parse_count_input, sanitize_count, CountsShape};

const EXTRAS_VISIBLE_MARKER: &str = "1";

/// String key-value store scoped to the widget's origin.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn put(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

/// Volatile store for hosts that do not need state to survive a restart.
#[derive(Default, Clone)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> HashMap<String, String> {
        self.entries.lock().await.clone()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Keys used by one widget, all derived from the counts key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub counts: String,
    pub theme: String,
    pub extras: String,
}

impl StorageKeys {
    pub fn derive(counts_key: impl Into<String>) -> Self {
        let counts = counts_key.into();
        Self {
            theme: format!("{counts}:theme"),
            extras: format!("{counts}:extras"),
            counts,
        }
    }
}

/// Best-effort persistence. Reads never fail (failures surface as absent) and
/// write failures are logged and reported as `false`, never propagated.
#[derive(Clone)]
pub struct PersistenceAdapter {
    store: Arc<dyn KeyValueStore>,
}

impl PersistenceAdapter {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, key: &str) -> Option<String> {
        match self.store.get(key).await {
            Ok(value) => value,
            Err(err) => {
                warn!(storage_key = key, error = %err, "failed to read widget state; treating as absent");
                None
            }
        }
    }

    pub async fn save(&self, key: &str, value: &str) -> bool {
        match self.store.put(key, value).await {
            Ok(()) => true,
            Err(err) => {
                warn!(storage_key = key, error = %err, "failed to persist widget state; keeping it in memory only");
                false
            }
        }
    }

    pub async fn remove(&self, key: &str) -> bool {
        match self.store.delete(key).await {
            Ok(()) => true,
            Err(err) => {
                warn!(storage_key = key, error = %err, "failed to remove widget state");
                false
            }
        }
    }

    pub async fn load_counts(&self, key: &str, len: usize) -> Vec<u64> {
        let raw = self.load(key).await;
        decode_counts(raw.as_deref(), len)
    }

    pub async fn save_counts(&self, key: &str, values: &[u64], shape: CountsShape) -> bool {
        self.save(key, &encode_counts(values, shape)).await
    }

    pub async fn load_theme(&self, key: &str) -> Option<Theme> {
        self.load(key).await.as_deref().and_then(Theme::parse)
    }

    pub async fn save_theme(&self, key: &str, theme: Theme) -> bool {
        self.save(key, theme.as_str()).await
    }

    pub async fn load_flag(&self, key: &str) -> bool {
        self.load(key).await.as_deref() == Some(EXTRAS_VISIBLE_MARKER)
    }

    /// A set flag is stored as `"1"`; a cleared flag removes the key.
    pub async fn save_flag(&self, key: &str, enabled: bool) -> bool {
        if enabled {
            self.save(key, EXTRAS_VISIBLE_MARKER).await
        } else {
            self.remove(key).await
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
