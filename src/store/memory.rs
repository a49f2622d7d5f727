use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde_json::Value;

use super::KvBackend;
use crate::error::StoreError;

/// A process-local backend. Clones share the same map.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    entries: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Value>>, StoreError> {
        self.entries.lock().map_err(|_| StoreError::LockPoisoned)
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn get(&self, keys: &[String]) -> Result<BTreeMap<String, Value>, StoreError> {
        let entries = self.lock()?;
        Ok(keys
            .iter()
            .filter_map(|k| entries.get(k).map(|v| (k.clone(), v.clone())))
            .collect())
    }

    async fn get_all(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        Ok(self.lock()?.clone())
    }

    async fn set(&self, items: BTreeMap<String, Value>) -> Result<(), StoreError> {
        self.lock()?.extend(items);
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        let mut entries = self.lock()?;
        for key in keys {
            entries.remove(key);
        }
        Ok(())
    }
}
