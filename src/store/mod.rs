//! Note persistence over an asynchronous key-value backend.
//!
//! Every note lives under `notes:<scope>:<key>`. The default-scope setting
//! lives under a disjoint `settings:` prefix, so enumerating notes never picks
//! it up.

mod memory;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::models::{Note, Scope};

pub use memory::MemoryBackend;

const NOTE_PREFIX: &str = "notes";
const DEFAULT_SCOPE_KEY: &str = "settings:defaultScope";

/// The persistence boundary.
///
/// Full-namespace retrieval through [`KvBackend::get_all`] is the only way to
/// enumerate. Implementations need nothing beyond last-write-wins per key.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Fetch the given keys. Missing keys are absent from the result.
    async fn get(&self, keys: &[String]) -> Result<BTreeMap<String, Value>, StoreError>;

    /// Fetch every entry in the namespace.
    async fn get_all(&self) -> Result<BTreeMap<String, Value>, StoreError>;

    async fn set(&self, items: BTreeMap<String, Value>) -> Result<(), StoreError>;

    /// Remove the given keys. Removing a missing key is not an error.
    async fn remove(&self, keys: &[String]) -> Result<(), StoreError>;
}

/// The storage key of a note: `notes:<scope>:<key>`.
pub fn storage_key_for(scope: Scope, key: &str) -> String {
    format!("{}:{}:{}", NOTE_PREFIX, scope, key)
}

#[derive(Clone)]
pub struct NoteStore {
    backend: Arc<dyn KvBackend>,
}

impl NoteStore {
    pub fn new(backend: impl KvBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// A store backed by a fresh in-memory map.
    pub fn in_memory() -> Self {
        Self::new(MemoryBackend::new())
    }

    // ============================================================
    // Note operations
    // ============================================================

    pub async fn get_note(&self, scope: Scope, key: &str) -> Result<Option<Note>, StoreError> {
        let storage_key = storage_key_for(scope, key);
        let mut found = self.backend.get(std::slice::from_ref(&storage_key)).await?;
        Ok(found
            .remove(&storage_key)
            .and_then(|value| decode_note(&storage_key, value)))
    }

    /// Upsert a note. Always overwrites; fields are not merged.
    ///
    /// Content is not checked here. Keeping blank notes out of the store is the
    /// autosave controller's job.
    pub async fn set_note(&self, note: &Note) -> Result<(), StoreError> {
        let storage_key = storage_key_for(note.scope, &note.key);
        let value = serde_json::to_value(note)?;
        tracing::debug!("Writing note {}", storage_key);
        self.backend
            .set(BTreeMap::from([(storage_key, value)]))
            .await
    }

    /// Delete a note. Deleting a missing note is a no-op.
    pub async fn delete_note(&self, scope: Scope, key: &str) -> Result<(), StoreError> {
        let storage_key = storage_key_for(scope, key);
        tracing::debug!("Deleting note {}", storage_key);
        self.backend.remove(&[storage_key]).await
    }

    /// Every well-formed note across all scopes.
    ///
    /// Scans the whole namespace, so this is O(total keys). Fine for a personal
    /// corpus; do not call it per keystroke.
    pub async fn list_all_notes(&self) -> Result<Vec<Note>, StoreError> {
        let prefix = format!("{}:", NOTE_PREFIX);
        let notes = self
            .backend
            .get_all()
            .await?
            .into_iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .filter_map(|(k, v)| decode_note(&k, v))
            .collect();
        Ok(notes)
    }

    // ============================================================
    // Settings
    // ============================================================

    /// The default scope, or `path` when unset or not a valid scope.
    pub async fn default_scope(&self) -> Result<Scope, StoreError> {
        let key = DEFAULT_SCOPE_KEY.to_string();
        let found = self.backend.get(std::slice::from_ref(&key)).await?;
        Ok(found
            .get(&key)
            .and_then(Value::as_str)
            .and_then(Scope::from_str)
            .unwrap_or_default())
    }

    pub async fn set_default_scope(&self, scope: Scope) -> Result<(), StoreError> {
        tracing::debug!("Setting default scope to {}", scope);
        self.backend
            .set(BTreeMap::from([(
                DEFAULT_SCOPE_KEY.to_string(),
                Value::String(scope.as_str().to_string()),
            )]))
            .await
    }
}

/// Epoch millis from a JSON number. Integral floats such as `5.0` count;
/// fractional or out-of-range values do not.
pub(crate) fn as_millis(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    })
}

/// Decode a stored value, skipping anything that is not structurally a note.
///
/// A note must at least carry string `content` and an integral `updatedAt`.
fn decode_note(storage_key: &str, mut value: Value) -> Option<Note> {
    let stamp = value
        .get("updatedAt")
        .and_then(as_millis)
        .filter(|_| value.get("content").is_some_and(Value::is_string));
    let Some(stamp) = stamp else {
        tracing::warn!("Skipping malformed entry {}", storage_key);
        return None;
    };
    value["updatedAt"] = Value::from(stamp);

    match serde_json::from_value(value) {
        Ok(note) => Some(note),
        Err(e) => {
            tracing::warn!("Skipping undecodable entry {}: {}", storage_key, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_keys_are_namespaced_by_scope() {
        assert_eq!(
            storage_key_for(Scope::Path, "https://a.dev/"),
            "notes:path:https://a.dev/"
        );
        assert_ne!(
            storage_key_for(Scope::Exact, "https://a.dev/"),
            storage_key_for(Scope::Origin, "https://a.dev/")
        );
    }

    #[test]
    fn decode_rejects_missing_content() {
        let value = serde_json::json!({ "key": "k", "scope": "path", "updatedAt": 1 });
        assert!(decode_note("notes:path:k", value).is_none());
    }

    #[test]
    fn decode_accepts_integral_float_timestamp() {
        let value = serde_json::json!({
            "key": "k", "urlSample": "k", "scope": "path", "content": "x", "updatedAt": 5.0
        });
        assert_eq!(decode_note("notes:path:k", value).map(|n| n.updated_at), Some(5));
    }

    #[test]
    fn decode_rejects_fractional_timestamp() {
        let value = serde_json::json!({
            "key": "k", "urlSample": "k", "scope": "path", "content": "x", "updatedAt": 1.5
        });
        assert!(decode_note("notes:path:k", value).is_none());
    }

    #[test]
    fn decode_rejects_string_timestamp() {
        let value = serde_json::json!({
            "key": "k", "urlSample": "k", "scope": "path", "content": "x", "updatedAt": "1"
        });
        assert!(decode_note("notes:path:k", value).is_none());
    }
}
