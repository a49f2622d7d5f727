//! SQLite-backed key-value persistence.
//!
//! Values are stored as JSON text in a single `kv_entries` table. Note
//! semantics (namespacing, validation) live in [`crate::store`]; this layer
//! only moves keys and values.

mod schema;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params_from_iter, Connection};
use serde_json::Value;

use crate::error::StoreError;
use crate::store::KvBackend;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::debug!("Opened database at {}", path.display());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.lock()?;
        schema::run_migrations(&conn)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    // ============================================================
    // Entry operations
    // ============================================================

    pub fn get_entries(&self, keys: &[String]) -> Result<BTreeMap<String, Value>, StoreError> {
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }

        let conn = self.lock()?;
        let placeholders = vec!["?"; keys.len()].join(", ");
        let sql = format!(
            "SELECT key, value FROM kv_entries WHERE key IN ({})",
            placeholders
        );
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map(params_from_iter(keys.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .map(|r| r.map(|(k, v)| (k, decode_value(v))))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(entries)
    }

    pub fn get_all_entries(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT key, value FROM kv_entries ORDER BY key")?;
        let entries = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .map(|r| r.map(|(k, v)| (k, decode_value(v))))
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        Ok(entries)
    }

    /// Upsert every entry in one transaction.
    pub fn put_entries(&self, items: &BTreeMap<String, Value>) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO kv_entries (key, value, written_at) VALUES (?, ?, ?)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, written_at = excluded.written_at",
            )?;
            for (key, value) in items {
                stmt.execute((key, serde_json::to_string(value)?, &now))?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove entries, returning how many existed.
    pub fn remove_entries(&self, keys: &[String]) -> Result<usize, StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let mut removed = 0;
        for key in keys {
            removed += tx.execute("DELETE FROM kv_entries WHERE key = ?", [key])?;
        }
        tx.commit()?;
        Ok(removed)
    }
}

#[async_trait]
impl KvBackend for Database {
    async fn get(&self, keys: &[String]) -> Result<BTreeMap<String, Value>, StoreError> {
        self.get_entries(keys)
    }

    async fn get_all(&self) -> Result<BTreeMap<String, Value>, StoreError> {
        self.get_all_entries()
    }

    async fn set(&self, items: BTreeMap<String, Value>) -> Result<(), StoreError> {
        self.put_entries(&items)
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        self.remove_entries(keys).map(|_| ())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }
}

/// `<data dir>/pagenotes/notes.db` for the current user.
pub fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "pagenotes")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("notes.db"))
}

/// Values written by something other than this crate may not be JSON; keep them
/// as raw strings so the note layer can reject them.
fn decode_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}
