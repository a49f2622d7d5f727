//! Export and import of the full note set.
//!
//! A bundle is `{ "version": 1, "exportedAt": <ms>, "notes": [...] }`. Export
//! always reads the store, never a cache. Import validates each entry on its
//! own, skips the ones that do not hold up, and overwrites conflicting notes
//! unconditionally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BundleError, StoreError};
use crate::models::{is_blank, now_millis, Note, Scope};
use crate::store::{as_millis, NoteStore};

pub const BUNDLE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub version: u32,
    pub exported_at: i64,
    pub notes: Vec<Note>,
}

impl ExportBundle {
    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Counts from one import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Entries found in the bundle's `notes` array.
    pub candidates: usize,
    /// Entries written to the store.
    pub imported: usize,
    /// Entries rejected as malformed or blank.
    pub skipped: usize,
}

/// Snapshot every stored note.
pub async fn export_bundle(store: &NoteStore) -> Result<ExportBundle, StoreError> {
    let notes = store.list_all_notes().await?;
    tracing::info!("Exporting {} notes", notes.len());
    Ok(ExportBundle {
        version: BUNDLE_VERSION,
        exported_at: now_millis(),
        notes,
    })
}

/// Suggested file name for a backup taken at `at`, e.g.
/// `url-notes-backup-20240102T030405.json`.
pub fn backup_file_name(at: DateTime<Utc>) -> String {
    format!("url-notes-backup-{}.json", at.format("%Y%m%dT%H%M%S"))
}

/// Parse a bundle and return its raw note entries.
///
/// Only the top-level shape is checked, which is enough to tell the user how
/// many entries an import would consider before anything is written.
pub fn inspect_bundle(raw: &str) -> Result<Vec<Value>, BundleError> {
    let data: Value = serde_json::from_str(raw).map_err(BundleError::InvalidJson)?;
    if let Some(version) = data.get("version").and_then(Value::as_u64) {
        if version != u64::from(BUNDLE_VERSION) {
            tracing::warn!("Bundle version {} is not {}, importing anyway", version, BUNDLE_VERSION);
        }
    }
    match data {
        Value::Object(mut map) => match map.remove("notes") {
            Some(Value::Array(notes)) => Ok(notes),
            _ => Err(BundleError::MissingNotes),
        },
        _ => Err(BundleError::MissingNotes),
    }
}

/// Upsert every valid entry of a bundle. The bundle wins on conflict.
pub async fn import_bundle(store: &NoteStore, raw: &str) -> Result<ImportReport, BundleError> {
    let entries = inspect_bundle(raw)?;
    let mut report = ImportReport {
        candidates: entries.len(),
        ..ImportReport::default()
    };

    for (index, entry) in entries.iter().enumerate() {
        match note_from_entry(entry) {
            Some(note) => {
                store.set_note(&note).await?;
                report.imported += 1;
            }
            None => {
                tracing::debug!("Skipping bundle entry {}", index);
                report.skipped += 1;
            }
        }
    }

    tracing::info!(
        "Imported {} of {} notes ({} skipped)",
        report.imported,
        report.candidates,
        report.skipped
    );
    Ok(report)
}

/// Validate one bundle entry. Entries are taken whole or not at all.
///
/// Requires string `key`, a string `scope` naming a known scope, string
/// `content` that is not blank, and an integral `updatedAt`. `urlSample` and
/// `title` are carried over when they are strings.
pub fn note_from_entry(entry: &Value) -> Option<Note> {
    let obj = entry.as_object()?;
    let key = obj.get("key")?.as_str()?;
    let scope = Scope::from_str(obj.get("scope")?.as_str()?)?;
    let content = obj.get("content")?.as_str()?;
    let updated_at = as_millis(obj.get("updatedAt")?)?;

    if is_blank(content) {
        return None;
    }

    Some(Note {
        key: key.to_string(),
        url_sample: obj
            .get("urlSample")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        scope,
        title: obj.get("title").and_then(Value::as_str).map(str::to_string),
        content: content.to_string(),
        updated_at,
    })
}
