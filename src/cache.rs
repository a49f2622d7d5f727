//! Session-local mirror of the persisted note set.
//!
//! The cache serves list and search views without rescanning the store. Local
//! mutations patch it directly through [`ListCache::apply_set`] and
//! [`ListCache::apply_delete`]; bulk operations (import, export) must call
//! [`ListCache::reload`] because the set of touched keys is not tracked.

use crate::error::StoreError;
use crate::models::{Note, Scope};
use crate::store::NoteStore;

/// Upper bound on the number of notes a list view returns.
pub const LIST_LIMIT: usize = 200;

#[derive(Debug, Default)]
pub struct ListCache {
    notes: Vec<Note>,
    loaded: bool,
}

impl ListCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Mark the cache stale; the next refresh reloads from the store.
    pub fn invalidate(&mut self) {
        self.loaded = false;
    }

    pub async fn reload(&mut self, store: &NoteStore) -> Result<(), StoreError> {
        self.notes = store.list_all_notes().await?;
        self.loaded = true;
        tracing::debug!("List cache reloaded with {} notes", self.notes.len());
        Ok(())
    }

    pub async fn ensure_loaded(&mut self, store: &NoteStore) -> Result<(), StoreError> {
        if !self.loaded {
            self.reload(store).await?;
        }
        Ok(())
    }

    /// Notes matching `query`, newest first, at most [`LIST_LIMIT`].
    ///
    /// Loads from the store only on first use or after [`ListCache::invalidate`].
    pub async fn refresh(&mut self, store: &NoteStore, query: &str) -> Result<Vec<Note>, StoreError> {
        self.ensure_loaded(store).await?;
        Ok(self.view(query))
    }

    /// Filter, sort and cap the current contents without touching the store.
    pub fn view(&self, query: &str) -> Vec<Note> {
        let needle = query.trim().to_lowercase();
        let mut matched: Vec<Note> = self
            .notes
            .iter()
            .filter(|n| !n.is_blank())
            .filter(|n| matches(n, &needle))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        matched.truncate(LIST_LIMIT);
        matched
    }

    pub fn find(&self, scope: Scope, key: &str) -> Option<&Note> {
        self.notes.iter().find(|n| n.matches_id(scope, key))
    }

    /// Record a local write: replace the entry with the same `(scope, key)` or append.
    pub fn apply_set(&mut self, note: Note) {
        match self
            .notes
            .iter_mut()
            .find(|n| n.matches_id(note.scope, &note.key))
        {
            Some(existing) => *existing = note,
            None => self.notes.push(note),
        }
    }

    /// Record a local delete.
    pub fn apply_delete(&mut self, scope: Scope, key: &str) {
        self.notes.retain(|n| !n.matches_id(scope, key));
    }
}

/// Case-insensitive substring match over title, content, URL sample and key.
/// `needle` must already be lowercased; an empty needle matches everything.
fn matches(note: &Note, needle: &str) -> bool {
    if needle.is_empty() {
        return true;
    }
    note.title
        .as_deref()
        .is_some_and(|t| t.to_lowercase().contains(needle))
        || note.content.to_lowercase().contains(needle)
        || note.url_sample.to_lowercase().contains(needle)
        || note.key.to_lowercase().contains(needle)
}
