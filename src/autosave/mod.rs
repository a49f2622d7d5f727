//! Debounced persistence of the active editor buffer.
//!
//! The controller moves between three states:
//!
//! - `Idle`: nothing to write
//! - `PendingSave`: an edit arrived; a save fires once the debounce delay
//!   passes without further edits
//! - `Saving`: a save attempt is talking to the store
//!
//! A save attempt never writes blank content. If the buffer trims to nothing,
//! an existing note is deleted (`Cleared`) and otherwise nothing happens
//! (`Empty`). A failed attempt leaves the edit pending, so the next `fire` or
//! `flush` retries it.

mod debounce;

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::cache::ListCache;
use crate::error::StoreError;
use crate::models::{is_blank, now_millis, Note, Scope};
use crate::store::NoteStore;

pub use debounce::Debouncer;

pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(500);

/// The note the editor is currently bound to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorTarget {
    pub scope: Scope,
    pub key: String,
    pub url_sample: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveState {
    Idle,
    PendingSave,
    Saving,
}

/// Outcome of a save attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    /// Non-blank content was written.
    Saved,
    /// Content went blank and the existing note was deleted.
    Cleared,
    /// Content is blank and there was nothing to delete.
    Empty,
}

impl SaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Saved => "Saved",
            Self::Cleared => "Cleared",
            Self::Empty => "Empty",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of binding the editor to a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    Loaded,
    New,
}

impl LoadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "Loaded",
            Self::New => "New",
        }
    }
}

impl fmt::Display for LoadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct AutosaveController {
    debouncer: Debouncer,
    state: AutosaveState,
    target: Option<EditorTarget>,
    buffer: String,
    last_stamp: i64,
}

impl AutosaveController {
    pub fn new(delay: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            state: AutosaveState::Idle,
            target: None,
            buffer: String::new(),
            last_stamp: 0,
        }
    }

    pub fn state(&self) -> AutosaveState {
        self.state
    }

    pub fn target(&self) -> Option<&EditorTarget> {
        self.target.as_ref()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn is_pending(&self) -> bool {
        self.debouncer.is_pending()
    }

    /// Bind the editor to `target`, replacing the buffer with the existing
    /// note's content (or nothing).
    ///
    /// Callers must [`flush`](Self::flush) first; an unflushed edit is dropped here.
    pub fn load(&mut self, target: EditorTarget, existing: Option<&Note>) -> LoadStatus {
        if self.debouncer.cancel() {
            tracing::warn!("Dropping unflushed edit for {}", target.key);
        }
        self.state = AutosaveState::Idle;
        self.buffer = existing.map(|n| n.content.clone()).unwrap_or_default();
        self.target = Some(target);

        if existing.is_some() {
            LoadStatus::Loaded
        } else {
            LoadStatus::New
        }
    }

    /// Replace the buffer and restart the debounce window.
    ///
    /// Returns `false` (and does nothing) when no target is bound or the
    /// content is unchanged.
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        let content = content.into();
        if self.target.is_none() || content == self.buffer {
            return false;
        }
        self.buffer = content;
        self.debouncer.schedule();
        self.state = AutosaveState::PendingSave;
        true
    }

    /// Resolves when the pending save is due. See [`Debouncer::wait`].
    pub fn wait(&self) -> impl Future<Output = ()> + Send + 'static {
        self.debouncer.wait()
    }

    /// Run the pending save if its deadline has passed.
    pub async fn fire(
        &mut self,
        store: &NoteStore,
        cache: &mut ListCache,
    ) -> Result<Option<SaveStatus>, StoreError> {
        if !self.debouncer.take_due(Instant::now()) {
            return Ok(None);
        }
        self.save(store, cache).await.map(Some)
    }

    /// Run the pending save now, regardless of its deadline.
    pub async fn flush(
        &mut self,
        store: &NoteStore,
        cache: &mut ListCache,
    ) -> Result<Option<SaveStatus>, StoreError> {
        if !self.debouncer.cancel() {
            return Ok(None);
        }
        self.save(store, cache).await.map(Some)
    }

    async fn save(
        &mut self,
        store: &NoteStore,
        cache: &mut ListCache,
    ) -> Result<SaveStatus, StoreError> {
        let Some(target) = self.target.clone() else {
            self.state = AutosaveState::Idle;
            return Ok(SaveStatus::Empty);
        };

        self.state = AutosaveState::Saving;
        let result = self.persist(store, cache, target).await;

        match &result {
            Ok(status) => {
                self.state = AutosaveState::Idle;
                tracing::debug!("Autosave: {}", status);
            }
            Err(e) => {
                self.debouncer.schedule();
                self.state = AutosaveState::PendingSave;
                tracing::error!("Autosave failed, will retry: {}", e);
            }
        }
        result
    }

    async fn persist(
        &mut self,
        store: &NoteStore,
        cache: &mut ListCache,
        target: EditorTarget,
    ) -> Result<SaveStatus, StoreError> {
        if is_blank(&self.buffer) {
            if store.get_note(target.scope, &target.key).await?.is_none() {
                return Ok(SaveStatus::Empty);
            }
            store.delete_note(target.scope, &target.key).await?;
            cache.apply_delete(target.scope, &target.key);
            return Ok(SaveStatus::Cleared);
        }

        let note = Note {
            key: target.key,
            url_sample: target.url_sample,
            scope: target.scope,
            title: target.title,
            content: self.buffer.clone(),
            updated_at: self.next_stamp(),
        };
        store.set_note(&note).await?;
        cache.apply_set(note);
        Ok(SaveStatus::Saved)
    }

    /// Wall-clock millis, nudged forward so stamps from one controller never repeat.
    fn next_stamp(&mut self) -> i64 {
        let stamp = now_millis().max(self.last_stamp + 1);
        self.last_stamp = stamp;
        stamp
    }
}

impl Default for AutosaveController {
    fn default() -> Self {
        Self::new(DEFAULT_AUTOSAVE_DELAY)
    }
}
