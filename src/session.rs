//! The per-caller controller tying the core together.
//!
//! A [`Session`] owns its [`ListCache`] and [`AutosaveController`]; nothing
//! else reads or writes them. Every operation that rebinds the editor (page
//! navigation, scope change, opening a note from the list) flushes the pending
//! save first and only then derives the new target, inside one `&mut self`
//! call, so the last edit of the previous page is never lost.

use std::future::Future;
use std::time::Duration;

use crate::autosave::{AutosaveController, EditorTarget, LoadStatus, SaveStatus};
use crate::bundle::{self, ExportBundle, ImportReport};
use crate::cache::ListCache;
use crate::error::{BundleError, StoreError};
use crate::keys::derive_key;
use crate::models::{Note, NoteSummary, Scope};
use crate::store::NoteStore;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Page {
    url: String,
    title: Option<String>,
}

pub struct Session {
    store: NoteStore,
    cache: ListCache,
    autosave: AutosaveController,
    scope: Scope,
    page: Option<Page>,
}

impl Session {
    /// Start a session using the persisted default scope.
    pub async fn start(store: NoteStore, autosave_delay: Duration) -> Result<Self, StoreError> {
        let scope = store.default_scope().await?;
        tracing::debug!("Session started with scope {}", scope);
        Ok(Self {
            store,
            cache: ListCache::new(),
            autosave: AutosaveController::new(autosave_delay),
            scope,
            page: None,
        })
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    pub fn cache(&self) -> &ListCache {
        &self.cache
    }

    pub fn autosave(&self) -> &AutosaveController {
        &self.autosave
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn current_url(&self) -> Option<&str> {
        self.page.as_ref().map(|p| p.url.as_str())
    }

    // ============================================================
    // Editor binding
    // ============================================================

    /// Bind the editor to the note for `url` under the current scope.
    pub async fn open_page(
        &mut self,
        url: &str,
        title: Option<String>,
    ) -> Result<LoadStatus, StoreError> {
        self.flush().await?;
        self.page = Some(Page {
            url: url.to_string(),
            title,
        });
        self.load_current_page().await
    }

    /// Switch scope for the current page and persist it as the default.
    ///
    /// Returns `None` when no page is open.
    pub async fn change_scope(&mut self, scope: Scope) -> Result<Option<LoadStatus>, StoreError> {
        self.flush().await?;
        self.store.set_default_scope(scope).await?;
        self.use_scope(scope).await
    }

    /// Switch scope for this session only, leaving the persisted default alone.
    pub async fn use_scope(&mut self, scope: Scope) -> Result<Option<LoadStatus>, StoreError> {
        self.flush().await?;
        self.scope = scope;
        if self.page.is_none() {
            return Ok(None);
        }
        self.load_current_page().await.map(Some)
    }

    /// Bind the editor to a note picked from the list.
    ///
    /// The session scope follows the note; the persisted default does not change.
    /// Returns `false` when the note is not in the cache.
    pub async fn open_from_list(&mut self, scope: Scope, key: &str) -> Result<bool, StoreError> {
        self.flush().await?;
        self.cache.ensure_loaded(&self.store).await?;
        let Some(note) = self.cache.find(scope, key).cloned() else {
            return Ok(false);
        };

        self.scope = scope;
        self.page = Some(Page {
            url: note.url_sample.clone(),
            title: note.title.clone(),
        });
        self.autosave.load(
            EditorTarget {
                scope,
                key: note.key.clone(),
                url_sample: note.url_sample.clone(),
                title: note.title.clone(),
            },
            Some(&note),
        );
        Ok(true)
    }

    async fn load_current_page(&mut self) -> Result<LoadStatus, StoreError> {
        let Some(page) = self.page.clone() else {
            return Ok(LoadStatus::New);
        };
        let derived = derive_key(&page.url, self.scope);
        let existing = self.store.get_note(self.scope, &derived.key).await?;
        let status = self.autosave.load(
            EditorTarget {
                scope: self.scope,
                key: derived.key,
                url_sample: derived.sample,
                title: page.title,
            },
            existing.as_ref(),
        );
        tracing::debug!("Editor bound to {} ({})", page.url, status);
        Ok(status)
    }

    // ============================================================
    // Autosave
    // ============================================================

    /// Replace the editor buffer. See [`AutosaveController::edit`].
    pub fn edit(&mut self, content: impl Into<String>) -> bool {
        self.autosave.edit(content)
    }

    /// Resolves when a pending save is due; pair with [`Session::fire_autosave`].
    pub fn autosave_wait(&self) -> impl Future<Output = ()> + Send + 'static {
        self.autosave.wait()
    }

    pub async fn fire_autosave(&mut self) -> Result<Option<SaveStatus>, StoreError> {
        self.autosave.fire(&self.store, &mut self.cache).await
    }

    pub async fn flush(&mut self) -> Result<Option<SaveStatus>, StoreError> {
        self.autosave.flush(&self.store, &mut self.cache).await
    }

    // ============================================================
    // Notes and list
    // ============================================================

    /// Write a note and mirror it into the cache.
    pub async fn set_note(&mut self, note: Note) -> Result<(), StoreError> {
        self.store.set_note(&note).await?;
        self.cache.apply_set(note);
        Ok(())
    }

    /// Delete a note and drop it from the cache.
    pub async fn delete_note(&mut self, scope: Scope, key: &str) -> Result<(), StoreError> {
        self.store.delete_note(scope, key).await?;
        self.cache.apply_delete(scope, key);
        Ok(())
    }

    pub async fn refresh_list(&mut self, query: &str) -> Result<Vec<Note>, StoreError> {
        self.cache.refresh(&self.store, query).await
    }

    pub async fn summaries(&mut self, query: &str) -> Result<Vec<NoteSummary>, StoreError> {
        let notes = self.refresh_list(query).await?;
        Ok(notes.iter().map(NoteSummary::from).collect())
    }

    // ============================================================
    // Bundles
    // ============================================================

    pub async fn export_bundle(&mut self) -> Result<ExportBundle, StoreError> {
        self.flush().await?;
        let bundle = bundle::export_bundle(&self.store).await?;
        self.cache.reload(&self.store).await?;
        Ok(bundle)
    }

    /// Import a bundle, then reload the list cache from the store.
    ///
    /// A failed import may have written some entries already, so the cache is
    /// invalidated either way.
    pub async fn import_bundle(&mut self, raw: &str) -> Result<ImportReport, BundleError> {
        self.flush().await?;
        self.cache.invalidate();
        let report = bundle::import_bundle(&self.store, raw).await?;
        self.cache.reload(&self.store).await?;
        Ok(report)
    }
}
