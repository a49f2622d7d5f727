use pagenotes::cache::{ListCache, LIST_LIMIT};
use pagenotes::models::{Note, Scope};
use pagenotes::store::NoteStore;

fn note(scope: Scope, key: &str, content: &str, updated_at: i64) -> Note {
    Note {
        key: key.to_string(),
        url_sample: key.to_string(),
        scope,
        title: None,
        content: content.to_string(),
        updated_at,
    }
}

async fn seeded_store(notes: &[Note]) -> NoteStore {
    let store = NoteStore::in_memory();
    for n in notes {
        store.set_note(n).await.expect("Failed to seed");
    }
    store
}

mod loading {
    use super::*;

    #[tokio::test]
    async fn loads_lazily_on_first_refresh() {
        let store = seeded_store(&[note(Scope::Path, "a", "x", 1)]).await;
        let mut cache = ListCache::new();
        assert!(!cache.is_loaded());

        let notes = cache.refresh(&store, "").await.expect("Refresh failed");

        assert!(cache.is_loaded());
        assert_eq!(notes.len(), 1);
    }

    #[tokio::test]
    async fn reuses_loaded_state_until_invalidated() {
        let store = seeded_store(&[note(Scope::Path, "a", "x", 1)]).await;
        let mut cache = ListCache::new();
        cache.refresh(&store, "").await.expect("Refresh failed");

        // Written behind the cache's back
        store.set_note(&note(Scope::Path, "b", "y", 2)).await.expect("Failed to save");
        assert_eq!(cache.refresh(&store, "").await.expect("Refresh failed").len(), 1);

        cache.invalidate();
        assert_eq!(cache.refresh(&store, "").await.expect("Refresh failed").len(), 2);
    }

    #[tokio::test]
    async fn stays_loaded_when_the_store_is_empty() {
        let store = NoteStore::in_memory();
        let mut cache = ListCache::new();
        cache.refresh(&store, "").await.expect("Refresh failed");

        store.set_note(&note(Scope::Path, "late", "x", 1)).await.expect("Failed to save");

        assert!(cache.is_loaded());
        assert!(cache.refresh(&store, "").await.expect("Refresh failed").is_empty());
    }
}

mod views {
    use super::*;

    #[tokio::test]
    async fn sorts_newest_first() {
        let store = seeded_store(&[
            note(Scope::Path, "old", "x", 1),
            note(Scope::Path, "new", "x", 3),
            note(Scope::Path, "mid", "x", 2),
        ])
        .await;
        let mut cache = ListCache::new();

        let keys: Vec<String> = cache
            .refresh(&store, "")
            .await
            .expect("Refresh failed")
            .into_iter()
            .map(|n| n.key)
            .collect();

        assert_eq!(keys, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn filters_case_insensitively_across_fields() {
        let mut by_title = note(Scope::Path, "https://t.dev/", "nothing", 1);
        by_title.title = Some("All about FOO".to_string());
        let by_content = note(Scope::Path, "https://c.dev/", "a Foo note", 2);
        let mut by_sample = note(Scope::Path, "https://s.dev/", "nothing", 3);
        by_sample.url_sample = "https://s.dev/?q=foo".to_string();
        let by_key = note(Scope::Exact, "https://foo.dev/", "nothing", 4);
        let unrelated = note(Scope::Path, "https://bar.dev/", "bar", 5);

        let store = seeded_store(&[by_title, by_content, by_sample, by_key, unrelated]).await;
        let mut cache = ListCache::new();

        let keys: Vec<String> = cache
            .refresh(&store, "  foo ")
            .await
            .expect("Refresh failed")
            .into_iter()
            .map(|n| n.key)
            .collect();

        assert_eq!(
            keys,
            vec!["https://foo.dev/", "https://s.dev/", "https://c.dev/", "https://t.dev/"]
        );
    }

    #[tokio::test]
    async fn drops_blank_notes() {
        let store = seeded_store(&[
            note(Scope::Path, "blank", " \n ", 2),
            note(Scope::Path, "real", "x", 1),
        ])
        .await;
        let mut cache = ListCache::new();

        let notes = cache.refresh(&store, "").await.expect("Refresh failed");

        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].key, "real");
    }

    #[tokio::test]
    async fn caps_results() {
        let notes: Vec<Note> = (0..250)
            .map(|i| note(Scope::Path, &format!("k{}", i), "x", i))
            .collect();
        let store = seeded_store(&notes).await;
        let mut cache = ListCache::new();

        let listed = cache.refresh(&store, "").await.expect("Refresh failed");

        assert_eq!(listed.len(), LIST_LIMIT);
        assert_eq!(listed[0].updated_at, 249);
        assert_eq!(cache.len(), 250);
    }
}

mod local_edits {
    use super::*;

    #[test]
    fn apply_set_replaces_in_place() {
        let mut cache = ListCache::new();
        cache.apply_set(note(Scope::Path, "a", "one", 1));
        cache.apply_set(note(Scope::Path, "b", "two", 2));

        cache.apply_set(note(Scope::Path, "a", "updated", 3));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.notes()[0].content, "updated");
    }

    #[test]
    fn apply_set_keeps_scopes_apart() {
        let mut cache = ListCache::new();
        cache.apply_set(note(Scope::Path, "a", "path", 1));
        cache.apply_set(note(Scope::Origin, "a", "origin", 2));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.find(Scope::Origin, "a").map(|n| n.content.as_str()), Some("origin"));
    }

    #[test]
    fn apply_delete_removes_only_the_match() {
        let mut cache = ListCache::new();
        cache.apply_set(note(Scope::Path, "a", "x", 1));
        cache.apply_set(note(Scope::Exact, "a", "x", 1));

        cache.apply_delete(Scope::Path, "a");
        cache.apply_delete(Scope::Path, "missing");

        assert_eq!(cache.len(), 1);
        assert!(cache.find(Scope::Exact, "a").is_some());
    }
}
