use std::collections::BTreeMap;

use pagenotes::db::Database;
use pagenotes::models::{Note, Scope};
use pagenotes::store::NoteStore;
use serde_json::{json, Value};
use speculate2::speculate;
use tokio_test::block_on;

fn sample_note(key: &str, content: &str) -> Note {
    Note {
        key: key.to_string(),
        url_sample: format!("{}?from=test", key),
        scope: Scope::Path,
        title: None,
        content: content.to_string(),
        updated_at: 1_700_000_000_000,
    }
}

fn entry(db: &Database, key: &str) -> Option<Value> {
    db.get_entries(&[key.to_string()])
        .expect("Query failed")
        .remove(key)
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "entries" {
        it "returns None for a missing key" {
            assert!(entry(&db, "missing").is_none());
        }

        it "round-trips JSON values" {
            db.put_entries(&BTreeMap::from([
                ("a".to_string(), json!({ "n": 1 })),
                ("b".to_string(), json!("text")),
            ])).expect("Failed to write");

            assert_eq!(entry(&db, "a"), Some(json!({ "n": 1 })));
            assert_eq!(entry(&db, "b"), Some(json!("text")));
        }

        it "overwrites on conflict" {
            db.put_entries(&BTreeMap::from([("a".to_string(), json!(1))])).expect("Failed to write");
            db.put_entries(&BTreeMap::from([("a".to_string(), json!(2))])).expect("Failed to write");

            assert_eq!(entry(&db, "a"), Some(json!(2)));
            assert_eq!(db.get_all_entries().expect("Query failed").len(), 1);
        }

        it "fetches only the requested keys" {
            db.put_entries(&BTreeMap::from([
                ("a".to_string(), json!(1)),
                ("b".to_string(), json!(2)),
                ("c".to_string(), json!(3)),
            ])).expect("Failed to write");

            let found = db
                .get_entries(&["a".to_string(), "c".to_string(), "zzz".to_string()])
                .expect("Query failed");
            assert_eq!(found.len(), 2);
            assert_eq!(found.get("c"), Some(&json!(3)));
        }

        it "returns nothing for an empty key list" {
            db.put_entries(&BTreeMap::from([("a".to_string(), json!(1))])).expect("Failed to write");
            assert!(db.get_entries(&[]).expect("Query failed").is_empty());
        }

        it "reports how many entries were removed" {
            db.put_entries(&BTreeMap::from([("a".to_string(), json!(1))])).expect("Failed to write");

            let removed = db
                .remove_entries(&["a".to_string(), "missing".to_string()])
                .expect("Failed to remove");
            assert_eq!(removed, 1);
            assert!(entry(&db, "a").is_none());
        }
    }

    describe "as a note store backend" {
        it "stores and lists notes" {
            let store = NoteStore::new(db.clone());
            block_on(store.set_note(&sample_note("https://a.dev/x/", "first"))).expect("Failed to save");
            block_on(store.set_note(&sample_note("https://a.dev/y/", "second"))).expect("Failed to save");

            let notes = block_on(store.list_all_notes()).expect("Query failed");
            assert_eq!(notes.len(), 2);
        }

        it "keeps the default scope apart from notes" {
            let store = NoteStore::new(db.clone());
            block_on(store.set_default_scope(Scope::Exact)).expect("Failed to save");

            assert_eq!(block_on(store.default_scope()).expect("Query failed"), Scope::Exact);
            assert!(block_on(store.list_all_notes()).expect("Query failed").is_empty());
        }
    }
}

mod on_disk {
    use super::*;

    #[test]
    fn notes_survive_reopening() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("nested").join("notes.db");

        {
            let db = Database::open(path.clone()).expect("Failed to open");
            db.migrate().expect("Failed to migrate");
            let store = NoteStore::new(db);
            block_on(store.set_note(&sample_note("https://a.dev/", "kept"))).expect("Failed to save");
        }

        let db = Database::open(path).expect("Failed to reopen");
        db.migrate().expect("Failed to migrate");
        let store = NoteStore::new(db);
        let found = block_on(store.get_note(Scope::Path, "https://a.dev/")).expect("Query failed");
        assert_eq!(found.map(|n| n.content), Some("kept".to_string()));
    }

    #[test]
    fn non_json_values_are_kept_as_strings() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("raw.db");

        let db = Database::open(path.clone()).expect("Failed to open");
        db.migrate().expect("Failed to migrate");

        let conn = rusqlite::Connection::open(&path).expect("Failed to open raw connection");
        conn.execute(
            "INSERT INTO kv_entries (key, value, written_at) VALUES ('raw', 'not json', 'now')",
            [],
        )
        .expect("Failed to insert");
        drop(conn);

        assert_eq!(entry(&db, "raw"), Some(json!("not json")));
    }
}
