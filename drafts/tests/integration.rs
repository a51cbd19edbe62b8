use blockdoc::{Block, Document};
use drafts::{Autosave, DirStore, Draft, MemoryStore, PostKey, Snapshot, SnapshotStore};

const HOUR_MS: i64 = 60 * 60 * 1000;

fn doc(text: &str) -> Document {
    Document::new(vec![Block::paragraph(text)], 1_000)
}

fn draft<'a>(title: &'a str, document: &'a Document) -> Draft<'a> {
    Draft {
        title,
        document,
        category: "general",
        tags: &[],
    }
}

fn controller(key: PostKey) -> Autosave<MemoryStore> {
    Autosave::new(MemoryStore::new(), key).with_debounce_ms(1_000)
}

#[test]
fn writes_after_debounce_window() {
    let mut autosave = controller(PostKey::New);
    let document = doc("hello");

    autosave.note_change(10_000);
    assert!(!autosave.tick(10_500, draft("Title", &document)).unwrap());
    assert!(autosave.tick(11_000, draft("Title", &document)).unwrap());

    let stored = autosave
        .store()
        .get("autosave_new_post")
        .unwrap()
        .expect("snapshot written");
    assert_eq!(stored.title, "Title");
    assert_eq!(stored.timestamp, 11_000);
    assert_eq!(stored.document().unwrap(), document);
}

#[test]
fn does_not_write_without_title() {
    let mut autosave = controller(PostKey::New);
    let document = doc("hello");

    autosave.note_change(0);
    assert!(!autosave.tick(5_000, draft("  ", &document)).unwrap());
    // The change is still pending: supplying a title later saves it.
    assert!(autosave.tick(6_000, draft("Now titled", &document)).unwrap());
}

#[test]
fn does_not_rewrite_unchanged_content() {
    let mut autosave = controller(PostKey::New);
    let document = doc("hello");

    autosave.note_change(0);
    assert!(autosave.tick(2_000, draft("Title", &document)).unwrap());

    // A spurious change notification with identical content writes nothing.
    autosave.note_change(3_000);
    assert!(!autosave.tick(10_000, draft("Title", &document)).unwrap());

    // An actual edit writes again.
    let edited = doc("hello, world");
    autosave.note_change(11_000);
    assert!(autosave.tick(13_000, draft("Title", &edited)).unwrap());
}

#[test]
fn tick_without_changes_is_a_no_op() {
    let mut autosave = controller(PostKey::New);
    let document = doc("hello");
    assert!(!autosave.tick(60_000, draft("Title", &document)).unwrap());
    assert!(autosave.store().get("autosave_new_post").unwrap().is_none());
}

#[test]
fn restore_offered_only_inside_window() {
    let snapshot = Snapshot {
        title: "Title".into(),
        content: doc("hello").to_json().unwrap(),
        timestamp: 0,
        category: String::new(),
        tags: Vec::new(),
    };

    let mut store = MemoryStore::new();
    store.put("autosave_new_post", &snapshot).unwrap();
    let mut autosave = Autosave::new(store, PostKey::New);
    let offered = autosave.restore_offer(23 * HOUR_MS);
    assert_eq!(offered.as_ref().map(|s| s.title.as_str()), Some("Title"));

    let mut store = MemoryStore::new();
    store.put("autosave_new_post", &snapshot).unwrap();
    let mut autosave = Autosave::new(store, PostKey::New);
    assert!(autosave.restore_offer(25 * HOUR_MS).is_none());
    // Stale entries are purged, not kept around.
    assert!(autosave.store().get("autosave_new_post").unwrap().is_none());
}

#[test]
fn corrupt_snapshot_is_purged_silently() {
    let mut store = MemoryStore::new();
    store.put_raw("autosave_post_7", "{not json");
    let mut autosave = Autosave::new(store, PostKey::Existing("7".into()));

    assert!(autosave.restore_offer(0).is_none());
    assert!(autosave.store().get("autosave_post_7").unwrap().is_none());
}

#[test]
fn restore_then_tick_does_not_rewrite_same_content() {
    let document = doc("restored");
    let snapshot = Snapshot {
        title: "Title".into(),
        content: document.to_json().unwrap(),
        timestamp: 1_000,
        category: String::new(),
        tags: Vec::new(),
    };
    let mut store = MemoryStore::new();
    store.put("autosave_new_post", &snapshot).unwrap();

    let mut autosave = Autosave::new(store, PostKey::New).with_debounce_ms(0);
    autosave.restore_offer(2_000).expect("fresh snapshot");

    // The editor re-reports the restored content as a change; nothing new
    // to write.
    autosave.note_change(3_000);
    assert!(!autosave.tick(4_000, draft("Title", &document)).unwrap());
}

#[test]
fn dir_store_round_trips_through_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirStore::open(dir.path()).unwrap();

    let snapshot = Snapshot {
        title: "On disk".into(),
        content: doc("persisted").to_json().unwrap(),
        timestamp: 5,
        category: "notes".into(),
        tags: vec!["a".into(), "b".into()],
    };
    store.put("autosave_post_3", &snapshot).unwrap();

    let read = store.get("autosave_post_3").unwrap().unwrap();
    assert_eq!(read, snapshot);
    assert_eq!(store.keys().unwrap(), vec!["autosave_post_3".to_string()]);

    store.remove("autosave_post_3").unwrap();
    assert!(store.get("autosave_post_3").unwrap().is_none());
    // Removing twice is fine.
    store.remove("autosave_post_3").unwrap();
}

#[test]
fn purge_stale_sweeps_old_and_corrupt_entries() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = DirStore::open(dir.path()).unwrap();

    let fresh = Snapshot {
        title: "fresh".into(),
        content: doc("a").to_json().unwrap(),
        timestamp: 30 * HOUR_MS,
        category: String::new(),
        tags: Vec::new(),
    };
    let old = Snapshot {
        timestamp: 0,
        ..fresh.clone()
    };
    store.put("autosave_post_1", &fresh).unwrap();
    store.put("autosave_post_2", &old).unwrap();
    std::fs::write(dir.path().join("autosave_post_3.json"), "{bad").unwrap();
    // Foreign files are left alone.
    std::fs::write(dir.path().join("notes.json"), "{}").unwrap();

    let mut removed = drafts::purge_stale(&mut store, 31 * HOUR_MS).unwrap();
    removed.sort();
    assert_eq!(removed, vec!["autosave_post_2", "autosave_post_3"]);
    assert!(store.get("autosave_post_1").unwrap().is_some());
    assert!(dir.path().join("notes.json").exists());
}
