//! End-to-end scenarios against a real (temp-file) SQLite-backed store.

use pathstore::{Error, OpenOptions, Store, ValueType};
use tempfile::TempDir;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn open_temp() -> (TempDir, Store) {
    init_tracing();
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("store.db");
    let store = Store::open(OpenOptions::new(&path)).expect("open store");
    (dir, store)
}

#[test]
fn auto_vivify_and_read_back() {
    let (_dir, store) = open_temp();
    store.create("a.b.c", "value").unwrap();

    assert!(store.exists("a").unwrap());
    assert!(store.is_integer("a").unwrap());
    assert_eq!(store.get_integer("a").unwrap(), 0);

    assert!(store.exists("a.b").unwrap());
    assert!(store.is_integer("a.b").unwrap());
    assert_eq!(store.get_integer("a.b").unwrap(), 0);

    assert!(store.exists("a.b.c").unwrap());
    assert!(store.is_string("a.b.c").unwrap());
    assert_eq!(store.get_string("a.b.c").unwrap(), "value");
}

#[test]
fn create_collision_at_any_depth_fails() {
    let (_dir, store) = open_temp();
    store.create("a.b.c", "value").unwrap();

    assert!(matches!(
        store.create("a.b", 0i64).unwrap_err(),
        Error::NameAlreadyExists(ref n) if n == "a.b"
    ));
    assert!(matches!(
        store.create("a.b.c", 0i64).unwrap_err(),
        Error::NameAlreadyExists(ref n) if n == "a.b.c"
    ));
}

#[test]
fn revision_propagation_to_root() {
    let (_dir, store) = open_temp();
    let r0 = store.get_revision("").unwrap();
    store.create("x", 1i64).unwrap();
    let r1 = store.get_revision("").unwrap();
    store.set("x", 2i64).unwrap();
    let r2 = store.get_revision("").unwrap();

    assert_eq!(r0.id, 0);
    assert_eq!(r1.id, 0);
    assert_eq!(r2.id, 0);
    assert_ne!(r0.revision, r1.revision);
    assert_ne!(r1.revision, r2.revision);
}

#[test]
fn delete_semantics() {
    let (_dir, store) = open_temp();
    store.create("a.b", 0i64).unwrap();

    assert!(!store.try_delete("a", false).unwrap());
    assert!(store.exists("a.b").unwrap());

    let root_revision_before = store.get_revision("").unwrap().revision;
    store.delete("a", true).unwrap();
    assert!(!store.exists("a").unwrap());
    assert!(!store.exists("a.b").unwrap());
    assert_ne!(store.get_revision("").unwrap().revision, root_revision_before);
}

#[test]
fn type_mismatch_on_get() {
    let (_dir, store) = open_temp();
    store.create("n", 1i64).unwrap();
    assert!(matches!(
        store.get_string("n").unwrap_err(),
        Error::WrongValueType { expected: ValueType::Text, found: ValueType::Integer, .. }
    ));
}

#[test]
fn empty_blob_round_trips() {
    let (_dir, store) = open_temp();
    store.create("blob", Vec::<u8>::new()).unwrap();
    assert_eq!(store.get_binary("blob").unwrap(), Vec::<u8>::new());
}

#[test]
fn large_blob_round_trips_byte_for_byte() {
    let (_dir, store) = open_temp();
    let payload: Vec<u8> = (0..=255u8).cycle().take(200_000).collect();
    store.create("blob", payload.clone()).unwrap();
    assert_eq!(store.get_binary("blob").unwrap(), payload);
}

#[test]
fn delimiter_rejected_when_it_collides_with_existing_names() {
    let (_dir, store) = open_temp();
    store.create("a_b", 1i64).unwrap();
    assert!(store.set_new_delimiter('.').is_ok());
    assert!(store.set_new_delimiter('_').is_err());
}

#[test]
fn reopen_preserves_entries_and_custom_delimiter() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("store.db");
    {
        let store = Store::open(OpenOptions::new(&path).delimiter('/')).unwrap();
        store.create("a/b", "value").unwrap();
    }
    let store = Store::open(OpenOptions::new(&path).delimiter('.')).unwrap();
    assert_eq!(store.delimiter(), '/');
    assert_eq!(store.get_string("a/b").unwrap(), "value");
}

#[test]
fn opening_missing_file_without_create_fails() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.db");
    assert!(Store::open(OpenOptions::new(&path).create(false)).is_err());
}
