//! Property-based tests over the universally quantified invariants.

use pathstore::{Error, OpenOptions, Store};
use proptest::prelude::*;
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

fn segment() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,8}"
}

fn dotted_name() -> impl Strategy<Value = String> {
    proptest::collection::vec(segment(), 1..4).prop_map(|segs| segs.join("."))
}

proptest! {
    #[test]
    fn create_then_get_round_trips_integer(name in dotted_name(), v in any::<i64>()) {
        let (_dir, store) = open_temp();
        store.create(&name, v).unwrap();
        prop_assert_eq!(store.get_integer(&name).unwrap(), v);
    }

    #[test]
    fn create_then_get_round_trips_string(name in dotted_name(), v in "\\PC{0,64}") {
        let (_dir, store) = open_temp();
        store.create(&name, v.clone()).unwrap();
        prop_assert_eq!(store.get_string(&name).unwrap(), v);
    }

    #[test]
    fn create_then_delete_round_trips(name in dotted_name()) {
        let (_dir, store) = open_temp();
        store.create(&name, 0i64).unwrap();
        store.delete(&name, false).unwrap();
        prop_assert!(!store.exists(&name).unwrap());
    }

    #[test]
    fn successful_write_leaves_store_consistent(name in dotted_name(), v in any::<i64>()) {
        let (_dir, store) = open_temp();
        store.create(&name, v).unwrap();
        prop_assert!(store.check_data_consistency().is_ok());
    }

    #[test]
    fn set_changes_value_and_preserves_old_type_as_mismatch(name in dotted_name(), v in any::<i64>()) {
        let (_dir, store) = open_temp();
        store.create(&name, 0i64).unwrap();
        store.set(&name, v.to_string()).unwrap();
        prop_assert_eq!(store.get_string(&name).unwrap(), v.to_string());
        prop_assert!(matches!(store.get_integer(&name).unwrap_err(), Error::WrongValueType { .. }));
    }

    #[test]
    fn revision_changes_on_every_ancestor_after_a_write(name in proptest::collection::vec(segment(), 2..4)) {
        let (_dir, store) = open_temp();
        let full = name.join(".");
        store.create(&full, 1i64).unwrap();

        let mut ancestors = Vec::new();
        for i in 1..name.len() {
            ancestors.push(name[..i].join("."));
        }
        ancestors.push(String::new()); // root

        let before: Vec<i64> = ancestors
            .iter()
            .map(|a| store.get_revision(a).unwrap().revision)
            .collect();

        store.set(&full, 2i64).unwrap();

        let after: Vec<i64> = ancestors
            .iter()
            .map(|a| store.get_revision(a).unwrap().revision)
            .collect();

        for (b, a) in before.iter().zip(after.iter()) {
            prop_assert_ne!(b, a);
        }
    }

    #[test]
    fn read_only_checks_never_change_revision(name in dotted_name()) {
        let (_dir, store) = open_temp();
        store.create(&name, 1i64).unwrap();
        let before = store.get_revision(&name).unwrap();

        let _ = store.exists(&name).unwrap();
        let _ = store.has_child(&name).unwrap();
        let _ = store.get_children(&name).unwrap();
        let _ = store.get_type(&name).unwrap();
        let _ = store.is_integer(&name).unwrap();

        let after = store.get_revision(&name).unwrap();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn set_or_create_is_idempotent(name in dotted_name(), v in any::<i64>()) {
        let (_dir, store) = open_temp();
        store.set_or_create(&name, v).unwrap();
        let first = store.get_integer(&name).unwrap();
        store.set_or_create(&name, v).unwrap();
        let second = store.get_integer(&name).unwrap();
        prop_assert_eq!(first, v);
        prop_assert_eq!(second, v);
    }

    #[test]
    fn names_with_adjacent_or_edge_delimiters_are_invalid(s in "[a-z]{0,4}") {
        let (_dir, store) = open_temp();
        let bad_leading = format!(".{s}");
        let bad_trailing = format!("{s}.");
        let bad_adjacent = format!("a..{s}");
        for bad in [bad_leading, bad_trailing, bad_adjacent] {
            prop_assert!(matches!(store.exists(&bad).unwrap_err(), Error::InvalidName(_)));
        }
    }
}
