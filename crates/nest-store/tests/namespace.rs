//! End-to-end behaviour of the public store API across reopen cycles.

use std::time::Duration;

use nest_store::{resolver, ErrorKind, Session, Store, StoreConfig};
use nest_types::Path;

fn config() -> StoreConfig {
    StoreConfig::default().with_open_timeout(Duration::from_millis(50))
}

fn p(s: &str) -> Path {
    Path::parse(s).unwrap()
}

#[test]
fn move_key_between_sibling_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = Session::open(dir.path().join("test.db"), config()).unwrap();

    session.apply(|store| store.create_bucket(&p("a/b"))).unwrap();
    session
        .apply(|store| store.create_key(b"k", b"1", &p("a/b")))
        .unwrap();
    assert_eq!(session.node("a/b/k").unwrap().value(), Some(&b"1"[..]));

    session
        .apply(|store| store.move_key(&p("a/b/k"), &p("a/c/k")))
        .unwrap();

    assert!(session.node("a/c").unwrap().is_bucket());
    assert_eq!(session.node("a/c/k").unwrap().value(), Some(&b"1"[..]));
    assert!(session.node("a/b/k").is_none());
    assert!(session.node("a/b").unwrap().children().is_empty());
}

#[test]
fn data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("test.db");

    let mut store = Store::open(&file, config()).unwrap();
    store.create_key(b"k", b"v", &p("a/b")).unwrap();
    store.copy_bucket(&p("a"), &p("z")).unwrap();
    store.close().unwrap();

    let mut session = Session::open(&file, config()).unwrap();
    assert_eq!(session.snapshot().index().keys(), vec!["a", "a/b", "a/b/k", "z", "z/b", "z/b/k"]);
    assert_eq!(session.store_mut().get_key(&p("z/b/k")).unwrap(), b"v");
}

#[test]
fn second_open_is_busy_until_closed() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("test.db");

    let first = Store::open(&file, config()).unwrap();
    let err = Session::open(&file, config()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreBusy);

    first.close().unwrap();
    assert!(Session::open(&file, config()).is_ok());
}

#[test]
fn failed_operations_leave_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(dir.path().join("test.db"), config()).unwrap();
    store.create_key(b"k", b"1", &p("a/b")).unwrap();
    store.create_key(b"k", b"2", &p("c")).unwrap();
    let before = store.build_snapshot().unwrap();

    let failures = [
        store.copy_bucket(&p("a"), &p("c")).unwrap_err(),
        store.move_bucket(&p("a"), &p("a/b/inside")).unwrap_err(),
        store.move_key(&p("a/b/k"), &p("c/k")).unwrap_err(),
        store.rename_key(&p("a/b/k"), b"k").unwrap_err(),
        store.copy_key(&p("a/b/missing"), &p("new/k")).unwrap_err(),
    ];
    assert_eq!(failures[0].kind(), ErrorKind::KeyExists);
    assert_eq!(failures[1].kind(), ErrorKind::InvalidPath);
    assert_eq!(failures[2].kind(), ErrorKind::KeyExists);
    assert_eq!(failures[3].kind(), ErrorKind::KeyExists);
    assert_eq!(failures[4].kind(), ErrorKind::InvalidPath);

    let after = store.build_snapshot().unwrap();
    assert_eq!(before.index().keys(), after.index().keys());
    for node in before.nodes() {
        let other = after.get_path(node.path()).unwrap();
        assert!(node.same_contents(other));
    }
}

#[test]
fn resolver_runs_inside_caller_transactions() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = Store::open(dir.path().join("test.db"), config()).unwrap();

    let created = store
        .update(|tx| resolver::ensure_path(tx, &p("x/y")))
        .unwrap();
    let resolved = store.view(|tx| resolver::resolve(tx, &p("x/y"))).unwrap();
    assert_eq!(created, resolved);
    assert_eq!(
        store.view(|tx| resolver::resolve_parent(tx, &p("x"))).unwrap(),
        None
    );
}
