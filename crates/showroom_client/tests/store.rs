use std::fs;

use showroom_client::{
    FileSessionStore, MemorySessionStore, SessionStore, UserRecord, ACCESS_TOKEN_TTL_SECS,
    REFRESH_TOKEN_TTL_SECS,
};

const NOW: i64 = 1_700_000_000;

fn test_user() -> UserRecord {
    UserRecord {
        id: 7,
        username: "manager".to_string(),
        role: "manager".to_string(),
    }
}

#[test]
fn file_store_round_trips_all_three_entries() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileSessionStore::new(dir.path().to_path_buf());

    store
        .put("acc-1", "ref-1", &test_user(), NOW)
        .expect("save session");

    let snapshot = store.snapshot(NOW);
    assert_eq!(snapshot.access_token.as_deref(), Some("acc-1"));
    assert_eq!(snapshot.refresh_token.as_deref(), Some("ref-1"));
    assert_eq!(snapshot.user, Some(test_user()));
    assert!(snapshot.is_complete());
}

#[test]
fn access_token_expires_before_the_refresh_token() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileSessionStore::new(dir.path().to_path_buf());
    store
        .put("acc-1", "ref-1", &test_user(), NOW)
        .expect("save session");

    // Two hours later the access token has aged out, the rest has not.
    let later = NOW + ACCESS_TOKEN_TTL_SECS + ACCESS_TOKEN_TTL_SECS;
    let snapshot = store.snapshot(later);
    assert_eq!(snapshot.access_token, None);
    assert_eq!(snapshot.refresh_token.as_deref(), Some("ref-1"));
    assert_eq!(snapshot.user, Some(test_user()));
    assert!(!snapshot.is_complete());

    // Past the refresh TTL nothing is left.
    let much_later = NOW + REFRESH_TOKEN_TTL_SECS + 1;
    let snapshot = store.snapshot(much_later);
    assert_eq!(snapshot.access_token, None);
    assert_eq!(snapshot.refresh_token, None);
    assert_eq!(snapshot.user, None);
}

#[test]
fn clear_removes_the_session_file() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileSessionStore::new(dir.path().to_path_buf());
    store
        .put("acc-1", "ref-1", &test_user(), NOW)
        .expect("save session");
    assert!(store.path().exists());

    store.clear();

    assert!(!store.path().exists());
    assert_eq!(store.snapshot(NOW).access_token, None);
    // Clearing an already-empty store stays quiet.
    store.clear();
}

#[test]
fn corrupt_session_file_reads_as_unauthenticated() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileSessionStore::new(dir.path().to_path_buf());
    store
        .put("acc-1", "ref-1", &test_user(), NOW)
        .expect("save session");
    fs::write(store.path(), "not a ron document").expect("corrupt file");

    let snapshot = store.snapshot(NOW);
    assert_eq!(snapshot.access_token, None);
    assert_eq!(snapshot.user, None);
}

#[test]
fn put_replaces_the_previous_pair_wholesale() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = FileSessionStore::new(dir.path().to_path_buf());
    store
        .put("acc-1", "ref-1", &test_user(), NOW)
        .expect("save session");
    store
        .put("acc-2", "ref-2", &test_user(), NOW + 60)
        .expect("replace session");

    let snapshot = store.snapshot(NOW + 60);
    assert_eq!(snapshot.access_token.as_deref(), Some("acc-2"));
    assert_eq!(snapshot.refresh_token.as_deref(), Some("ref-2"));
}

#[test]
fn memory_store_honors_ttls_too() {
    let store = MemorySessionStore::new();
    store
        .put("acc-1", "ref-1", &test_user(), NOW)
        .expect("save session");

    assert!(store.snapshot(NOW).is_complete());
    assert_eq!(
        store.snapshot(NOW + REFRESH_TOKEN_TTL_SECS + 1).refresh_token,
        None
    );

    store.clear();
    assert_eq!(store.snapshot(NOW).access_token, None);
}
