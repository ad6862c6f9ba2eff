//! Session-store integration tests — file-backed persistence across "restarts".

use monty_insight::session::{
    AccountLinkChoice, FileStore, KidProfile, KvStore, OnboardingState, Session,
};
use tempfile::TempDir;

#[test]
fn file_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    {
        let store = FileStore::open(&path);
        store.set("selected_family_id", "fam-42");
        store.set("selected_kid_id", "kid-7");
    }

    // A new store instance (new "process") sees the persisted values.
    let store = FileStore::open(&path);
    assert_eq!(store.get("selected_family_id").as_deref(), Some("fam-42"));
    assert_eq!(store.get("selected_kid_id").as_deref(), Some("kid-7"));

    store.remove("selected_kid_id");
    let store = FileStore::open(&path);
    assert_eq!(store.get("selected_kid_id"), None);
}

#[test]
fn corrupt_store_file_starts_empty() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "definitely not json {{{").unwrap();

    let store = FileStore::open(&path);
    assert_eq!(store.get("selected_family_id"), None);

    // And it recovers: the next write produces a valid file.
    store.set("selected_family_id", "fam-1");
    let store = FileStore::open(&path);
    assert_eq!(store.get("selected_family_id").as_deref(), Some("fam-1"));
}

#[test]
fn onboarding_state_roundtrips_through_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let state = OnboardingState {
        family_name: "The Riveras".to_string(),
        parent_name: "Dana".to_string(),
        kid_count: Some(2),
        kids: vec![KidProfile::empty(0), KidProfile::empty(1)],
        account_link_choice: Some(AccountLinkChoice::Later),
        completed: true,
    };

    {
        let session = Session::new(Box::new(FileStore::open(&path)));
        session.set_onboarding_state(&state);
        session.set_onboarding_step(4);
    }

    let session = Session::new(Box::new(FileStore::open(&path)));
    assert_eq!(session.onboarding_state(), state);
    assert_eq!(session.onboarding_step(), 4);
}

#[test]
fn missing_directory_is_created_on_write() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("session.json");

    let store = FileStore::open(&path);
    store.set("selected_family_id", "fam-9");

    let store = FileStore::open(&path);
    assert_eq!(store.get("selected_family_id").as_deref(), Some("fam-9"));
}
