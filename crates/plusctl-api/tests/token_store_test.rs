// Token store behavior over the public trait, on real files.

use std::fs;
use std::path::PathBuf;

use pretty_assertions::assert_eq;

use plusctl_api::{Credential, Error, FileTokenStore, MemoryTokenStore, Model, TokenStore};

const ADDRESS: &str = "192.168.0.239";

/// Locate the single token file a store wrote under its root.
fn token_file(root: &std::path::Path) -> PathBuf {
    let dir = root.join(".config/plusctl");
    let mut entries = fs::read_dir(&dir)
        .expect("token dir")
        .map(|e| e.expect("dir entry").path())
        .collect::<Vec<_>>();
    assert_eq!(entries.len(), 1, "expected exactly one token file");
    entries.remove(0)
}

#[test]
fn file_store_round_trip() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    let credential = Credential::new("abc123", Model::Gs305Ep);
    store.store(ADDRESS, &credential).expect("store");

    let file = token_file(dir.path());
    let name = file.file_name().and_then(|n| n.to_str()).expect("name");
    assert!(name.starts_with("token-"), "{name}");
    assert_eq!(fs::read_to_string(&file).expect("read"), "GS305EP:abc123");

    let loaded = store.get(ADDRESS).expect("get");
    assert_eq!(loaded, credential);
}

#[cfg(unix)]
#[test]
fn file_store_restricts_permissions_to_owner() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());
    store
        .store(ADDRESS, &Credential::new("t", Model::Gs308Ep))
        .expect("store");

    let mode = fs::metadata(token_file(dir.path()))
        .expect("metadata")
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[test]
fn missing_entry_is_token_not_found() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    let err = store.get(ADDRESS).expect_err("must miss");
    assert!(err.is_token_not_found(), "{err}");
}

#[test]
fn delete_is_idempotent() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    store
        .store(ADDRESS, &Credential::new("t", Model::Gs316Ep))
        .expect("store");
    store.delete(ADDRESS).expect("first delete");
    store.delete(ADDRESS).expect("second delete");

    let err = store.get(ADDRESS).expect_err("deleted");
    assert!(err.is_token_not_found(), "{err}");
}

#[test]
fn empty_file_is_stale_not_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    store
        .store(ADDRESS, &Credential::new("t", Model::Gs305Ep))
        .expect("store");
    fs::write(token_file(dir.path()), "").expect("truncate");

    let err = store.get(ADDRESS).expect_err("stale");
    assert!(matches!(err, Error::StaleToken { .. }), "{err}");
}

#[test]
fn file_without_separator_is_corrupt() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    store
        .store(ADDRESS, &Credential::new("t", Model::Gs305Ep))
        .expect("store");
    fs::write(token_file(dir.path()), "justonetoken").expect("rewrite");

    let err = store.get(ADDRESS).expect_err("corrupt");
    assert!(matches!(err, Error::CorruptToken { .. }), "{err}");
}

#[test]
fn unknown_model_in_file_is_a_model_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    store
        .store(ADDRESS, &Credential::new("t", Model::Gs305Ep))
        .expect("store");
    fs::write(token_file(dir.path()), "GS108E:sometoken").expect("rewrite");

    let err = store.get(ADDRESS).expect_err("unsupported");
    match err {
        Error::UnsupportedModel { model } => assert_eq!(model, "GS108E"),
        other => panic!("expected UnsupportedModel, got {other}"),
    }
}

#[test]
fn extra_trailing_segments_are_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    store
        .store(ADDRESS, &Credential::new("t", Model::Gs305Ep))
        .expect("store");
    fs::write(token_file(dir.path()), "GS305EP:abc123:legacy:junk").expect("rewrite");

    let loaded = store.get(ADDRESS).expect("get");
    assert_eq!(loaded, Credential::new("abc123", Model::Gs305Ep));
}

#[test]
fn overwriting_replaces_the_credential() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    store
        .store(ADDRESS, &Credential::new("old", Model::Gs305Ep))
        .expect("store old");
    store
        .store(ADDRESS, &Credential::new("new", Model::Gs305Epp))
        .expect("store new");

    assert_eq!(
        store.get(ADDRESS).expect("get"),
        Credential::new("new", Model::Gs305Epp)
    );
}

#[test]
fn addresses_map_to_independent_files() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = FileTokenStore::new(dir.path());

    store
        .store("10.0.0.1", &Credential::new("a", Model::Gs305Ep))
        .expect("store a");
    store
        .store("10.0.0.2", &Credential::new("b", Model::Gs316Ep))
        .expect("store b");

    assert_eq!(
        store.get("10.0.0.1").expect("a"),
        Credential::new("a", Model::Gs305Ep)
    );
    assert_eq!(
        store.get("10.0.0.2").expect("b"),
        Credential::new("b", Model::Gs316Ep)
    );

    store.delete("10.0.0.1").expect("delete a");
    assert!(store.get("10.0.0.1").is_err());
    assert!(store.get("10.0.0.2").is_ok());
}

#[test]
fn memory_store_round_trip_and_idempotent_delete() {
    let store = MemoryTokenStore::new();

    let credential = Credential::new("tok", Model::Gs316Epp);
    store.store(ADDRESS, &credential).expect("store");
    assert_eq!(store.get(ADDRESS).expect("get"), credential);

    store.delete(ADDRESS).expect("first delete");
    store.delete(ADDRESS).expect("second delete");
    let err = store.get(ADDRESS).expect_err("miss");
    assert!(err.is_token_not_found(), "{err}");
}
