use pretty_assertions::assert_eq;

use super::FRESHNESS_MS;
use super::load_if_fresh;
use super::store;

#[test]
fn store_then_fresh_load_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let written = store(dir.path(), true).expect("store");
    assert_eq!(written.ai_web_pilot_enabled, Some(true));

    let loaded = load_if_fresh(dir.path(), written.timestamp + 100).expect("fresh");
    assert_eq!(loaded, written);
}

#[test]
fn stale_file_is_ignored() {
    let dir = tempfile::tempdir().expect("tempdir");
    let written = store(dir.path(), false).expect("store");

    assert!(load_if_fresh(dir.path(), written.timestamp + FRESHNESS_MS + 1).is_none());
    // A clock that went backwards past the bound is equally stale.
    assert!(load_if_fresh(dir.path(), written.timestamp - FRESHNESS_MS - 1).is_none());
}

#[test]
fn missing_or_garbage_file_is_none() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(load_if_fresh(dir.path(), 0).is_none());

    std::fs::write(super::settings_path(dir.path()), "not json").expect("write");
    assert!(load_if_fresh(dir.path(), 0).is_none());
}
