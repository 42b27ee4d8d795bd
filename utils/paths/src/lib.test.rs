use std::path::Path;

use pretty_assertions::assert_eq;

use super::atomic_write;
use super::compact_version_tag;
use super::extract_url_path;
use super::is_contained_in;
use super::is_path_allowed;
use super::sanitize_filename;

#[test]
fn tmp_and_relative_paths_are_allowed() {
    assert!(is_path_allowed("/tmp/report.har"));
    assert!(is_path_allowed("out/report.har"));
    assert!(is_path_allowed("report.har"));
}

#[test]
fn escapes_and_empty_are_rejected() {
    assert!(!is_path_allowed(""));
    assert!(!is_path_allowed("../etc/passwd"));
    assert!(!is_path_allowed("out/../../etc/passwd"));
    assert!(!is_path_allowed("/etc/passwd"));
}

#[test]
fn containment_resolves_dotdot_lexically() {
    let root = Path::new("/var/state/screenshots");
    assert!(is_contained_in(root, Path::new("/var/state/screenshots/a.png")));
    assert!(is_contained_in(
        root,
        Path::new("/var/state/screenshots/sub/../b.png")
    ));
    assert!(!is_contained_in(
        root,
        Path::new("/var/state/screenshots/../../etc/passwd")
    ));
}

#[test]
fn sanitize_keeps_safe_chars_only() {
    assert_eq!(sanitize_filename("shot 2024/05.png"), "shot_2024_05.png");
    assert_eq!(sanitize_filename("..."), "file");
    assert_eq!(sanitize_filename(""), "file");
    assert!(sanitize_filename(&"x".repeat(300)).len() <= 128);
}

#[test]
fn url_path_extraction_boundaries() {
    assert_eq!(extract_url_path(""), "/");
    assert_eq!(extract_url_path("example.com"), "/");
    assert_eq!(extract_url_path("http://example.com"), "/");
    assert_eq!(extract_url_path("http://example.com/a/b?q=1"), "/a/b");
    assert_eq!(extract_url_path("/already/a/path"), "/already/a/path");
}

#[test]
fn atomic_write_creates_parents_and_replaces() {
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("nested/state.json");

    atomic_write(&target, b"{\"v\":1}").expect("first write");
    atomic_write(&target, b"{\"v\":2}").expect("second write");

    let content = std::fs::read_to_string(&target).expect("readable");
    assert_eq!(content, "{\"v\":2}");
    // No temp litter left behind.
    let entries: Vec<_> = std::fs::read_dir(target.parent().expect("parent"))
        .expect("readdir")
        .collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn version_tag_concatenates_digits() {
    assert_eq!(compact_version_tag("0.7.6"), "076");
    assert_eq!(compact_version_tag("1.12.3"), "1123");
    assert_eq!(compact_version_tag("2.0.0-rc1"), "200");
}
