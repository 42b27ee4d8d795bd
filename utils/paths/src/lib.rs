//! Path-safety helpers, URL path extraction, atomic file writes, and the
//! version-tagged process title.

use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

/// True iff a caller-supplied file path is acceptable: under `/tmp`, under
/// the OS temp dir, or relative with no `..` segment.
pub fn is_path_allowed(raw: &str) -> bool {
    if raw.is_empty() {
        return false;
    }
    let path = Path::new(raw);
    if path.is_absolute() {
        let tmp = std::env::temp_dir();
        return path.starts_with("/tmp") || path.starts_with(&tmp);
    }
    !path
        .components()
        .any(|component| matches!(component, Component::ParentDir))
}

/// True iff `candidate` stays inside `root` after lexical normalization.
/// `..` segments are resolved without touching the filesystem, so a
/// symlink-free containment check works for not-yet-created files.
pub fn is_contained_in(root: &Path, candidate: &Path) -> bool {
    let mut normalized = PathBuf::new();
    for component in candidate.components() {
        match component {
            Component::ParentDir => {
                if !normalized.pop() {
                    return false;
                }
            }
            Component::CurDir => {}
            other => normalized.push(other),
        }
    }
    normalized.starts_with(root)
}

/// Reduce an arbitrary string to a safe filename: `[A-Za-z0-9._-]` kept,
/// everything else mapped to `_`, length capped at 128, never empty.
pub fn sanitize_filename(raw: &str) -> String {
    let mut out: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    out.truncate(128);
    // A dotfile-only or empty result is replaced outright.
    if out.trim_matches(|c| c == '.' || c == '_').is_empty() {
        return "file".to_string();
    }
    out
}

/// Extract the path portion of a URL-ish string.
///
/// Host-only or empty input yields `/`; absolute paths pass through
/// unchanged; full URLs are stripped to their path.
pub fn extract_url_path(input: &str) -> String {
    if input.is_empty() {
        return "/".to_string();
    }
    if input.starts_with('/') {
        return input.to_string();
    }
    let after_scheme = match input.find("://") {
        Some(idx) => &input[idx + 3..],
        None => input,
    };
    match after_scheme.find('/') {
        Some(idx) => {
            let path = &after_scheme[idx..];
            // Strip query and fragment.
            let end = path
                .find(|c: char| c == '?' || c == '#')
                .unwrap_or(path.len());
            path[..end].to_string()
        }
        None => "/".to_string(),
    }
}

/// Write `bytes` to `path` atomically: write a sibling temp file, then
/// rename over the target.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(parent)?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file");
    let pid = std::process::id();
    let tmp = parent.join(format!(".{file_name}.tmp.{pid}"));
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

/// Compact version tag: digits of each dot segment concatenated, so
/// `0.7.6` becomes `076`.
pub fn compact_version_tag(version: &str) -> String {
    version
        .split('.')
        .flat_map(|segment| segment.chars().take_while(char::is_ascii_digit))
        .collect()
}

/// Set the kernel-visible process title (`prctl` on Linux, no-op elsewhere).
/// Titles longer than the 15-byte kernel limit are truncated.
pub fn set_process_title(title: &str) {
    #[cfg(target_os = "linux")]
    {
        let mut bytes: Vec<u8> = title.bytes().take(15).collect();
        bytes.push(0);
        // SAFETY: bytes is NUL-terminated and outlives the call.
        unsafe {
            libc::prctl(libc::PR_SET_NAME, bytes.as_ptr() as libc::c_ulong, 0, 0, 0);
        }
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = title;
    }
}

#[cfg(test)]
#[path = "lib.test.rs"]
mod tests;
