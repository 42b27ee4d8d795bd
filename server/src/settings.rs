//! The cached-settings side file.
//!
//! A tiny JSON file the extension popup and CLI share; only honored while
//! its timestamp is within five seconds of now, so a stale file never
//! resurrects old state.

use std::io;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

/// Staleness bound for reads.
pub const FRESHNESS_MS: i64 = 5_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_web_pilot_enabled: Option<bool>,
    /// Epoch milliseconds at write time.
    pub timestamp: i64,
    pub session_id: String,
}

pub fn settings_path(state_dir: &Path) -> PathBuf {
    state_dir.join("cached-settings.json")
}

/// Load the cached settings iff the file exists, parses, and is fresh.
pub fn load_if_fresh(state_dir: &Path, now_ms: i64) -> Option<CachedSettings> {
    let content = std::fs::read_to_string(settings_path(state_dir)).ok()?;
    let settings: CachedSettings = serde_json::from_str(&content).ok()?;
    if (now_ms - settings.timestamp).abs() > FRESHNESS_MS {
        return None;
    }
    Some(settings)
}

/// Persist the pilot flag with a fresh timestamp and session id.
pub fn store(state_dir: &Path, pilot_enabled: bool) -> io::Result<CachedSettings> {
    let settings = CachedSettings {
        ai_web_pilot_enabled: Some(pilot_enabled),
        timestamp: chrono::Utc::now().timestamp_millis(),
        session_id: uuid::Uuid::new_v4().to_string(),
    };
    let rendered = serde_json::to_vec(&settings).map_err(io::Error::other)?;
    gasoline_paths::atomic_write(&settings_path(state_dir), &rendered)?;
    Ok(settings)
}

#[cfg(test)]
#[path = "settings.test.rs"]
mod tests;
