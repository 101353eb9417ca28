//! Centralized path definitions for configuration and audit files.
//!
//! Functions take the config directory as `&Path` so tests can point them at a
//! scratch directory.

use std::path::{Path, PathBuf};

// ── Application identity ─────────────────────────────────────────

pub const APP_ID: &str = "scene-voice";

// ── Leaf names ───────────────────────────────────────────────────

pub const SETTINGS_FILE: &str = "settings.json";
pub const AUDIT_DIR: &str = "audit";
pub const CLIP_FILE: &str = "utterance.wav";

// ── Config-dir functions ─────────────────────────────────────────

/// `<os config dir>/scene-voice`, or `./.scene-voice` when the OS reports none.
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join(APP_ID))
        .unwrap_or_else(|| PathBuf::from(format!(".{APP_ID}")))
}

pub fn settings_path(config_dir: &Path) -> PathBuf {
    config_dir.join(SETTINGS_FILE)
}

pub fn audit_dir(config_dir: &Path) -> PathBuf {
    config_dir.join(AUDIT_DIR)
}

/// One JSONL file per UTC day, named `YYYY-MM-DD.jsonl`.
pub fn audit_file(config_dir: &Path, date: &str) -> PathBuf {
    audit_dir(config_dir).join(format!("{date}.jsonl"))
}

/// Where the recorder writes the captured utterance.
pub fn default_clip_path() -> PathBuf {
    std::env::temp_dir().join(APP_ID).join(CLIP_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_files_live_under_config_dir() {
        let dir = Path::new("/cfg");
        assert_eq!(
            audit_file(dir, "2025-01-02"),
            PathBuf::from("/cfg/audit/2025-01-02.jsonl")
        );
        assert_eq!(settings_path(dir), PathBuf::from("/cfg/settings.json"));
    }
}
