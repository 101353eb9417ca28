//! JSONL audit log of handled utterances.
//!
//! Every utterance is logged as a single line in
//! `{config_dir}/audit/YYYY-MM-DD.jsonl`, including the exact text of any
//! generated script that was executed. Best-effort: never panics or fails the
//! caller.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::error::DispatchResult;

#[derive(Serialize)]
struct UtteranceAuditEntry<'a> {
    ts: u64,
    utterance: &'a str,
    command: Option<&'a str>,
    ok: bool,
    message: &'a str,
    duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    script: Option<&'a str>,
}

/// What the pipeline knows about one handled utterance.
pub struct UtteranceRecord<'a> {
    pub utterance: &'a str,
    pub command: Option<&'a str>,
    pub result: &'a DispatchResult,
    pub script: Option<&'a str>,
    pub duration: Duration,
}

/// Appends utterance records under a config directory.
#[derive(Debug, Clone)]
pub struct AuditLog {
    config_dir: PathBuf,
}

impl AuditLog {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    pub fn record(&self, record: &UtteranceRecord<'_>) {
        log_utterance(&self.config_dir, record);
    }
}

/// Log a single utterance to today's JSONL audit file.
///
/// This is best-effort: failures are logged at debug level and otherwise
/// ignored so they never affect the caller's control flow.
pub fn log_utterance(config_dir: &Path, record: &UtteranceRecord<'_>) {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    let message = record.result.text();
    let entry = UtteranceAuditEntry {
        ts: now,
        utterance: record.utterance,
        command: record.command,
        ok: record.result.is_success(),
        message: &message,
        duration_ms: u64::try_from(record.duration.as_millis()).unwrap_or(u64::MAX),
        script: record.script,
    };

    let dir = crate::paths::audit_dir(config_dir);
    let _ = fs::create_dir_all(&dir);
    let path = crate::paths::audit_file(config_dir, &date_from_epoch(now));

    let written = serde_json::to_string(&entry)
        .map_err(|e| e.to_string())
        .and_then(|json| {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .and_then(|mut file| writeln!(file, "{json}"))
                .map_err(|e| e.to_string())
        });
    if let Err(e) = written {
        tracing::debug!(path = %path.display(), error = %e, "Audit write skipped");
    }
}

/// Format epoch seconds as `YYYY-MM-DD` without external deps.
#[allow(clippy::unreadable_literal, clippy::cast_possible_wrap, clippy::cast_sign_loss)]
fn date_from_epoch(epoch_secs: u64) -> String {
    // Civil date from day count (Howard Hinnant's algorithm)
    let days = (epoch_secs / 86400) as i64;
    let z = days + 719468;
    let era = (if z >= 0 { z } else { z - 146096 }) / 146097;
    let doe = (z - era * 146097) as u64; // day of era [0, 146096]
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = (yoe as i64) + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    let y = if m <= 2 { y + 1 } else { y };

    format!("{y:04}-{m:02}-{d:02}")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::error::DispatchFailure;

    #[test]
    fn test_date_from_epoch() {
        // 2025-02-24 00:00:00 UTC
        assert_eq!(date_from_epoch(1_740_355_200), "2025-02-24");
        assert_eq!(date_from_epoch(0), "1970-01-01");
        assert_eq!(date_from_epoch(946_684_800), "2000-01-01");
        // Last second of the day
        assert_eq!(date_from_epoch(1_740_355_200 + 86399), "2025-02-24");
    }

    #[test]
    fn records_append_as_json_lines() {
        let dir = std::env::temp_dir().join(format!("scene-voice-audit-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        let log = AuditLog::new(&dir);

        let ok = DispatchResult::success("Added a cube to the scene.");
        log.record(&UtteranceRecord {
            utterance: "add a cube",
            command: Some("add_cube"),
            result: &ok,
            script: None,
            duration: Duration::from_millis(12),
        });
        let failed = DispatchResult::failure(DispatchFailure::ScriptExecutionError {
            detail: "boom".into(),
        });
        log.record(&UtteranceRecord {
            utterance: "build a castle",
            command: Some("execute_generated_script"),
            result: &failed,
            script: Some("bpy.ops.mesh.primitive_cube_add()"),
            duration: Duration::from_millis(900),
        });

        let files: Vec<_> = fs::read_dir(crate::paths::audit_dir(&dir)).unwrap().collect();
        assert_eq!(files.len(), 1);
        let text = fs::read_to_string(files[0].as_ref().unwrap().path()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["command"], "add_cube");
        assert_eq!(lines[0]["ok"], true);
        assert!(lines[0].get("script").is_none());
        assert_eq!(lines[1]["ok"], false);
        assert_eq!(lines[1]["script"], "bpy.ops.mesh.primitive_cube_add()");
        assert_eq!(lines[1]["duration_ms"], 900);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn unwritable_dir_does_not_panic() {
        let ok = DispatchResult::success("fine");
        log_utterance(
            Path::new("/proc/scene-voice-nonexistent"),
            &UtteranceRecord {
                utterance: "x",
                command: None,
                result: &ok,
                script: None,
                duration: Duration::ZERO,
            },
        );
    }
}
