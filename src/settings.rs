use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;

/// Environment variable that supplies the model API key.
pub const API_KEY_ENV: &str = "SCENE_VOICE_MODEL_API_KEY";

// ── Language model ──────────────────────────────────────────────

/// Wire protocol of the completion backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ModelProvider {
    /// Local Ollama server, `POST {base_url}/api/chat`.
    Ollama,
    /// Any server speaking `POST {base_url}/chat/completions`.
    OpenAiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct ModelConfig {
    pub provider: ModelProvider,
    pub base_url: String,
    pub model: String,
    /// Sampling temperature for intent interpretation.
    pub temperature: f64,
    /// Sampling temperature for full-script generation.
    pub script_temperature: f64,
    pub timeout_secs: u64,
    /// Only ever read from the environment; never written to settings.json.
    #[serde(skip)]
    #[schemars(skip)]
    pub api_key: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::Ollama,
            base_url: "http://localhost:11434".to_string(),
            model: "deepseek-r1:1.5b".to_string(),
            temperature: 0.2,
            script_temperature: 0.2,
            timeout_secs: 120,
            api_key: None,
        }
    }
}

// ── Speech ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct SpeechConfig {
    /// Base URL of an OpenAI-compatible transcription server.
    pub endpoint: String,
    pub model: String,
    /// Recorder argv. `{clip}` is replaced with `clip_path`.
    pub record_command: Vec<String>,
    pub clip_path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:8000/v1".to_string(),
            model: "whisper-1".to_string(),
            record_command: [
                "arecord", "-q", "-d", "5", "-f", "S16_LE", "-r", "16000", "-c", "1", "{clip}",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            clip_path: crate::paths::default_clip_path(),
            timeout_secs: 30,
        }
    }
}

// ── Host bridge ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct HostConfig {
    /// Listener running inside the 3D application.
    pub bridge_url: String,
    pub timeout_secs: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bridge_url: "http://127.0.0.1:8765".to_string(),
            timeout_secs: 30,
        }
    }
}

// ── App settings ────────────────────────────────────────────────

/// Application settings stored in the OS config directory.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppSettings {
    pub version: u32,
    pub model: ModelConfig,
    pub speech: SpeechConfig,
    pub host: HostConfig,
    /// Run model-generated scripts in the host. The scripts execute with full
    /// host privileges and are not sandboxed or reviewed.
    pub allow_script_execution: bool,
    /// Append every utterance to the daily audit log.
    pub audit: bool,
}

const SETTINGS_VERSION: u32 = 1;

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            model: ModelConfig::default(),
            speech: SpeechConfig::default(),
            host: HostConfig::default(),
            allow_script_execution: false,
            audit: true,
        }
    }
}

impl AppSettings {
    /// Pull secrets from the environment. Never persisted.
    pub fn apply_env(&mut self) {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                self.model.api_key = Some(key);
            }
        }
    }
}

/// JSON Schema of `settings.json`.
pub fn settings_schema() -> serde_json::Value {
    let schema = schemars::schema_for!(AppSettings);
    serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({}))
}

/// Load settings. A missing file yields `Ok(None)`.
pub fn load_settings(config_dir: &Path) -> Result<Option<AppSettings>, SettingsError> {
    let path = crate::paths::settings_path(config_dir);
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(&path)?;
    let mut settings: AppSettings = serde_json::from_str(&data)?;
    settings.apply_env();
    Ok(Some(settings))
}

/// Load settings, falling back to defaults when the file is missing or unreadable.
pub fn load_or_default(config_dir: &Path) -> AppSettings {
    match load_settings(config_dir) {
        Ok(Some(settings)) => settings,
        Ok(None) => {
            let mut settings = AppSettings::default();
            settings.apply_env();
            settings
        }
        Err(e) => {
            tracing::warn!(
                path = %crate::paths::settings_path(config_dir).display(),
                error = %e,
                "Ignoring unreadable settings file, using defaults"
            );
            let mut settings = AppSettings::default();
            settings.apply_env();
            settings
        }
    }
}

/// Save settings (write to a temp sibling, then rename over the target).
pub fn save_settings(config_dir: &Path, settings: &AppSettings) -> Result<(), SettingsError> {
    fs::create_dir_all(config_dir)?;
    let path = crate::paths::settings_path(config_dir);
    let json = serde_json::to_string_pretty(settings)?;

    let tmp_path = path.with_extension("json.tmp");
    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    drop(file);
    fs::rename(&tmp_path, &path)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = scratch("scene_voice_test_settings");

        let mut settings = AppSettings::default();
        settings.model.model = "llama3".into();
        settings.allow_script_execution = true;
        save_settings(&dir, &settings).unwrap();

        let loaded = load_settings(&dir).unwrap().expect("should load");
        assert_eq!(loaded.model.model, "llama3");
        assert!(loaded.allow_script_execution);
        assert_eq!(loaded.model.provider, ModelProvider::Ollama);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_api_key_never_written() {
        let dir = scratch("scene_voice_test_api_key");

        let mut settings = AppSettings::default();
        settings.model.api_key = Some("sk-secret".into());
        save_settings(&dir, &settings).unwrap();

        let raw = fs::read_to_string(crate::paths::settings_path(&dir)).unwrap();
        assert!(!raw.contains("sk-secret"));
        assert!(!raw.contains("api_key"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = scratch("scene_voice_test_partial");
        fs::write(
            crate::paths::settings_path(&dir),
            r#"{"model": {"model": "mistral"}, "audit": false}"#,
        )
        .unwrap();

        let loaded = load_settings(&dir).unwrap().expect("should load");
        assert_eq!(loaded.model.model, "mistral");
        assert!((loaded.model.temperature - 0.2).abs() < f64::EPSILON);
        assert!(!loaded.audit);
        assert!(!loaded.allow_script_execution);
        assert_eq!(loaded.host.bridge_url, "http://127.0.0.1:8765");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_load_missing_returns_none() {
        let dir = std::env::temp_dir().join("scene_voice_test_no_settings");
        let _ = fs::remove_dir_all(&dir);
        assert!(load_settings(&dir).unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = scratch("scene_voice_test_corrupt");
        fs::write(crate::paths::settings_path(&dir), "{ not json").unwrap();

        assert!(matches!(load_settings(&dir), Err(SettingsError::Json(_))));
        let settings = load_or_default(&dir);
        assert_eq!(settings.model.model, "deepseek-r1:1.5b");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_schema_describes_settings() {
        let schema = settings_schema();
        let text = schema.to_string();
        assert!(text.contains("allow_script_execution"));
        assert!(!text.contains("api_key"));
    }
}
