//! Speech capture and transcription capability.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use serde_json::Value;

use crate::error::TranscriptionError;
use crate::settings::SpeechConfig;

/// Blocking, single-shot capture of one utterance as text.
pub trait Transcriber: Send + Sync {
    fn transcribe(&self) -> Result<String, TranscriptionError>;
}

/// Records a clip with an external recorder and sends it to an
/// OpenAI-compatible `/audio/transcriptions` endpoint.
pub struct WhisperHttpTranscriber {
    client: reqwest::blocking::Client,
    config: SpeechConfig,
    api_key: Option<String>,
}

impl WhisperHttpTranscriber {
    pub fn new(config: SpeechConfig, api_key: Option<String>) -> Result<Self, TranscriptionError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| map_transport_error(&e))?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn record(&self) -> Result<Vec<u8>, TranscriptionError> {
        let clip = &self.config.clip_path;
        if let Some(parent) = clip.parent() {
            std::fs::create_dir_all(parent).map_err(|e| unavailable(&e))?;
        }
        // A recorder that writes nothing must not resend the previous clip.
        match std::fs::remove_file(clip) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(unavailable(&e)),
            _ => {}
        }
        let argv = recorder_argv(&self.config.record_command, clip);
        let (program, args) = argv.split_first().ok_or_else(|| {
            TranscriptionError::ServiceUnavailable {
                message: "No recorder command configured".to_string(),
            }
        })?;

        tracing::debug!(program = %program, "Recording utterance");
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|e| TranscriptionError::ServiceUnavailable {
                message: format!("Failed to run recorder '{program}': {e}"),
            })?;
        if !output.status.success() {
            return Err(TranscriptionError::ServiceUnavailable {
                message: format!(
                    "Recorder exited with {}: {}",
                    output.status,
                    String::from_utf8_lossy(&output.stderr).trim()
                ),
            });
        }
        std::fs::read(clip).map_err(|e| unavailable(&e))
    }

    fn upload(&self, audio: Vec<u8>) -> Result<String, TranscriptionError> {
        let url = format!(
            "{}/audio/transcriptions",
            self.config.endpoint.trim_end_matches('/')
        );
        let file = reqwest::blocking::multipart::Part::bytes(audio)
            .file_name(crate::paths::CLIP_FILE)
            .mime_str("audio/wav")
            .map_err(|e| map_transport_error(&e))?;
        let form = reqwest::blocking::multipart::Form::new()
            .text("model", self.config.model.clone())
            .part("file", file);

        let mut request = self.client.post(&url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }
        let response = request.send().map_err(|e| map_transport_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(TranscriptionError::ServiceUnavailable {
                message: format!("HTTP {status}"),
            });
        }
        let json: Value = response.json().map_err(|e| map_transport_error(&e))?;
        let text = json.get("text").and_then(Value::as_str).unwrap_or_default();
        accept_transcript(text)
    }
}

impl Transcriber for WhisperHttpTranscriber {
    fn transcribe(&self) -> Result<String, TranscriptionError> {
        let audio = self.record()?;
        let text = self.upload(audio)?;
        tracing::info!(text = %text, "Transcribed utterance");
        Ok(text)
    }
}

/// Substitute the clip path into the recorder argv.
pub fn recorder_argv(template: &[String], clip: &Path) -> Vec<String> {
    let clip = clip.display().to_string();
    template.iter().map(|arg| arg.replace("{clip}", &clip)).collect()
}

/// Blank transcripts mean the recognizer heard nothing it could use.
pub fn accept_transcript(text: &str) -> Result<String, TranscriptionError> {
    let text = text.trim();
    if text.is_empty() {
        Err(TranscriptionError::Unintelligible)
    } else {
        Ok(text.to_string())
    }
}

fn unavailable(e: &std::io::Error) -> TranscriptionError {
    TranscriptionError::ServiceUnavailable {
        message: e.to_string(),
    }
}

fn map_transport_error(e: &reqwest::Error) -> TranscriptionError {
    if e.is_timeout() {
        TranscriptionError::Timeout
    } else {
        TranscriptionError::ServiceUnavailable {
            message: e.to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn clip_placeholder_is_substituted() {
        let template = SpeechConfig::default().record_command;
        let argv = recorder_argv(&template, &PathBuf::from("/tmp/x.wav"));
        assert_eq!(argv.first().map(String::as_str), Some("arecord"));
        assert_eq!(argv.last().map(String::as_str), Some("/tmp/x.wav"));
    }

    #[test]
    fn blank_transcripts_are_unintelligible() {
        assert_eq!(accept_transcript("  \n"), Err(TranscriptionError::Unintelligible));
        assert_eq!(accept_transcript(" add a cube ").unwrap(), "add a cube");
    }

    #[test]
    fn missing_recorder_is_service_unavailable() {
        let config = SpeechConfig {
            record_command: vec!["scene-voice-no-such-recorder".into()],
            clip_path: std::env::temp_dir().join("scene_voice_test_clip/u.wav"),
            ..SpeechConfig::default()
        };
        let transcriber = WhisperHttpTranscriber::new(config, None).unwrap();
        assert!(matches!(
            transcriber.transcribe(),
            Err(TranscriptionError::ServiceUnavailable { .. })
        ));
    }

    #[test]
    fn silent_recorder_does_not_reuse_the_previous_clip() {
        let clip = std::env::temp_dir()
            .join(format!("scene_voice_stale_clip_{}", std::process::id()))
            .join("u.wav");
        std::fs::create_dir_all(clip.parent().unwrap()).unwrap();
        std::fs::write(&clip, b"previous utterance").unwrap();

        let config = SpeechConfig {
            record_command: vec!["true".into()],
            clip_path: clip.clone(),
            ..SpeechConfig::default()
        };
        let transcriber = WhisperHttpTranscriber::new(config, None).unwrap();
        assert!(matches!(
            transcriber.record(),
            Err(TranscriptionError::ServiceUnavailable { .. })
        ));
        assert!(!clip.exists());

        let _ = std::fs::remove_dir_all(clip.parent().unwrap());
    }
}
