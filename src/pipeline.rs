//! One utterance end to end: transcribe → prompt → model → interpret → dispatch.
//!
//! Every path returns a [`DispatchResult`] and notifies its text exactly once.
//! Utterances do not overlap and nothing is retried.

use std::time::Instant;

use crate::audit::{AuditLog, UtteranceRecord};
use crate::dispatcher::dispatch;
use crate::error::{DispatchResult, FailureReason, TranscriptionError};
use crate::interpret::{interpret_intent, ParsedIntent};
use crate::prompt::build_intent_prompt;
use crate::registry::registry;
use crate::speech::{accept_transcript, Transcriber};
use crate::state::AppContext;

pub struct Pipeline {
    ctx: AppContext,
    transcriber: Option<Box<dyn Transcriber>>,
    audit: Option<AuditLog>,
}

impl Pipeline {
    pub fn new(ctx: AppContext) -> Self {
        Self {
            ctx,
            transcriber: None,
            audit: None,
        }
    }

    pub fn with_transcriber(mut self, transcriber: Box<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn context(&self) -> &AppContext {
        &self.ctx
    }

    /// Capture one spoken utterance and handle it.
    pub fn handle_speech(&self) -> DispatchResult {
        let started = Instant::now();
        let transcribed = match &self.transcriber {
            Some(transcriber) => transcriber.transcribe(),
            None => Err(TranscriptionError::ServiceUnavailable {
                message: "no speech capture configured".to_string(),
            }),
        };
        match transcribed {
            Ok(text) => self.handle_text(&text),
            Err(e) => {
                let result = self.fail(e);
                self.audit("", None, &result, started);
                result
            }
        }
    }

    /// Interpret a typed or transcribed utterance and dispatch it.
    pub fn handle_text(&self, text: &str) -> DispatchResult {
        let started = Instant::now();
        // Drop anything a previous utterance left behind.
        let _ = self.ctx.take_executed_script();

        let (command, result) = match accept_transcript(text) {
            Ok(text) => self.interpret_and_dispatch(&text),
            Err(e) => (None, self.fail(e)),
        };
        self.audit(text, command.as_deref(), &result, started);
        result
    }

    /// Dispatch an already-structured intent, skipping the model.
    pub fn handle_intent(&self, intent: &ParsedIntent) -> DispatchResult {
        let started = Instant::now();
        let _ = self.ctx.take_executed_script();
        let result = dispatch(&self.ctx, intent);
        self.audit("", Some(&intent.command), &result, started);
        result
    }

    fn interpret_and_dispatch(&self, text: &str) -> (Option<String>, DispatchResult) {
        let prompt = build_intent_prompt(text, registry().values());
        tracing::debug!(prompt_len = prompt.len(), "Requesting intent");
        let raw = match self.ctx.model.complete(&prompt, &self.ctx.options.intent) {
            Ok(raw) => raw,
            Err(e) => return (None, self.fail(e)),
        };
        let intent = match interpret_intent(&raw) {
            Ok(intent) => intent,
            Err(e) => return (None, self.fail(e)),
        };
        tracing::debug!(command = %intent.command, params = intent.parameters.len(), "Intent parsed");
        let result = dispatch(&self.ctx, &intent);
        (Some(intent.command), result)
    }

    /// Failure before dispatch: report it the same way the dispatcher does.
    fn fail(&self, reason: impl Into<FailureReason>) -> DispatchResult {
        let result = DispatchResult::failure(reason);
        if let DispatchResult::Failure { reason, stage } = &result {
            tracing::warn!(%stage, error = %reason, "Utterance failed");
        }
        self.ctx.notify(&result.text());
        result
    }

    fn audit(&self, utterance: &str, command: Option<&str>, result: &DispatchResult, started: Instant) {
        let Some(audit) = &self.audit else {
            return;
        };
        let script = self.ctx.take_executed_script();
        audit.record(&UtteranceRecord {
            utterance,
            command,
            result,
            script: script.as_deref(),
            duration: started.elapsed(),
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::{DispatchFailure, ModelError, ParseFailure, Stage};
    use crate::llm::ScriptedModel;
    use crate::notify::RecordingNotifier;
    use crate::scene::MemoryScene;
    use crate::state::ScriptPolicy;

    struct FixedTranscriber(Result<String, TranscriptionError>);

    impl Transcriber for FixedTranscriber {
        fn transcribe(&self) -> Result<String, TranscriptionError> {
            self.0.clone()
        }
    }

    struct Harness {
        scene: Arc<MemoryScene>,
        model: Arc<ScriptedModel>,
        notifier: Arc<RecordingNotifier>,
        pipeline: Pipeline,
    }

    fn harness(scene: MemoryScene, model: ScriptedModel) -> Harness {
        let scene = Arc::new(scene);
        let model = Arc::new(model);
        let notifier = Arc::new(RecordingNotifier::new());
        let ctx = AppContext::new(scene.clone(), model.clone())
            .with_notifier(Box::new(notifier.clone()));
        Harness {
            scene,
            model,
            notifier,
            pipeline: Pipeline::new(ctx),
        }
    }

    #[test]
    fn text_flows_to_the_scene() {
        let h = harness(
            MemoryScene::new(),
            ScriptedModel::replying(&[
                "<think>the user wants a cube</think>Sure: {\"command\": \"add_cube\", \"parameters\": {}}",
            ]),
        );
        let result = h.pipeline.handle_text("add a cube");
        assert_eq!(result, DispatchResult::success("Added a cube to the scene."));
        assert_eq!(h.scene.count_ops("add_primitive"), 1);
        assert_eq!(h.notifier.messages(), vec![result.text()]);

        let prompts = h.model.prompts();
        let (prompt, temperature) = &prompts[0];
        assert!(prompt.contains("User request: add a cube"));
        assert!((temperature - 0.2).abs() < f64::EPSILON);
    }

    #[test]
    fn model_failure_is_notified_once() {
        let h = harness(
            MemoryScene::new(),
            ScriptedModel::new([Err(ModelError::Timeout)]),
        );
        let result = h.pipeline.handle_text("add a cube");
        assert_eq!(result, DispatchResult::failure(ModelError::Timeout));
        assert_eq!(h.notifier.messages().len(), 1);
        assert!(h.scene.log().is_empty());
    }

    #[test]
    fn prose_reply_is_an_interpretation_failure() {
        let h = harness(
            MemoryScene::new(),
            ScriptedModel::replying(&["I cannot help with that."]),
        );
        let result = h.pipeline.handle_text("sing a song");
        match &result {
            DispatchResult::Failure { reason, stage } => {
                assert_eq!(*reason, FailureReason::Parse(ParseFailure::NoJsonFound));
                assert_eq!(*stage, Stage::Interpretation);
            }
            DispatchResult::Success { .. } => panic!("expected failure"),
        }
        assert!(result.text().starts_with("Failed (interpretation)"));
    }

    #[test]
    fn loop_survives_a_failure() {
        let h = harness(
            MemoryScene::with_default_cube(),
            ScriptedModel::replying(&[
                "{\"command\": \"color_object\"}",
                "{\"command\": \"color_object\", \"parameters\": {\"color_value\": \"green\"}}",
            ]),
        );
        let first = h.pipeline.handle_text("paint it");
        assert_eq!(
            first,
            DispatchResult::failure(DispatchFailure::MissingParameter {
                name: "color_value".into()
            })
        );
        let second = h.pipeline.handle_text("paint it green");
        assert!(second.is_success(), "{second:?}");
        assert_eq!(h.notifier.messages().len(), 2);
    }

    #[test]
    fn blank_text_never_reaches_the_model() {
        let h = harness(MemoryScene::new(), ScriptedModel::replying(&[]));
        let result = h.pipeline.handle_text("   ");
        assert_eq!(result, DispatchResult::failure(TranscriptionError::Unintelligible));
        assert_eq!(h.model.calls(), 0);
    }

    #[test]
    fn speech_failures_stop_before_the_model() {
        let h = harness(MemoryScene::new(), ScriptedModel::replying(&[]));
        let pipeline = h
            .pipeline
            .with_transcriber(Box::new(FixedTranscriber(Err(TranscriptionError::Timeout))));
        let result = pipeline.handle_speech();
        assert_eq!(result, DispatchResult::failure(TranscriptionError::Timeout));
        assert_eq!(h.model.calls(), 0);
        assert_eq!(h.notifier.messages(), vec![result.text()]);
    }

    #[test]
    fn speech_without_capture_is_unavailable() {
        let h = harness(MemoryScene::new(), ScriptedModel::replying(&[]));
        let result = h.pipeline.handle_speech();
        assert!(matches!(
            result,
            DispatchResult::Failure {
                reason: FailureReason::Transcription(TranscriptionError::ServiceUnavailable { .. }),
                ..
            }
        ));
    }

    #[test]
    fn transcribed_speech_is_dispatched() {
        let h = harness(
            MemoryScene::with_default_cube(),
            ScriptedModel::replying(&["{\"command\": \"view_top\"}"]),
        );
        let pipeline = h
            .pipeline
            .with_transcriber(Box::new(FixedTranscriber(Ok("top view".into()))));
        assert_eq!(
            pipeline.handle_speech(),
            DispatchResult::success("Switched to top view")
        );
    }

    #[test]
    fn generated_script_is_audited() {
        let dir = std::env::temp_dir().join(format!("scene-voice-pipeline-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);

        let scene = Arc::new(MemoryScene::new());
        let model = Arc::new(ScriptedModel::replying(&[
            "{\"command\": \"execute_generated_script\", \"parameters\": {\"script_description\": \"ten cubes\"}}",
            "```python\nfor i in range(10):\n    bpy.ops.mesh.primitive_cube_add(location=(i, 0, 0))\n```",
        ]));
        let ctx = AppContext::new(scene.clone(), model.clone()).with_policy(ScriptPolicy {
            allow_script_execution: true,
        });
        let pipeline = Pipeline::new(ctx).with_audit(AuditLog::new(&dir));

        let result = pipeline.handle_text("make ten cubes in a row");
        assert!(result.is_success(), "{result:?}");
        assert_eq!(model.calls(), 2);
        assert_eq!(scene.snapshot().scripts.len(), 1);

        let audit_dir = crate::paths::audit_dir(&dir);
        let entry = std::fs::read_dir(&audit_dir).unwrap().next().unwrap().unwrap();
        let text = std::fs::read_to_string(entry.path()).unwrap();
        let line: serde_json::Value = serde_json::from_str(text.lines().next().unwrap()).unwrap();
        assert_eq!(line["command"], "execute_generated_script");
        assert_eq!(
            line["script"],
            "for i in range(10):\n    bpy.ops.mesh.primitive_cube_add(location=(i, 0, 0))"
        );
        assert!(pipeline.context().take_executed_script().is_none());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn structured_intent_skips_the_model() {
        let h = harness(MemoryScene::with_default_cube(), ScriptedModel::replying(&[]));
        let intent = interpret_intent(r#"{"command": "set_mode", "parameters": {"mode": "edit mode"}}"#).unwrap();
        assert_eq!(
            h.pipeline.handle_intent(&intent),
            DispatchResult::success("Switched to edit mode")
        );
        assert_eq!(h.model.calls(), 0);
    }
}
