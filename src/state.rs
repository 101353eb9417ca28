use std::sync::Arc;

use parking_lot::Mutex;

use crate::llm::{CompletionOptions, LanguageModel};
use crate::notify::{LogNotifier, Notifier};
use crate::scene::Scene;
use crate::settings::AppSettings;

// ── Application context ────────────────────────────────────────────

/// Process-wide capability handles, acquired once and shared by every
/// utterance. Passed explicitly into the dispatcher and handlers.
pub struct AppContext {
    pub scene: Arc<dyn Scene>,
    pub model: Arc<dyn LanguageModel>,
    /// `None` routes notifications to the log.
    pub notifier: Option<Box<dyn Notifier>>,
    pub policy: ScriptPolicy,
    pub options: ModelOptions,
    /// Script text run by the current utterance, taken by the pipeline for auditing.
    executed_script: Mutex<Option<String>>,
}

/// Gate for running model-generated scripts in the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScriptPolicy {
    pub allow_script_execution: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelOptions {
    pub intent: CompletionOptions,
    pub script: CompletionOptions,
}

impl Default for ModelOptions {
    fn default() -> Self {
        Self {
            intent: CompletionOptions { temperature: 0.2 },
            script: CompletionOptions { temperature: 0.2 },
        }
    }
}

impl AppContext {
    pub fn new(scene: Arc<dyn Scene>, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            scene,
            model,
            notifier: None,
            policy: ScriptPolicy::default(),
            options: ModelOptions::default(),
            executed_script: Mutex::new(None),
        }
    }

    pub fn with_notifier(mut self, notifier: Box<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_policy(mut self, policy: ScriptPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Copy policy and sampling options from settings.
    pub fn with_settings(mut self, settings: &AppSettings) -> Self {
        self.policy.allow_script_execution = settings.allow_script_execution;
        self.options = ModelOptions {
            intent: CompletionOptions {
                temperature: settings.model.temperature,
            },
            script: CompletionOptions {
                temperature: settings.model.script_temperature,
            },
        };
        self
    }

    /// Deliver a result text through the notifier, or the log when there is none.
    pub fn notify(&self, message: &str) {
        match &self.notifier {
            Some(notifier) => notifier.notify(message),
            None => LogNotifier.notify(message),
        }
    }

    pub(crate) fn record_script(&self, script: &str) {
        *self.executed_script.lock() = Some(script.to_string());
    }

    pub fn take_executed_script(&self) -> Option<String> {
        self.executed_script.lock().take()
    }
}
