//! Best-effort user-facing notification of dispatch results.

use parking_lot::Mutex;

/// Receives the text of every result. Fire-and-forget: implementations swallow
/// their own failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Fallback sink when the host exposes no message surface.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str) {
        tracing::info!(target: "scene_voice::notify", "{message}");
    }
}

/// Keeps every message in memory. Used by the CLI's JSON mode and by tests.
#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().push(message.to_string());
    }
}

impl<T: Notifier + ?Sized> Notifier for std::sync::Arc<T> {
    fn notify(&self, message: &str) {
        (**self).notify(message);
    }
}
