use std::fmt;

use serde::Serialize;

// ── Capability errors ───────────────────────────────────────────

/// Failure of the speech capture / transcription capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum TranscriptionError {
    Unintelligible,
    ServiceUnavailable { message: String },
    Timeout,
}

impl fmt::Display for TranscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TranscriptionError::Unintelligible => write!(f, "Could not understand the command"),
            TranscriptionError::ServiceUnavailable { message } => {
                write!(f, "Speech recognition unavailable: {message}")
            }
            TranscriptionError::Timeout => write!(f, "Speech recognition timed out"),
        }
    }
}

impl std::error::Error for TranscriptionError {}

/// Failure of the language-model backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum ModelError {
    Unavailable { message: String },
    Timeout,
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Unavailable { message } => write!(f, "Language model unavailable: {message}"),
            ModelError::Timeout => write!(f, "Language model timed out"),
        }
    }
}

impl std::error::Error for ModelError {}

/// Failure raised by a host scene operation. Never leaves the dispatcher as-is:
/// it is always wrapped into [`DispatchFailure::OperationError`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum SceneError {
    NotFound { what: String },
    InvalidNodeType { node_type: String },
    Host { message: String },
}

impl fmt::Display for SceneError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SceneError::NotFound { what } => write!(f, "{what} not found"),
            SceneError::InvalidNodeType { node_type } => {
                write!(f, "Invalid shader node type: {node_type}")
            }
            SceneError::Host { message } => write!(f, "Host error: {message}"),
        }
    }
}

impl std::error::Error for SceneError {}

// ── Pipeline errors ─────────────────────────────────────────────

/// Failure to extract an intent or a script from the model's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum ParseFailure {
    NoJsonFound,
    MalformedJson { text: String, message: String },
    MissingCommand,
    EmptyScript,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseFailure::NoJsonFound => write!(f, "No JSON object found in model response"),
            ParseFailure::MalformedJson { text, message } => {
                write!(f, "Malformed JSON in model response ({message}): {text}")
            }
            ParseFailure::MissingCommand => write!(f, "Model response has no \"command\" field"),
            ParseFailure::EmptyScript => write!(f, "Model returned an empty script"),
        }
    }
}

impl std::error::Error for ParseFailure {}

/// Failure to validate, type, or execute an interpreted command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum DispatchFailure {
    UnknownCommand { command: String },
    MissingParameter { name: String },
    InvalidParameterValue { name: String, reason: String },
    OperationError { detail: String },
    ScriptExecutionError { detail: String },
    ScriptExecutionDisabled,
}

impl fmt::Display for DispatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchFailure::UnknownCommand { command } => write!(f, "Unknown command: {command}"),
            DispatchFailure::MissingParameter { name } => {
                write!(f, "Missing required parameter: {name}")
            }
            DispatchFailure::InvalidParameterValue { name, reason } => {
                write!(f, "Invalid value for parameter '{name}': {reason}")
            }
            DispatchFailure::OperationError { detail } => write!(f, "Operation failed: {detail}"),
            DispatchFailure::ScriptExecutionError { detail } => {
                write!(f, "Error executing generated script: {detail}")
            }
            DispatchFailure::ScriptExecutionDisabled => write!(
                f,
                "Generated script execution is disabled (enable allow_script_execution)"
            ),
        }
    }
}

impl std::error::Error for DispatchFailure {}

impl From<SceneError> for DispatchFailure {
    fn from(e: SceneError) -> Self {
        DispatchFailure::OperationError {
            detail: e.to_string(),
        }
    }
}

// ── Outcome ─────────────────────────────────────────────────────

/// Pipeline stage a failure originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Stage {
    Transcription,
    Model,
    Interpretation,
    Dispatch,
    ScriptExecution,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Transcription => "transcription",
            Stage::Model => "model",
            Stage::Interpretation => "interpretation",
            Stage::Dispatch => "dispatch",
            Stage::ScriptExecution => "script execution",
        };
        f.write_str(name)
    }
}

/// Every way a single utterance can fail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "error")]
pub enum FailureReason {
    Transcription(TranscriptionError),
    Model(ModelError),
    Parse(ParseFailure),
    Dispatch(DispatchFailure),
}

impl FailureReason {
    /// Stage the reason belongs to when no more specific stage is known.
    pub fn default_stage(&self) -> Stage {
        match self {
            FailureReason::Transcription(_) => Stage::Transcription,
            FailureReason::Model(_) => Stage::Model,
            FailureReason::Parse(_) => Stage::Interpretation,
            FailureReason::Dispatch(
                DispatchFailure::ScriptExecutionError { .. }
                | DispatchFailure::ScriptExecutionDisabled,
            ) => Stage::ScriptExecution,
            FailureReason::Dispatch(_) => Stage::Dispatch,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::Transcription(e) => e.fmt(f),
            FailureReason::Model(e) => e.fmt(f),
            FailureReason::Parse(e) => e.fmt(f),
            FailureReason::Dispatch(e) => e.fmt(f),
        }
    }
}

impl std::error::Error for FailureReason {}

impl From<TranscriptionError> for FailureReason {
    fn from(e: TranscriptionError) -> Self {
        FailureReason::Transcription(e)
    }
}

impl From<ModelError> for FailureReason {
    fn from(e: ModelError) -> Self {
        FailureReason::Model(e)
    }
}

impl From<ParseFailure> for FailureReason {
    fn from(e: ParseFailure) -> Self {
        FailureReason::Parse(e)
    }
}

impl From<DispatchFailure> for FailureReason {
    fn from(e: DispatchFailure) -> Self {
        FailureReason::Dispatch(e)
    }
}

impl From<SceneError> for FailureReason {
    fn from(e: SceneError) -> Self {
        FailureReason::Dispatch(e.into())
    }
}

/// Uniform outcome of one utterance, whichever stage it ended in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status")]
pub enum DispatchResult {
    Success { message: String },
    Failure { reason: FailureReason, stage: Stage },
}

impl DispatchResult {
    pub fn success(message: impl Into<String>) -> Self {
        DispatchResult::Success {
            message: message.into(),
        }
    }

    pub fn failure(reason: impl Into<FailureReason>) -> Self {
        let reason = reason.into();
        let stage = reason.default_stage();
        DispatchResult::Failure { reason, stage }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, DispatchResult::Success { .. })
    }

    /// The user-facing text of this result, identical on every channel.
    pub fn text(&self) -> String {
        match self {
            DispatchResult::Success { message } => message.clone(),
            DispatchResult::Failure { reason, stage } => format!("Failed ({stage}): {reason}"),
        }
    }
}

// ── Settings ────────────────────────────────────────────────────

#[derive(Debug)]
pub enum SettingsError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(e) => write!(f, "I/O error: {e}"),
            SettingsError::Json(e) => write!(f, "JSON error: {e}"),
        }
    }
}

impl std::error::Error for SettingsError {}

impl From<std::io::Error> for SettingsError {
    fn from(e: std::io::Error) -> Self {
        SettingsError::Io(e)
    }
}

impl From<serde_json::Error> for SettingsError {
    fn from(e: serde_json::Error) -> Self {
        SettingsError::Json(e)
    }
}
