//! Extract structured results from raw model replies.
//!
//! Models wrap their payload in commentary, markdown and reasoning, so both
//! modes locate the payload instead of expecting clean output.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseFailure;

const FENCE: &str = "```";
const SCRIPT_LANGUAGES: &[&str] = &["python", "python3", "py"];

/// Command identifier plus untyped parameters, as the model produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedIntent {
    pub command: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl ParsedIntent {
    pub fn new(command: impl Into<String>, parameters: Map<String, Value>) -> Self {
        Self {
            command: command.into(),
            parameters,
        }
    }
}

/// Structured mode: decode the span from the first `{` to the last `}`.
pub fn interpret_intent(raw: &str) -> Result<ParsedIntent, ParseFailure> {
    let (Some(start), Some(end)) = (raw.find('{'), raw.rfind('}')) else {
        return Err(ParseFailure::NoJsonFound);
    };
    let candidate = raw.get(start..=end).ok_or(ParseFailure::NoJsonFound)?;

    let malformed = |message: String| ParseFailure::MalformedJson {
        text: raw.to_string(),
        message,
    };
    let mut object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => object,
        Ok(other) => return Err(malformed(format!("expected an object, got {other}"))),
        Err(e) => return Err(malformed(e.to_string())),
    };

    let command = match object.get("command") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => return Err(ParseFailure::MissingCommand),
    };
    let parameters = match object.remove("parameters") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(map)) => map,
        Some(other) => {
            return Err(malformed(format!(
                "\"parameters\" must be an object, got {other}"
            )))
        }
    };
    Ok(ParsedIntent {
        command,
        parameters,
    })
}

/// Script mode: strip a leading fence (and its language tag) and a trailing
/// fence. A reply that opens with commentary yields its first fenced block;
/// a reply with no fence is taken whole.
pub fn interpret_script(raw: &str) -> Result<String, ParseFailure> {
    let trimmed = raw.trim();
    let body = if let Some(after_open) = trimmed.strip_prefix(FENCE) {
        up_to_fence(strip_language_tag(after_open))
    } else {
        match trimmed.matches(FENCE).count() {
            0 => trimmed,
            1 if trimmed.ends_with(FENCE) => trimmed.strip_suffix(FENCE).unwrap_or(trimmed),
            _ => trimmed
                .split_once(FENCE)
                .map_or(trimmed, |(_, after_open)| up_to_fence(strip_language_tag(after_open))),
        }
    };
    let script = body.trim();
    if script.is_empty() {
        Err(ParseFailure::EmptyScript)
    } else {
        Ok(script.to_string())
    }
}

/// Text before the closing fence, or all of it when the block is unterminated.
fn up_to_fence(block: &str) -> &str {
    block.split_once(FENCE).map_or(block, |(inside, _)| inside)
}

/// Drop an opener's language tag: a whole tag line (` ```python\n `) or,
/// for a one-line block (` ```python print(1)``` `), a known language word.
fn strip_language_tag(after_open: &str) -> &str {
    let (first_line, rest) = after_open.split_once('\n').unwrap_or((after_open, ""));
    let is_tag = first_line
        .trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '_' | '.'));
    if is_tag {
        return rest;
    }
    match after_open.split_once(char::is_whitespace) {
        Some((word, body)) if SCRIPT_LANGUAGES.contains(&word.to_ascii_lowercase().as_str()) => {
            body
        }
        _ => after_open,
    }
}
