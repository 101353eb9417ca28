//! Language-model capability: builds HTTP requests and normalizes responses
//! for Ollama and OpenAI-compatible completion APIs.

use std::time::Duration;

use serde_json::Value;

use crate::error::ModelError;
use crate::settings::{ModelConfig, ModelProvider};

/// Per-call sampling options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f64,
}

/// Blocking, single-shot text completion. No streaming.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, ModelError>;
}

/// Resolved provider details ready for making an API call.
pub struct ResolvedProvider {
    pub url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub provider: ModelProvider,
}

impl ResolvedProvider {
    pub fn from_config(config: &ModelConfig) -> Self {
        let base = config.base_url.trim_end_matches('/');
        let url = match config.provider {
            ModelProvider::Ollama => format!("{base}/api/chat"),
            ModelProvider::OpenAiCompatible => format!("{base}/chat/completions"),
        };
        Self {
            url,
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            model: config.model.clone(),
            provider: config.provider,
        }
    }
}

/// Build the HTTP request for the resolved provider.
pub fn build_request(
    client: &reqwest::blocking::Client,
    provider: &ResolvedProvider,
    prompt: &str,
    options: &CompletionOptions,
) -> reqwest::blocking::RequestBuilder {
    let messages = serde_json::json!([{ "role": "user", "content": prompt }]);
    let body = match provider.provider {
        ModelProvider::Ollama => serde_json::json!({
            "model": provider.model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": options.temperature },
        }),
        ModelProvider::OpenAiCompatible => serde_json::json!({
            "model": provider.model,
            "messages": messages,
            "temperature": options.temperature,
        }),
    };

    let request = client
        .post(&provider.url)
        .header("content-type", "application/json")
        .json(&body);
    match &provider.api_key {
        Some(key) => request.header("Authorization", format!("Bearer {key}")),
        None => request,
    }
}

/// Pull the completion text out of the provider's response JSON.
pub fn parse_response(provider: ModelProvider, json: &Value) -> Result<String, ModelError> {
    let content = match provider {
        ModelProvider::Ollama => json
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str),
        ModelProvider::OpenAiCompatible => json
            .get("choices")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str),
    };
    content
        .map(strip_reasoning)
        .ok_or_else(|| ModelError::Unavailable {
            message: "Response has no completion text".to_string(),
        })
}

/// Remove `<think>...</think>` blocks emitted by reasoning models.
pub fn strip_reasoning(text: &str) -> String {
    if !text.contains("<think>") {
        // Some chat templates emit the opening tag themselves, so only the
        // closing tag reaches us.
        if let Some((_, after)) = text.rsplit_once("</think>") {
            return after.trim().to_string();
        }
        return text.trim().to_string();
    }

    let mut out = String::new();
    let mut rest = text;
    while let Some((before, after)) = rest.split_once("<think>") {
        out.push_str(before);
        // A truncated block keeps its tail so a trailing payload survives.
        rest = after.split_once("</think>").map_or(after, |(_, tail)| tail);
    }
    out.push_str(rest);
    out.trim().to_string()
}

fn map_transport_error(e: &reqwest::Error) -> ModelError {
    if e.is_timeout() {
        ModelError::Timeout
    } else {
        ModelError::Unavailable {
            message: e.to_string(),
        }
    }
}

// ── HTTP binding ────────────────────────────────────────────────

pub struct HttpModelClient {
    client: reqwest::blocking::Client,
    provider: ResolvedProvider,
}

impl HttpModelClient {
    pub fn new(config: &ModelConfig) -> Result<Self, ModelError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| map_transport_error(&e))?;
        Ok(Self {
            client,
            provider: ResolvedProvider::from_config(config),
        })
    }
}

impl LanguageModel for HttpModelClient {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, ModelError> {
        tracing::debug!(
            url = %self.provider.url,
            model = %self.provider.model,
            prompt_len = prompt.len(),
            "Requesting completion"
        );
        let response = build_request(&self.client, &self.provider, prompt, options)
            .send()
            .map_err(|e| map_transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ModelError::Unavailable {
                message: format!("HTTP {status}: {}", body.trim()),
            });
        }

        let json: Value = response.json().map_err(|e| map_transport_error(&e))?;
        let text = parse_response(self.provider.provider, &json)?;
        tracing::debug!(response_len = text.len(), "Completion received");
        Ok(text)
    }
}

// ── Test double ─────────────────────────────────────────────────

/// Returns canned completions in order and records every prompt.
#[cfg(test)]
pub(crate) struct ScriptedModel {
    replies: parking_lot::Mutex<std::collections::VecDeque<Result<String, ModelError>>>,
    prompts: parking_lot::Mutex<Vec<(String, f64)>>,
}

#[cfg(test)]
impl ScriptedModel {
    pub(crate) fn new(replies: impl IntoIterator<Item = Result<String, ModelError>>) -> Self {
        Self {
            replies: parking_lot::Mutex::new(replies.into_iter().collect()),
            prompts: parking_lot::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok((*r).to_string())))
    }

    pub(crate) fn calls(&self) -> usize {
        self.prompts.lock().len()
    }

    pub(crate) fn prompts(&self) -> Vec<(String, f64)> {
        self.prompts.lock().clone()
    }
}

#[cfg(test)]
impl LanguageModel for ScriptedModel {
    fn complete(&self, prompt: &str, options: &CompletionOptions) -> Result<String, ModelError> {
        self.prompts
            .lock()
            .push((prompt.to_string(), options.temperature));
        self.replies.lock().pop_front().unwrap_or(Err(ModelError::Unavailable {
            message: "no scripted reply left".to_string(),
        }))
    }
}
