use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::prompt::GenerationPayload;

/// Maximum generation attempts per request.
pub const MAX_RETRIES: u32 = 3;

/// Linear backoff unit: attempt N waits N * 2000 ms before attempt N + 1.
const RETRY_BACKOFF_UNIT_MS: u64 = 2_000;

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const OPENAI_BASE_URL: &str = "https://api.openai.com";

/// Per-attempt failure classification. Only `Overloaded` is retried.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("provider overloaded: {0}")]
    Overloaded(String),

    #[error("provider request failed: {0}")]
    Fatal(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

/// Supported provider API shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Single-prompt generation endpoint (`models/{model}:generateContent`).
    Gemini,
    /// Chat-completion endpoint (`/v1/chat/completions`).
    OpenAi,
}

impl ProviderKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "gemini" => Some(ProviderKind::Gemini),
            "openai" => Some(ProviderKind::OpenAi),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenAi => "openai",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini-2.5-flash",
            ProviderKind::OpenAi => "gpt-4o-mini",
        }
    }
}

/// One generation attempt against a provider. The retry policy lives in
/// [`GenerationClient`], not in implementations.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, payload: &GenerationPayload) -> Result<String, ProviderError>;
}

/// HTTP backend covering both provider shapes behind one implementation,
/// selected by [`ProviderKind`].
pub struct HttpBackend {
    http: reqwest::Client,
    kind: ProviderKind,
    api_key: String,
    model: String,
    base_url: String,
}

impl HttpBackend {
    pub fn new(http: reqwest::Client, kind: ProviderKind, api_key: String, model: String) -> Self {
        let base_url = match kind {
            ProviderKind::Gemini => GEMINI_BASE_URL.to_string(),
            ProviderKind::OpenAi => OPENAI_BASE_URL.to_string(),
        };
        Self {
            http,
            kind,
            api_key,
            model,
            base_url,
        }
    }

    /// Point the backend at a different host. Used by tests.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_parts(&self, payload: &GenerationPayload) -> (String, Value) {
        match self.kind {
            ProviderKind::Gemini => (
                format!(
                    "{}/v1/models/{}:generateContent?key={}",
                    self.base_url, self.model, self.api_key
                ),
                json!({
                    "contents": [{ "parts": [{ "text": payload.prompt }] }],
                    "generationConfig": {
                        "temperature": payload.temperature,
                        "maxOutputTokens": payload.max_output_tokens,
                    },
                }),
            ),
            ProviderKind::OpenAi => (
                format!("{}/v1/chat/completions", self.base_url),
                json!({
                    "model": self.model,
                    "messages": [{ "role": "user", "content": payload.prompt }],
                    "temperature": payload.temperature,
                    "max_tokens": payload.max_output_tokens,
                }),
            ),
        }
    }

    fn extract_text(kind: ProviderKind, envelope: &Value) -> Option<String> {
        let pointer = match kind {
            ProviderKind::Gemini => "/candidates/0/content/parts/0/text",
            ProviderKind::OpenAi => "/choices/0/message/content",
        };
        envelope
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

fn truncate_detail(detail: &str) -> String {
    const MAX: usize = 200;
    if detail.len() <= MAX {
        detail.to_string()
    } else {
        let mut end = MAX;
        while !detail.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &detail[..end])
    }
}

#[async_trait]
impl GenerationBackend for HttpBackend {
    fn name(&self) -> &'static str {
        self.kind.name()
    }

    async fn generate(&self, payload: &GenerationPayload) -> Result<String, ProviderError> {
        let (url, body) = self.request_parts(payload);

        let mut request = self.http.post(&url).json(&body);
        if self.kind == ProviderKind::OpenAi {
            request = request.bearer_auth(&self.api_key);
        }

        // The Gemini URL carries the API key, so transport errors are
        // reported without the URL.
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Overloaded(format!("{} request timed out", self.kind.name()))
            } else {
                ProviderError::Fatal(format!("{} request failed: {}", self.kind.name(), e.without_url()))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let message = format!(
                "{} returned {}: {}",
                self.kind.name(),
                status,
                truncate_detail(&detail)
            );
            return Err(match status.as_u16() {
                429 | 503 => ProviderError::Overloaded(message),
                _ => ProviderError::Fatal(message),
            });
        }

        let envelope: Value = response.json().await.map_err(|e| {
            ProviderError::Malformed(format!(
                "{} response was not JSON: {}",
                self.kind.name(),
                e.without_url()
            ))
        })?;

        Self::extract_text(self.kind, &envelope).ok_or_else(|| {
            ProviderError::Malformed(format!(
                "{} response envelope had no generated text",
                self.kind.name()
            ))
        })
    }
}

/// Retry wrapper over a backend: up to [`MAX_RETRIES`] attempts with linear
/// backoff, retrying only transient overload. Exhaustion surfaces the last
/// overload error to the caller.
#[derive(Clone)]
pub struct GenerationClient {
    backend: Arc<dyn GenerationBackend>,
}

impl GenerationClient {
    pub fn new(backend: Arc<dyn GenerationBackend>) -> Self {
        Self { backend }
    }

    pub async fn generate(&self, payload: &GenerationPayload) -> Result<String, ProviderError> {
        let mut last_overload = String::new();

        for attempt in 1..=MAX_RETRIES {
            match self.backend.generate(payload).await {
                Ok(text) => {
                    tracing::info!(
                        target: "playbook_proxy::provider",
                        provider = self.backend.name(),
                        attempt,
                        chars = text.len(),
                        "generation succeeded"
                    );
                    return Ok(text);
                }
                Err(ProviderError::Overloaded(message)) => {
                    tracing::warn!(
                        target: "playbook_proxy::provider",
                        provider = self.backend.name(),
                        attempt,
                        max_retries = MAX_RETRIES,
                        error = %message,
                        "transient provider failure"
                    );
                    last_overload = message;
                    if attempt < MAX_RETRIES {
                        let delay = Duration::from_millis(u64::from(attempt) * RETRY_BACKOFF_UNIT_MS);
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(err) => return Err(err),
            }
        }

        Err(ProviderError::Overloaded(last_overload))
    }
}
