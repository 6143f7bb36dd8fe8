use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::ollama::error::OllamaError;
use crate::ollama::models;
use crate::ollama::tools::{Signature, ToolSchema, infer_tool};

/// Address of a stock local Ollama install.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

const GENERATE_PATH: &str = "/api/generate";
const EMBEDDINGS_PATH: &str = "/api/embeddings";
const CHAT_PATH: &str = "/api/chat";

/// Connection settings for [`OllamaClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Covers model load plus full, non-streamed generation.
    pub generate_timeout: Duration,
    pub embeddings_timeout: Duration,
    pub chat_timeout: Duration,
    /// `None` keeps the transport's default timeout.
    pub list_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            generate_timeout: Duration::from_secs(1000),
            embeddings_timeout: Duration::from_secs(300),
            chat_timeout: Duration::from_secs(1000),
            list_timeout: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }
}

pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Chat message passed through verbatim to `/api/chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Body of a non-streaming `/api/generate` call.
#[derive(Debug, Clone, Serialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
    /// Base64-encoded images for multimodal models.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<String>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: false,
            images: Vec::new(),
        }
    }

    pub fn with_images(mut self, images: Vec<String>) -> Self {
        self.images = images;
        self
    }
}

/// Body of an `/api/embeddings` call.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddingsRequest {
    pub model: String,
    pub prompt: String,
}

/// Body of a tool decision `/api/chat` call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<ToolSchema>,
    pub stream: bool,
}

/// Blocking Ollama API client bound to one base URL.
///
/// The client holds no per-call state, so a shared reference can be used from
/// several threads at once.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: ClientConfig,
    client: Client,
}

impl OllamaClient {
    /// Creates a client with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(base_url))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_http_client(config, Client::new())
    }

    /// Uses a caller-built HTTP client, e.g. one with proxies disabled.
    pub fn with_http_client(mut config: ClientConfig, client: Client) -> Self {
        config.base_url = normalize_base_url(&config.base_url);
        Self { config, client }
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Full URL for an API path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }

    /// Generates a full completion for `prompt` and returns the response text.
    pub fn generate(&self, model: &str, prompt: &str) -> Result<String, OllamaError> {
        self.send_generate(&GenerateRequest::new(model, prompt))
    }

    /// Like [`generate`](Self::generate), attaching base64-encoded images.
    pub fn generate_with_images(
        &self,
        model: &str,
        prompt: &str,
        images: Vec<String>,
    ) -> Result<String, OllamaError> {
        self.send_generate(&GenerateRequest::new(model, prompt).with_images(images))
    }

    fn send_generate(&self, payload: &GenerateRequest) -> Result<String, OllamaError> {
        debug!(
            model = %payload.model,
            images = payload.images.len(),
            "sending generate request"
        );
        let request = self
            .client
            .post(self.endpoint(GENERATE_PATH))
            .timeout(self.config.generate_timeout)
            .json(payload);
        let body = send_json(GENERATE_PATH, request)?;
        body.get("response")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| log_failure(OllamaError::missing_field(GENERATE_PATH, "response")))
    }

    /// Embeds `prompt` and returns the dense vector.
    pub fn get_embeddings(&self, model: &str, prompt: &str) -> Result<Vec<f64>, OllamaError> {
        debug!(model, "sending embeddings request");
        let payload = EmbeddingsRequest {
            model: model.to_string(),
            prompt: prompt.to_string(),
        };
        let request = self
            .client
            .post(self.endpoint(EMBEDDINGS_PATH))
            .timeout(self.config.embeddings_timeout)
            .json(&payload);
        let body = send_json(EMBEDDINGS_PATH, request)?;

        let embedding = body
            .get("embedding")
            .and_then(Value::as_array)
            .ok_or_else(|| log_failure(OllamaError::missing_field(EMBEDDINGS_PATH, "embedding")))?;
        let mut vector = Vec::with_capacity(embedding.len());
        for value in embedding {
            let number = value.as_f64().ok_or_else(|| {
                log_failure(OllamaError::invalid_value(
                    EMBEDDINGS_PATH,
                    format!("embedding contains a non-numeric value: {value}"),
                ))
            })?;
            vector.push(number);
        }
        Ok(vector)
    }

    /// Builds the `/api/chat` body offering `tools` to the model.
    pub fn decision_request(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[Signature],
    ) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            tools: tools.iter().map(infer_tool).collect(),
            stream: false,
        }
    }

    /// Asks the model which of `tools` to call, if any.
    ///
    /// Returns the decoded response body untouched; nothing is executed.
    /// [`parse_tool_calls`](crate::ollama::tools::parse_tool_calls) extracts
    /// the chosen calls.
    pub fn decide_tool(
        &self,
        model: &str,
        messages: &[ChatMessage],
        tools: &[Signature],
    ) -> Result<Value, OllamaError> {
        let payload = self.decision_request(model, messages, tools);
        debug!(
            model,
            messages = payload.messages.len(),
            tools = payload.tools.len(),
            "sending tool decision request"
        );
        let request = self
            .client
            .post(self.endpoint(CHAT_PATH))
            .timeout(self.config.chat_timeout)
            .json(&payload);
        send_json(CHAT_PATH, request)
    }

    /// Names of the models installed on the server.
    pub fn list_models(&self) -> Result<Vec<String>, OllamaError> {
        models::fetch_model_names(&self.client, &self.config.base_url, self.config.list_timeout)
    }

    /// Whether `name` is among the installed models.
    pub fn is_model_available(&self, name: &str) -> Result<bool, OllamaError> {
        Ok(self.list_models()?.iter().any(|model| model == name))
    }
}

/// Sends a request and decodes a successful JSON body.
pub(crate) fn send_json(path: &str, request: RequestBuilder) -> Result<Value, OllamaError> {
    let response = request
        .send()
        .map_err(|source| log_failure(OllamaError::transport(path, source)))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().unwrap_or_default();
        return Err(log_failure(OllamaError::status(path, status, &body)));
    }

    response.json::<Value>().map_err(|source| {
        // A timeout while reading the body is reported by reqwest as a decode error.
        let err = if source.is_timeout() || !source.is_decode() {
            OllamaError::transport(path, source)
        } else {
            OllamaError::decode(path, source)
        };
        log_failure(err)
    })
}

pub(crate) fn log_failure(err: OllamaError) -> OllamaError {
    debug!(
        endpoint = err.endpoint(),
        kind = ?err.kind(),
        "request failed: {}",
        err.message()
    );
    err
}
