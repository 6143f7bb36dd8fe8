use std::error::Error as StdError;

use reqwest::StatusCode;
use thiserror::Error;

/// Internal classification of a failed operation.
///
/// Callers always receive the same [`OllamaError`] type; the kind is there for
/// diagnosis and logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Connection, DNS or timeout failure, including a timeout while the
    /// body is still being read.
    Transport,
    /// The server answered with a non-success status code.
    HttpStatus(u16),
    /// The response body was not the JSON shape we expected.
    Decode,
    /// The response JSON lacked the named field.
    MissingField(&'static str),
}

/// The single error type returned by every Ollama operation.
#[derive(Debug, Error)]
#[error("Ollama operation failed: {message}")]
pub struct OllamaError {
    kind: FailureKind,
    endpoint: String,
    message: String,
    #[source]
    source: Option<reqwest::Error>,
}

impl OllamaError {
    pub(crate) fn transport(endpoint: &str, source: reqwest::Error) -> Self {
        Self {
            kind: FailureKind::Transport,
            endpoint: endpoint.to_string(),
            message: cause_chain(&source),
            source: Some(source),
        }
    }

    pub(crate) fn status(endpoint: &str, status: StatusCode, body: &str) -> Self {
        let body = body.trim();
        let message = if body.is_empty() {
            format!("HTTP status {status}")
        } else {
            format!("HTTP status {status}: {body}")
        };
        Self {
            kind: FailureKind::HttpStatus(status.as_u16()),
            endpoint: endpoint.to_string(),
            message,
            source: None,
        }
    }

    pub(crate) fn decode(endpoint: &str, source: reqwest::Error) -> Self {
        Self {
            kind: FailureKind::Decode,
            endpoint: endpoint.to_string(),
            message: cause_chain(&source),
            source: Some(source),
        }
    }

    pub(crate) fn invalid_value(endpoint: &str, message: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::Decode,
            endpoint: endpoint.to_string(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn missing_field(endpoint: &str, field: &'static str) -> Self {
        Self {
            kind: FailureKind::MissingField(field),
            endpoint: endpoint.to_string(),
            message: format!("response is missing field '{field}'"),
            source: None,
        }
    }

    /// Stringified underlying cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    /// API path the failing request targeted, e.g. `/api/generate`.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Joins an error and its `source()` chain with `": "`, skipping levels whose
/// text is already part of the message.
pub(crate) fn cause_chain(err: &(dyn StdError + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        current = cause.source();
    }
    message
}
