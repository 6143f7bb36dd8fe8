//! Ollama HTTP API integration.
//!
//! Every operation is a single blocking request/response round trip against a
//! fixed base URL. Failures surface as one uniform [`OllamaError`].

/// Inference client: generate, embeddings and tool decisions.
pub mod client;
/// Uniform error type for all API operations.
pub mod error;
/// Image helpers for multimodal generate requests.
pub mod images;
/// Model listing (`/api/tags`).
pub mod models;
/// Tool schema inference and tool call parsing.
pub mod tools;

pub use client::{
    ChatMessage, ChatRequest, ClientConfig, DEFAULT_BASE_URL, EmbeddingsRequest, GenerateRequest,
    OllamaClient,
};
pub use error::{FailureKind, OllamaError};
pub use models::list_models;
pub use tools::{ParamSignature, ParamType, Signature, ToolCall, ToolSchema, infer_tool};
