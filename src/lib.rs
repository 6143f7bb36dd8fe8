//! Blocking client for a local Ollama inference server.
//!
//! The [`ollama`] module holds the library surface (generation, embeddings,
//! model listing and tool-call schema inference). The remaining modules back
//! the `ollama-runner` and `ogen` binaries.

/// CLI subcommand implementations.
pub mod commands;
/// Profile file loading and setting resolution.
pub mod config;
/// Tracing subscriber setup for the binaries.
pub mod logging;
/// Ollama HTTP API client and tool schema helpers.
pub mod ollama;

pub use ollama::{
    ChatMessage, ClientConfig, FailureKind, OllamaClient, OllamaError, Signature, ToolSchema,
    infer_tool, list_models,
};

/// Long version string shared by both binaries.
pub const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("OLLAMA_RUNNER_GIT_SHA"),
    "\nbuilt: ",
    env!("OLLAMA_RUNNER_BUILD_TS")
);
