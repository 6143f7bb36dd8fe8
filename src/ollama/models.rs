use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::Value;
use tracing::debug;

use crate::ollama::client::{log_failure, normalize_base_url, send_json};
use crate::ollama::error::OllamaError;

const TAGS_PATH: &str = "/api/tags";

/// Lists the names of the models installed on the server at `base_url`, in
/// the order the server reports them.
pub fn list_models(base_url: &str) -> Result<Vec<String>, OllamaError> {
    fetch_model_names(&Client::new(), &normalize_base_url(base_url), None)
}

pub(crate) fn fetch_model_names(
    client: &Client,
    base_url: &str,
    timeout: Option<Duration>,
) -> Result<Vec<String>, OllamaError> {
    debug!(base_url, "listing models");
    let mut request = client.get(format!("{base_url}{TAGS_PATH}"));
    if let Some(timeout) = timeout {
        request = request.timeout(timeout);
    }
    let body = send_json(TAGS_PATH, request)?;
    model_names(&body)
}

fn model_names(body: &Value) -> Result<Vec<String>, OllamaError> {
    let models = body
        .get("models")
        .and_then(Value::as_array)
        .ok_or_else(|| log_failure(OllamaError::missing_field(TAGS_PATH, "models")))?;

    models
        .iter()
        .map(|model| {
            model
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| log_failure(OllamaError::missing_field(TAGS_PATH, "name")))
        })
        .collect()
}
