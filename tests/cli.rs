use assert_cmd::Command;
use mockito::{Matcher, Server};
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn runner_cmd() -> Command {
    scrub(Command::new(assert_cmd::cargo::cargo_bin!("ollama-runner")))
}

fn ogen_cmd() -> Command {
    scrub(Command::new(assert_cmd::cargo::cargo_bin!("ogen")))
}

fn scrub(mut cmd: Command) -> Command {
    cmd.env_remove("OLLAMA_RUNNER_CONFIG")
        .env_remove("OLLAMA_RUNNER_BASE_URL")
        .env_remove("OLLAMA_RUNNER_MODEL")
        .env_remove("OLLAMA_RUNNER_EMBED_MODEL")
        .env_remove("OLLAMA_RUNNER_LOG")
        .env_remove("HTTP_PROXY")
        .env_remove("http_proxy")
        .env_remove("ALL_PROXY")
        .env_remove("all_proxy");
    cmd
}

fn unique_temp_path(label: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("ollama-runner-test-{label}-{nanos}"))
}

fn parse_stdout_json(output: &[u8]) -> Value {
    let text = String::from_utf8(output.to_vec()).expect("stdout should be utf-8");
    serde_json::from_str(text.trim()).expect("stdout should contain valid JSON")
}

const ADD_TOOLS: &str = r#"
[[tools]]
name = "add"
doc = "Add two numbers.\nReturns the sum."
params = [{ name = "a", type = "i64" }, { name = "b", type = "i64", default = "0" }]
"#;

#[test]
fn generate_dry_run_prints_request_without_server() {
    let assert = runner_cmd()
        .args([
            "generate",
            "--base-url",
            "http://127.0.0.1:9/",
            "--model",
            "llama3.1:8b",
            "--dry-run",
            "Explain Ollama in one line",
        ])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["dry_run"], Value::Bool(true));
    assert_eq!(body["endpoint"], "http://127.0.0.1:9/api/generate");
    assert_eq!(
        body["request"],
        json!({"model": "llama3.1:8b", "prompt": "Explain Ollama in one line", "stream": false})
    );
}

#[test]
fn prompt_is_read_from_stdin_when_argument_missing() {
    let assert = runner_cmd()
        .args(["generate", "--model", "m", "--dry-run"])
        .write_stdin("piped prompt\n")
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["request"]["prompt"], "piped prompt");
}

#[test]
fn missing_model_returns_explicit_error() {
    runner_cmd()
        .args(["generate", "hello"])
        .assert()
        .failure()
        .stderr(contains(
            "No model provided. Use --model or set OLLAMA_RUNNER_MODEL.",
        ));
}

#[test]
fn model_comes_from_env_when_flag_missing() {
    let assert = runner_cmd()
        .env("OLLAMA_RUNNER_MODEL", "env-model")
        .args(["generate", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["request"]["model"], "env-model");
}

#[test]
fn invalid_base_url_is_rejected() {
    runner_cmd()
        .args(["generate", "--base-url", "localhost:11434", "--model", "m", "x"])
        .assert()
        .failure()
        .stderr(contains("Invalid base URL 'localhost:11434'"));
}

#[test]
fn generate_prints_model_response() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/generate")
        .match_body(Matcher::PartialJson(json!({"model": "m", "prompt": "p"})))
        .with_status(200)
        .with_body(r#"{"response":"{\"reply\":\"hi\"}"}"#)
        .create();

    runner_cmd()
        .args(["generate", "--base-url", &server.url(), "--model", "m", "p"])
        .assert()
        .success()
        .stdout(contains(r#"{"reply":"hi"}"#));
    mock.assert();
}

#[test]
fn server_failure_exits_non_zero_with_uniform_message() {
    let mut server = Server::new();
    server
        .mock("POST", "/api/generate")
        .with_status(500)
        .with_body("model crashed")
        .create();

    ogen_cmd()
        .args(["--base-url", &server.url(), "--model", "m", "p"])
        .assert()
        .failure()
        .stderr(
            contains("Ollama operation failed")
                .and(contains("model crashed"))
                .and(contains("WARN").not()),
        );
}

#[test]
fn models_lists_names_in_order() {
    let mut server = Server::new();
    server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[{"name":"a"},{"name":"b"}]}"#)
        .create();

    runner_cmd()
        .args(["models", "--base-url", &server.url()])
        .assert()
        .success()
        .stdout("a\nb\n");

    let assert = runner_cmd()
        .args(["models", "--json", "--base-url", &server.url()])
        .assert()
        .success();
    assert_eq!(parse_stdout_json(&assert.get_output().stdout), json!(["a", "b"]));
}

#[test]
fn models_check_fails_for_missing_model() {
    let mut server = Server::new();
    server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(r#"{"models":[{"name":"a"}]}"#)
        .create();

    runner_cmd()
        .args(["models", "--check", "a", "--base-url", &server.url()])
        .assert()
        .success()
        .stdout(contains("a: available"));
    runner_cmd()
        .args(["models", "--check", "zzz", "--base-url", &server.url()])
        .assert()
        .failure()
        .stderr(contains("Model 'zzz' is not installed"));
}

#[test]
fn embed_prints_vector() {
    let mut server = Server::new();
    server
        .mock("POST", "/api/embeddings")
        .match_body(Matcher::Json(json!({"model": "granite-embedding:30m", "prompt": "hello"})))
        .with_status(200)
        .with_body(r#"{"embedding":[0.1,0.2]}"#)
        .create();

    runner_cmd()
        .args([
            "embed",
            "--base-url",
            &server.url(),
            "--model",
            "granite-embedding:30m",
            "hello",
        ])
        .assert()
        .success()
        .stdout("[0.1,0.2]\n");
}

#[test]
fn embed_uses_embed_model_env() {
    let assert = runner_cmd()
        .env("OLLAMA_RUNNER_MODEL", "chat-model")
        .env("OLLAMA_RUNNER_EMBED_MODEL", "embed-model")
        .args(["embed", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["request"], json!({"model": "embed-model", "prompt": "hello"}));
}

#[test]
fn decide_dry_run_shows_inferred_tool_schema() {
    let tools_path = unique_temp_path("tools");
    fs::write(&tools_path, ADD_TOOLS).expect("tools file should be writable");

    let assert = runner_cmd()
        .args(["decide", "--model", "m", "--dry-run", "--system", "Use tools."])
        .arg("--tools")
        .arg(&tools_path)
        .arg("What is 2 + 3?")
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    let request = &body["request"];
    assert_eq!(request["stream"], false);
    assert_eq!(request["messages"][0], json!({"role": "system", "content": "Use tools."}));
    assert_eq!(request["messages"][1]["role"], "user");
    let function = &request["tools"][0]["function"];
    assert_eq!(function["description"], "Add two numbers.");
    assert_eq!(function["parameters"]["required"], json!(["a"]));
    assert_eq!(
        function["parameters"]["properties"]["b"],
        json!({"type": "integer", "description": "b"})
    );
}

#[test]
fn decide_calls_prints_selected_tool() {
    let tools_path = unique_temp_path("tools-calls");
    fs::write(&tools_path, ADD_TOOLS).expect("tools file should be writable");

    let mut server = Server::new();
    server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(
            json!({
                "message": {
                    "role": "assistant",
                    "content": "",
                    "tool_calls": [{"function": {"name": "add", "arguments": {"a": 2, "b": 3}}}]
                },
                "done": true
            })
            .to_string(),
        )
        .create();

    runner_cmd()
        .args(["decide", "--calls", "--model", "m", "--base-url", &server.url()])
        .arg("--tools")
        .arg(&tools_path)
        .arg("What is 2 + 3?")
        .assert()
        .success()
        .stdout(contains(r#"add {"a":2,"b":3}"#));
}

#[test]
fn decide_rejects_empty_tools_file() {
    let tools_path = unique_temp_path("no-tools").with_extension("json");
    fs::write(&tools_path, r#"{"tools": []}"#).expect("tools file should be writable");

    runner_cmd()
        .args(["decide", "--model", "m", "--dry-run"])
        .arg("--tools")
        .arg(&tools_path)
        .arg("hi")
        .assert()
        .failure()
        .stderr(contains("does not declare any tools"));
}

#[test]
fn profile_supplies_base_url_and_model() {
    let config_path = unique_temp_path("config");
    fs::write(
        &config_path,
        "[profiles.local]\nbase_url = \"http://gpu-box:11434/\"\nmodel = \"llama3.1:8b\"\n",
    )
    .expect("config should be writable");

    let assert = runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .args(["generate", "--profile", "local", "--dry-run", "hello"])
        .assert()
        .success();

    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["endpoint"], "http://gpu-box:11434/api/generate");
    assert_eq!(body["request"]["model"], "llama3.1:8b");
}

#[test]
fn cli_flags_win_over_env_and_profile() {
    let config_path = unique_temp_path("precedence");
    fs::write(
        &config_path,
        "[profiles.p]\nbase_url = \"http://profile:1\"\nmodel = \"profile-model\"\n",
    )
    .expect("config should be writable");

    let assert = runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .env("OLLAMA_RUNNER_MODEL", "env-model")
        .env("OLLAMA_RUNNER_BASE_URL", "http://env:2")
        .args(["generate", "--profile", "p", "--dry-run", "hello"])
        .assert()
        .success();
    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["endpoint"], "http://env:2/api/generate");
    assert_eq!(body["request"]["model"], "env-model");

    let assert = runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .env("OLLAMA_RUNNER_MODEL", "env-model")
        .args([
            "generate",
            "--profile",
            "p",
            "--model",
            "cli-model",
            "--base-url",
            "http://cli:3",
            "--dry-run",
            "hello",
        ])
        .assert()
        .success();
    let body = parse_stdout_json(&assert.get_output().stdout);
    assert_eq!(body["endpoint"], "http://cli:3/api/generate");
    assert_eq!(body["request"]["model"], "cli-model");
}

#[test]
fn config_check_reports_ok() {
    let config_path = unique_temp_path("check-ok");
    fs::write(&config_path, "[profiles.local]\nmodel = \"m\"\ngenerate_timeout = 600\n")
        .expect("config should be writable");

    runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .args(["config", "check", "--profile", "local"])
        .assert()
        .success()
        .stdout(contains("config OK:"));
}

#[test]
fn config_check_rejects_zero_timeout() {
    let config_path = unique_temp_path("check-zero");
    fs::write(&config_path, "[profiles.local]\nchat_timeout = 0\n")
        .expect("config should be writable");

    runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(contains("chat_timeout must be greater than 0"));
}

#[test]
fn profile_with_zero_timeout_is_rejected_before_use() {
    let config_path = unique_temp_path("run-zero");
    fs::write(
        &config_path,
        "[profiles.local]\nmodel = \"m\"\ngenerate_timeout = 0\n",
    )
    .expect("config should be writable");

    runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .args(["generate", "--profile", "local", "--dry-run", "hello"])
        .assert()
        .failure()
        .stderr(contains("generate_timeout must be greater than 0"));
}

#[test]
fn invalid_profile_toml_returns_parse_error() {
    let config_path = unique_temp_path("invalid-toml");
    fs::write(&config_path, "[profiles.bad\nmodel = \"m\"").expect("config should be writable");

    runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .args(["generate", "--profile", "bad", "--dry-run", "hello"])
        .assert()
        .failure()
        .stderr(contains("Failed to parse config file"));
}

#[test]
fn profile_not_found_returns_error() {
    let config_path = unique_temp_path("profile-not-found");
    fs::write(&config_path, "[profiles.local]\nmodel = \"m\"\n")
        .expect("config should be writable");

    runner_cmd()
        .env("OLLAMA_RUNNER_CONFIG", &config_path)
        .args(["generate", "--profile", "remote", "--dry-run", "hello"])
        .assert()
        .failure()
        .stderr(contains("Profile 'remote' not found"));
}

#[test]
fn version_prints_build_metadata() {
    runner_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("commit:").and(contains("built:")));
    ogen_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("commit:"));
}

#[test]
fn completion_bash_outputs_script() {
    runner_cmd()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(contains("complete").and(contains("ollama-runner")));
}
