use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use owo_colors::{OwoColorize, Stream};
use serde::Deserialize;
use serde_json::json;

use crate::commands::{CommonArgs, print_json, read_prompt};
use crate::ollama::tools::parse_tool_calls;
use crate::ollama::{ChatMessage, OllamaClient, Signature};

#[derive(Debug, Args, Clone)]
pub struct DecideArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long, help = "Model name; must support tool calling")]
    pub model: Option<String>,
    #[arg(long, value_name = "FILE", help = "TOML or JSON file declaring the tools")]
    pub tools: PathBuf,
    #[arg(long, help = "Optional system message")]
    pub system: Option<String>,
    #[arg(long, help = "Print only the selected tool calls")]
    pub calls: bool,
    #[arg(long, help = "Print the request instead of sending it")]
    pub dry_run: bool,
    #[arg(help = "User message; read from stdin when omitted")]
    pub prompt: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ToolsFile {
    tools: Vec<Signature>,
}

pub fn run(args: DecideArgs) -> Result<(), String> {
    args.common.init_logging();
    let settings = args.common.settings(args.model.clone())?;
    let model = settings.require_model()?.to_string();
    let tools = load_tools(&args.tools)?;
    let prompt = read_prompt(args.prompt)?;

    let mut messages = Vec::new();
    if let Some(system) = args.system {
        messages.push(ChatMessage::system(system));
    }
    messages.push(ChatMessage::user(prompt));

    let client = OllamaClient::with_config(settings.client);

    if args.dry_run {
        let request = client.decision_request(&model, &messages, &tools);
        return print_json(&json!({
            "dry_run": true,
            "endpoint": client.endpoint("/api/chat"),
            "request": request,
        }));
    }

    let response = client
        .decide_tool(&model, &messages, &tools)
        .map_err(|err| err.to_string())?;
    if !args.calls {
        return print_json(&response);
    }

    let calls = parse_tool_calls(&response);
    if calls.is_empty() {
        eprintln!("no tool selected");
    }
    for call in calls {
        println!(
            "{} {}",
            call.name.if_supports_color(Stream::Stdout, |name| name.bold()),
            call.args
        );
    }
    Ok(())
}

fn load_tools(path: &Path) -> Result<Vec<Signature>, String> {
    let raw = fs::read_to_string(path)
        .map_err(|err| format!("Failed to read tools file '{}': {err}", path.display()))?;

    let parsed: ToolsFile = if path.extension().is_some_and(|ext| ext == "json") {
        serde_json::from_str(&raw)
            .map_err(|err| format!("Failed to parse tools file '{}': {err}", path.display()))?
    } else {
        toml::from_str(&raw)
            .map_err(|err| format!("Failed to parse tools file '{}': {err}", path.display()))?
    };

    if parsed.tools.is_empty() {
        return Err(format!(
            "Tools file '{}' does not declare any tools.",
            path.display()
        ));
    }
    Ok(parsed.tools)
}
