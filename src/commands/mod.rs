use std::io::{self, IsTerminal, Read};

use clap::Args;

use crate::config::{self, Overrides, Settings};
use crate::logging::{self, Verbosity};

pub mod config_cmd;
pub mod decide;
pub mod embed;
pub mod generate;
pub mod models;

/// Flags shared by every subcommand that talks to the server.
#[derive(Debug, Args, Clone, Default)]
pub struct CommonArgs {
    #[arg(long, value_name = "URL", help = "Ollama server address")]
    pub base_url: Option<String>,
    #[arg(long, help = "Profile name from the config file")]
    pub profile: Option<String>,
    #[arg(short, long, help = "Log requests to stderr")]
    pub verbose: bool,
    #[arg(short, long, help = "Only log errors")]
    pub quiet: bool,
}

impl CommonArgs {
    pub fn init_logging(&self) {
        logging::init(Verbosity::from_flags(self.quiet, self.verbose));
    }

    pub fn settings(&self, model: Option<String>) -> Result<Settings, String> {
        config::resolve(&Overrides {
            base_url: self.base_url.clone(),
            model,
            profile: self.profile.clone(),
        })
    }
}

/// Uses the prompt argument when given, otherwise reads stdin.
pub(crate) fn read_prompt(prompt: Option<String>) -> Result<String, String> {
    const MISSING: &str = "No prompt provided. Pass it as an argument or pipe it on stdin.";

    if let Some(prompt) = prompt.filter(|value| !value.trim().is_empty()) {
        return Ok(prompt);
    }

    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(MISSING.to_string());
    }
    let mut buffer = String::new();
    stdin
        .lock()
        .read_to_string(&mut buffer)
        .map_err(|err| format!("Failed to read prompt from stdin: {err}"))?;
    let trimmed = buffer.trim();
    if trimmed.is_empty() {
        return Err(MISSING.to_string());
    }
    Ok(trimmed.to_string())
}

pub(crate) fn print_json(value: &serde_json::Value) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|err| format!("Failed to encode JSON output: {err}"))?;
    println!("{text}");
    Ok(())
}
