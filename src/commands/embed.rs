use clap::Args;
use serde_json::json;

use crate::commands::{CommonArgs, print_json, read_prompt};
use crate::ollama::{EmbeddingsRequest, OllamaClient};

#[derive(Debug, Args, Clone)]
pub struct EmbedArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long, help = "Embedding model name")]
    pub model: Option<String>,
    #[arg(long, help = "Print the request instead of sending it")]
    pub dry_run: bool,
    #[arg(help = "Text to embed; read from stdin when omitted")]
    pub prompt: Option<String>,
}

pub fn run(args: EmbedArgs) -> Result<(), String> {
    args.common.init_logging();
    let settings = args.common.settings(args.model.clone())?;
    let model = settings.require_embed_model()?.to_string();
    let prompt = read_prompt(args.prompt)?;
    let client = OllamaClient::with_config(settings.client);

    if args.dry_run {
        let request = EmbeddingsRequest { model, prompt };
        return print_json(&json!({
            "dry_run": true,
            "endpoint": client.endpoint("/api/embeddings"),
            "request": request,
        }));
    }

    let embedding = client
        .get_embeddings(&model, &prompt)
        .map_err(|err| err.to_string())?;
    let text = serde_json::to_string(&embedding)
        .map_err(|err| format!("Failed to encode JSON output: {err}"))?;
    println!("{text}");
    Ok(())
}
