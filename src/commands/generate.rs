use std::path::PathBuf;

use clap::Args;
use serde_json::json;

use crate::commands::{CommonArgs, print_json, read_prompt};
use crate::ollama::images::encode_image_file;
use crate::ollama::{GenerateRequest, OllamaClient};

#[derive(Debug, Args, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long, help = "Model name, e.g. llama3.1:8b")]
    pub model: Option<String>,
    #[arg(long = "image", value_name = "PATH", help = "Attach an image (repeatable)")]
    pub images: Vec<PathBuf>,
    #[arg(long, help = "Print the request instead of sending it")]
    pub dry_run: bool,
    #[arg(long, help = "Print the model and response as JSON")]
    pub json: bool,
    #[arg(help = "Prompt text; read from stdin when omitted")]
    pub prompt: Option<String>,
}

pub fn run(args: GenerateArgs) -> Result<(), String> {
    args.common.init_logging();
    let settings = args.common.settings(args.model.clone())?;
    let model = settings.require_model()?.to_string();
    let prompt = read_prompt(args.prompt)?;
    let images = args
        .images
        .iter()
        .map(|path| encode_image_file(path).map_err(|err| err.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let client = OllamaClient::with_config(settings.client);

    if args.dry_run {
        let request = GenerateRequest::new(model, prompt).with_images(images);
        return print_json(&json!({
            "dry_run": true,
            "endpoint": client.endpoint("/api/generate"),
            "request": request,
        }));
    }

    let response = client
        .generate_with_images(&model, &prompt, images)
        .map_err(|err| err.to_string())?;
    if args.json {
        return print_json(&json!({ "model": model, "response": response }));
    }
    println!("{response}");
    Ok(())
}
