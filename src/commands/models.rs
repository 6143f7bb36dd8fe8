use clap::Args;
use serde_json::json;

use crate::commands::{CommonArgs, print_json};
use crate::ollama::OllamaClient;

#[derive(Debug, Args, Clone)]
pub struct ModelsArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long, help = "Print the names as a JSON array")]
    pub json: bool,
    #[arg(long, value_name = "NAME", help = "Exit non-zero unless NAME is installed")]
    pub check: Option<String>,
}

pub fn run(args: ModelsArgs) -> Result<(), String> {
    args.common.init_logging();
    let settings = args.common.settings(None)?;
    let client = OllamaClient::with_config(settings.client);

    if let Some(name) = args.check {
        let available = client
            .is_model_available(&name)
            .map_err(|err| err.to_string())?;
        if !available {
            return Err(format!(
                "Model '{name}' is not installed on {}.",
                client.base_url()
            ));
        }
        println!("{name}: available");
        return Ok(());
    }

    let names = client.list_models().map_err(|err| err.to_string())?;
    if args.json {
        return print_json(&json!(names));
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}
