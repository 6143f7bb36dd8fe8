use std::process;

use clap::Parser;
use ollama_runner::LONG_VERSION;
use ollama_runner::commands::generate::{self, GenerateArgs};
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Parser)]
#[command(
    name = "ogen",
    about = "Generate a completion with a local Ollama model",
    version,
    long_version = LONG_VERSION
)]
struct Cli {
    #[command(flatten)]
    generate: GenerateArgs,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = generate::run(cli.generate) {
        eprintln!(
            "{} {err}",
            "error:".if_supports_color(Stream::Stderr, |label| label.red())
        );
        process::exit(1);
    }
}
