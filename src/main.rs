use std::io;
use std::process;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use ollama_runner::LONG_VERSION;
use ollama_runner::commands::config_cmd::{self, ConfigArgs};
use ollama_runner::commands::decide::{self, DecideArgs};
use ollama_runner::commands::embed::{self, EmbedArgs};
use ollama_runner::commands::generate::{self as generate_cmd, GenerateArgs};
use ollama_runner::commands::models::{self, ModelsArgs};
use owo_colors::{OwoColorize, Stream};

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  ollama-runner models\n  ollama-runner generate --model llama3.1:8b \"Explain Ollama in one line\"\n  echo \"hello world\" | ollama-runner embed --model granite-embedding:30m\n  ollama-runner decide --model llama3.1:8b --tools tools.toml \"What is 2 + 3?\"\n  ollama-runner completion bash > ~/.local/share/bash-completion/completions/ollama-runner";

const DECIDE_HELP_EXAMPLES: &str = "Tools file (TOML):\n  [[tools]]\n  name = \"add\"\n  doc = \"Add two numbers.\"\n  params = [{ name = \"a\", type = \"i64\" }, { name = \"b\", type = \"i64\" }]";

#[derive(Debug, Parser)]
#[command(
    name = "ollama-runner",
    about = "Client for a local Ollama server",
    version,
    long_version = LONG_VERSION,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "List installed models")]
    Models(ModelsArgs),
    #[command(about = "Generate a completion for a prompt")]
    Generate(GenerateArgs),
    #[command(about = "Print the embedding vector for a text")]
    Embed(EmbedArgs),
    #[command(
        about = "Ask a model which tool to call",
        after_help = DECIDE_HELP_EXAMPLES
    )]
    Decide(DecideArgs),
    #[command(about = "Manage local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    let name = "ollama-runner";
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, name, &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, name, &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, name, &mut io::stdout()),
    }
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Models(args) => models::run(args),
        Commands::Generate(args) => generate_cmd::run(args),
        Commands::Embed(args) => embed::run(args),
        Commands::Decide(args) => decide::run(args),
        Commands::Config(args) => config_cmd::run(args),
        Commands::Completion { shell } => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!(
            "{} {err}",
            "error:".if_supports_color(Stream::Stderr, |label| label.red())
        );
        process::exit(1);
    }
}
