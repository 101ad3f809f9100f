//! AgentLoom CLI: the composition root.
//!
//! Commands:
//! - `run`     Run an agent against one input, blocking or streamed
//! - `tools`   List the built-in tools
//! - `doctor`  Check config and the Ollama backend
//! - `config`  Show or initialize the configuration

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "agentloom",
    about = "AgentLoom: tool-using agents on a local Ollama model",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to ~/.agentloom/config.toml)
    #[arg(short, long, global = true, env = "AGENTLOOM_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent against a single input
    Run {
        /// JSON file holding one agent definition or an array of them
        #[arg(long)]
        agents: PathBuf,

        /// Id of the agent to run
        #[arg(long)]
        agent: String,

        /// The user input
        #[arg(short, long)]
        input: String,

        /// Print tokens and tool activity as they happen
        #[arg(long)]
        stream: bool,

        /// Print JSON (the execution, or one event per line when streaming)
        #[arg(long)]
        json: bool,
    },

    /// List the built-in tools
    Tools {
        /// Print function-calling schemas instead of prompt descriptions
        #[arg(long)]
        schemas: bool,
    },

    /// Diagnose config and backend health
    Doctor,

    /// Show the effective configuration
    Config {
        /// Write a default config file instead
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries answers and JSON.
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Run {
            agents,
            agent,
            input,
            stream,
            json,
        } => {
            let config = commands::load_config(config_path)?;
            let args = commands::run::RunArgs {
                agents,
                agent,
                input,
                stream,
                json,
            };
            commands::run::run(config, args).await?
        }
        Commands::Tools { schemas } => {
            let config = commands::load_config(config_path)?;
            commands::tools::run(&config, schemas)?
        }
        Commands::Doctor => commands::doctor::run(config_path).await?,
        Commands::Config { init } => {
            if init {
                commands::config_cmd::init(config_path)?
            } else {
                commands::config_cmd::show(config_path)?
            }
        }
    }

    Ok(())
}
