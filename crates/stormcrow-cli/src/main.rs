use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use dotenv::dotenv;
use strum::IntoEnumIterator;
use tracing_subscriber::EnvFilter;

use stormcrow::agent::Agent;
use stormcrow::providers::factory::{get_provider, ProviderType};
use stormcrow::tools::{ToolRegistry, WeatherTool};

mod configuration;
mod error;
mod prompt;
mod session;

use configuration::{Overrides, Settings};
use prompt::rustyline::RustylinePrompt;
use session::Session;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ask a single question and exit instead of starting a session
    query: Vec<String>,

    /// Provider to use (openai or ollama)
    #[arg(short, long, value_parser = parse_provider)]
    provider: Option<String>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Provider host
    #[arg(long)]
    host: Option<String>,

    /// OpenAI API Key (can also be set via OPENAI_API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Stop a question after this many model replies without an answer
    #[arg(long)]
    max_turns: Option<usize>,

    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_provider(value: &str) -> Result<String, String> {
    ProviderType::from_str(&value.to_lowercase())
        .map(|provider| provider.to_string())
        .map_err(|_| {
            let known: Vec<String> = ProviderType::iter().map(|p| p.to_string()).collect();
            format!("unknown provider '{}', expected one of: {}", value, known.join(", "))
        })
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn build_agent(settings: Settings) -> Result<Agent> {
    let provider = get_provider(settings.provider.into_config()?)?;
    let weather = WeatherTool::new(settings.weather.into_config())
        .context("Failed to build the weather client")?;

    Ok(Agent::new(provider, ToolRegistry::new().with_tool(weather))
        .with_max_turns(settings.agent.max_turns)
        .with_unknown_tool_policy(settings.agent.unknown_tool))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let overrides = Overrides {
        provider: cli.provider,
        model: cli.model,
        host: cli.host,
        api_key: cli.api_key,
        max_turns: cli.max_turns,
    };
    let settings = Settings::new(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;
    tracing::info!(model = settings.provider.model(), "starting stormcrow");

    let agent = build_agent(settings)?;
    let mut session = Session::new(agent, Box::new(RustylinePrompt::new()));

    if cli.query.is_empty() {
        session.start().await?;
    } else {
        let query = cli.query.join(" ");
        if let Err(e) = session.headless_start(&query).await {
            eprintln!("{}", style(format!("Failed: {:#}", e)).red());
            std::process::exit(1);
        }
    }

    Ok(())
}
