//! Tool Agent — minimal tool-calling agent runtime.
//!
//! Usage:
//!   tool-agent chat             Start an interactive conversation
//!   tool-agent tools            List the tools advertised to the model
//!   tool-agent weather <city>   Look up live weather directly
//!   tool-agent setup            Run the setup wizard

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing::info;

use tool_agent::agent::{self, ConversationLoop};
use tool_agent::amap::AmapClient;
use tool_agent::config::{self, AgentConfig};
use tool_agent::inference::InferenceClient;
use tool_agent::tools::{self, ToolRegistry};

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "tool-agent")]
#[command(version)]
#[command(about = "Minimal tool-calling agent runtime")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the agent home directory.
    #[arg(long)]
    home: Option<String>,

    /// Log level (debug, info, warn, error). Overrides the config file.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start an interactive conversation.
    Chat,

    /// List the tools advertised to the model.
    Tools,

    /// Look up live weather for a city without the model.
    Weather {
        /// City name, e.g. 北京.
        city: String,
    },

    /// Run the first-time setup wizard.
    Setup,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let home_dir = match &cli.home {
        Some(home) => PathBuf::from(shellexpand::tilde(home).into_owned()),
        None => config::default_home_dir(),
    };

    let mut cfg = config::load_config(&home_dir.join(config::CONFIG_FILE))
        .with_context(|| format!("Failed to load config from {}", home_dir.display()))?;
    config::apply_env_overrides(&mut cfg);

    // Initialize logging (stderr, so stdout stays the conversation)
    let level = cli.log_level.clone().unwrap_or_else(|| cfg.log_level.clone());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Chat => cmd_chat(cfg).await,
        Commands::Tools => cmd_tools(&cfg),
        Commands::Weather { city } => cmd_weather(&cfg, &city).await,
        Commands::Setup => cmd_setup(&home_dir),
    }
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_chat(cfg: AgentConfig) -> Result<()> {
    let registry = build_registry(&cfg)?;
    let model = InferenceClient::new(
        &cfg.model_api_url,
        &cfg.model_api_key,
        &cfg.model,
        cfg.max_tokens_per_turn,
        cfg.temperature,
        cfg.request_timeout(),
    )?;

    if cfg.amap_key.is_empty() {
        eprintln!(
            "{} No AMap key configured; get_weather calls will fail. Run `tool-agent setup` or set AMAP_KEY.",
            "Warning:".yellow().bold()
        );
    }

    println!(
        "{} Starting '{}' (model: {}, tools: {})",
        ">>>".green().bold(),
        cfg.name,
        cfg.model,
        registry.list().map(|t| t.name.as_str()).collect::<Vec<_>>().join(", "),
    );

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    let mut conversation = ConversationLoop::new(cfg, registry, model);
    conversation.run(stdin, stdout).await?;

    println!("{} Bye.", "<<<".red().bold());
    Ok(())
}

fn cmd_tools(cfg: &AgentConfig) -> Result<()> {
    let registry = build_registry(cfg)?;

    println!();
    println!("{}", "=== Tools ===".bold());
    for tool in registry.list() {
        println!();
        println!("  {}", tool.name.bold());
        println!("    {}", tool.description);
        for p in &tool.parameters {
            let marker = if p.required { "required".red() } else { "optional".dimmed() };
            println!("    - {} ({}, {}): {}", p.name, p.kind, marker, p.description);
        }
    }
    println!();
    Ok(())
}

async fn cmd_weather(cfg: &AgentConfig, city: &str) -> Result<()> {
    let client = amap_client(cfg)?;
    match client.weather(city).await {
        Ok(live) => {
            let payload = serde_json::to_value(&live)?;
            println!("{}", agent::format_payload(&payload, tools::weather::NAME));
            Ok(())
        }
        Err(e) => {
            let hint = if e.is_retryable() { " (retryable)" } else { "" };
            eprintln!("{} {}{}", "❌".red(), e, hint);
            std::process::exit(1);
        }
    }
}

fn cmd_setup(home_dir: &Path) -> Result<()> {
    tool_agent::setup::run_setup_wizard(home_dir)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn amap_client(cfg: &AgentConfig) -> Result<AmapClient> {
    AmapClient::new(&cfg.amap_api_url, &cfg.amap_key, cfg.request_timeout())
}

fn build_registry(cfg: &AgentConfig) -> Result<ToolRegistry> {
    let registry = tools::builtin_registry(amap_client(cfg)?)?;
    info!("Registered {} tools", registry.len());
    Ok(registry)
}
