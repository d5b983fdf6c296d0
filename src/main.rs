//! Market Advisor - Main Entry Point

use clap::{Parser, Subcommand};
use market_advisor::agent::{AgentExecutor, QueryAgent};
use market_advisor::config::AdvisorConfig;
use market_advisor::llm::provider::LlmProvider;
use market_advisor::llm::providers::{OpenAiConfig, OpenAiProvider};
use market_advisor::observability::init_default_logging;
use market_advisor::server;
use market_advisor::tools::ToolSystem;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

/// HTTP financial-advisor agent
#[derive(Parser)]
#[command(name = "market-advisor")]
#[command(about = "HTTP financial-advisor agent with stock price-target and web search tools")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Run,
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Credentials may live in a .env file next to the binary
    dotenvy::dotenv().ok();

    // -v bumps the default level unless LOG_LEVEL is set explicitly
    if cli.verbose > 0 && std::env::var("LOG_LEVEL").is_err() {
        let level = if cli.verbose > 1 { "TRACE" } else { "DEBUG" };
        std::env::set_var("LOG_LEVEL", level);
    }
    init_default_logging();

    info!("Starting market advisor v{}", env!("CARGO_PKG_VERSION"));

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Run => run_server(config).await,
        Commands::Config { show } => handle_config_command(config, show),
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }

    info!("Application shutdown complete");
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AdvisorConfig, Box<dyn std::error::Error>> {
    let mut config = match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            AdvisorConfig::load_from_file(path)?
        }
        None => {
            let default_paths = ["advisor.toml", "config/advisor.toml"];

            match default_paths
                .iter()
                .map(PathBuf::from)
                .find(|path| path.exists())
            {
                Some(path) => {
                    info!("Loading configuration from: {}", path.display());
                    AdvisorConfig::load_from_file(&path)?
                }
                None => {
                    info!("No configuration file found, using defaults");
                    AdvisorConfig::default()
                }
            }
        }
    };

    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Provider factory for creating LLM providers from configuration
struct LlmProviderFactory;

impl LlmProviderFactory {
    fn create_provider(
        config: &AdvisorConfig,
    ) -> Result<Arc<dyn LlmProvider>, Box<dyn std::error::Error>> {
        match config.llm.provider.as_str() {
            "openai" => {
                let api_key = config.get_llm_api_key()?;
                let openai_config = OpenAiConfig {
                    api_key,
                    base_url: config.llm.base_url.clone(),
                    timeout: Duration::from_secs(config.llm.timeout_secs),
                };
                Ok(Arc::new(OpenAiProvider::new(openai_config)?))
            }
            provider => Err(format!("Unsupported LLM provider: {provider}").into()),
        }
    }
}

/// Bootstrap: wire provider and tools into the executor
async fn build_agent(
    config: &AdvisorConfig,
) -> Result<Arc<dyn QueryAgent>, Box<dyn std::error::Error>> {
    let llm_provider = LlmProviderFactory::create_provider(config)?;
    let tool_system = ToolSystem::from_config(&config.tools).await?;

    info!(
        provider = llm_provider.name(),
        model = %config.llm.model,
        tools = ?tool_system.list_tools(),
        "Agent assembled"
    );

    Ok(Arc::new(AgentExecutor::from_config(
        config,
        llm_provider,
        Arc::new(tool_system),
    )))
}

async fn run_server(config: AdvisorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let agent = build_agent(&config).await?;
    server::serve(&config.bind_address(), agent, shutdown_signal()).await?;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            if signal::ctrl_c().await.is_ok() {
                info!("Received SIGINT, shutting down gracefully...");
            }
            return;
        }
    };

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received SIGINT, shutting down gracefully...");
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

fn handle_config_command(
    config: AdvisorConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(&config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}
