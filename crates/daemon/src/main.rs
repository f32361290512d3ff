use anyhow::Result;
use bezs_core::tracing::{InstrumentationConfig, init_tracing};
use bezs_core::ValidateConfig;
use bezs_daemon::{Runtime, Settings};
use clap::Parser;
use tracing::info;

const DEFAULT_LOG_FILTER: &str =
    "bezs=info,bezs_daemon=info,bezs_http=info,bezs_core=info,tower_http=info";

/// Bezs access gate - session-aware RBAC in front of the Bezs web app
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Validate the configuration and exit
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut instrumentation_config = InstrumentationConfig::from_env();
    if std::env::var("RUST_LOG").is_err() {
        instrumentation_config.log_level = DEFAULT_LOG_FILTER.to_string();
    }
    init_tracing(&instrumentation_config)?;

    let settings = match &cli.config {
        Some(path) => {
            info!("Loading configuration from: {}", path);
            Settings::load_from_file(path)?
        }
        None => Settings::load()?,
    };

    if cli.check {
        settings.validate()?;
        println!("Configuration is valid");
        return Ok(());
    }

    let runtime = Runtime::build(settings)?;
    let listener = runtime.bind().await?;

    runtime
        .serve(listener, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            info!("Received shutdown signal");
        })
        .await?;

    Ok(())
}
