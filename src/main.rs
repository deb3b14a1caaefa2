#![warn(clippy::all, clippy::pedantic)]

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use wolfcall::Config;
use wolfcall::cli::{Cli, Commands, render_config};
use wolfcall::generation::{GatewaySettings, GenerationGateway};
use wolfcall::llm::{Provider, create_provider};

#[tokio::main]
async fn main() -> Result<()> {
    // Both ring and aws-lc-rs may be linked; pick one for rustls explicitly.
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let mut config = Config::load_or_init(cli.config.as_deref())?;
    cli.command.apply_overrides(&mut config);
    config.validate()?;

    match cli.command {
        Commands::ShowConfig => {
            println!("{}", render_config(&config)?);
            Ok(())
        }
        Commands::Play { .. } => {
            let provider: Arc<dyn Provider> = Arc::from(create_provider(&config.llm)?);
            if let Err(e) = provider.warmup().await {
                tracing::warn!(provider = provider.name(), "Warmup failed (non-fatal): {e}");
            }
            let gateway = GenerationGateway::new(provider, GatewaySettings::from(&config.llm))?;
            tracing::info!(
                name = config.agent.name.as_str(),
                provider = gateway.provider_name(),
                games = config.game.num,
                "Starting"
            );
            wolfcall::session::run(&config, Arc::new(gateway)).await
        }
    }
}
