use crate::config::{Config, ConnectionMode};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `wolfcall` - LLM-driven player for werewolf game servers.
#[derive(Parser, Debug)]
#[command(name = "wolfcall")]
#[command(version)]
#[command(about = "Plays werewolf over the AIWolf protocol with a language model.", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.wolfcall/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to the game server and play
    Play {
        /// How to reach the game server
        #[arg(long, value_enum)]
        mode: Option<ConnectionMode>,

        /// Game server host (or bind address in listen mode)
        #[arg(long)]
        host: Option<String>,

        /// Game server port
        #[arg(short, long)]
        port: Option<u16>,

        /// Name sent in reply to NAME
        #[arg(short, long)]
        name: Option<String>,

        /// Games to play per connection
        #[arg(short, long)]
        games: Option<u32>,
    },

    /// Print the effective configuration
    ShowConfig,
}

impl Commands {
    /// Fold command-line overrides into the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Self::Play {
            mode,
            host,
            port,
            name,
            games,
        } = self
        {
            if let Some(mode) = mode {
                config.connection.mode = *mode;
            }
            if let Some(host) = host {
                config.connection.host.clone_from(host);
            }
            if let Some(port) = port {
                config.connection.port = *port;
            }
            if let Some(name) = name {
                config.agent.name.clone_from(name);
            }
            if let Some(games) = games {
                config.game.num = *games;
            }
        }
    }
}

/// TOML rendering of the effective config with the API key masked.
pub fn render_config(config: &Config) -> anyhow::Result<String> {
    let mut shown = config.clone();
    if shown.llm.api_key.is_some() {
        shown.llm.api_key = Some("***".into());
    }
    Ok(toml::to_string_pretty(&shown)?)
}
