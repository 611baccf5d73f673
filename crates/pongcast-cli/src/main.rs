//! pongcast CLI: drive the controller against a simulated receiver.

mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pongcast_controller::setup;
use pongcast_protocol::wire;

#[derive(Parser)]
#[command(
    name = "pongcast",
    about = "Two-player pong on a cast receiver, from the controller side",
    version,
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a game against a scripted in-process receiver.
    Simulate {
        /// Path to configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Paddle moves before the receiver ends the game.
        #[arg(short, long, default_value_t = 6)]
        rallies: u32,
    },

    /// Print the default configuration.
    DefaultConfig,

    /// Show how a receiver message is interpreted.
    Decode {
        /// Message text, e.g. "PADDLE YES LEFT".
        text: String,
    },
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate { config, rallies } => {
            let config = setup::load_config(config.as_deref())?;
            init_tracing(&config.log_level);
            tracing::info!(rallies, "starting simulated game");

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(simulate::run(&config, rallies))?;
        }
        Commands::DefaultConfig => {
            print!("{}", setup::default_config_toml()?);
        }
        Commands::Decode { text } => match wire::decode_message(&text) {
            Ok(message) => println!("{message:?}"),
            Err(e) => println!("ignored: {e}"),
        },
    }

    Ok(())
}
