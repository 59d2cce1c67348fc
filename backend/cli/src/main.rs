mod config;
mod status_cmd;

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use neonchat_config::{apply_all_defaults, defaults, NeonChatConfig};
use neonchat_gateway::{start_server, GatewayState};
use neonchat_logging::init_logger;

use config::ServeSettings;

#[derive(Parser)]
#[command(name = "neonchat")]
#[command(about = "NeonChat: anonymous one-on-one chat rendezvous server")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the rendezvous server
    Serve {
        /// Port to bind, overriding the config file and PORT
        #[arg(short, long)]
        port: Option<u16>,
        /// Config file (default: ~/.neonchat/config.yaml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Query a running server's health endpoint
    Status {
        #[arg(short, long, default_value_t = defaults::DEFAULT_PORT)]
        port: u16,
    },
    /// Write a config file populated with defaults
    InitConfig {
        #[arg(long)]
        path: Option<PathBuf>,
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let path = neonchat_config::resolve_config_path(config.as_deref());
            let prepared = neonchat_config::load_and_prepare(&path).await?;
            let settings = ServeSettings::from_config(&prepared, port)?;
            run_server(settings).await?;
        }
        Commands::Status { port } => {
            status_cmd::run(port).await?;
        }
        Commands::InitConfig { path, force } => {
            let path = neonchat_config::resolve_config_path(path.as_deref());
            if path.exists() && !force {
                bail!("{} already exists (use --force to replace it)", path.display());
            }
            let config = apply_all_defaults(NeonChatConfig::default());
            neonchat_config::write_config(&config, &path).await?;
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}

async fn run_server(settings: ServeSettings) -> Result<()> {
    init_logger(&settings.logger);

    info!(
        addr = %settings.addr,
        max_interests = settings.limits.max_interests,
        strict_signaling = settings.limits.strict_signaling,
        static_dir = ?settings.static_dir,
        "Starting NeonChat"
    );

    let state = GatewayState::new(settings.limits);
    start_server(settings.addr, state, settings.static_dir.as_deref()).await
}
