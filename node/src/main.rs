//! Agora Node Binary

use agora_core::{NodeConfig, StorageBackend};
use agora_crypto::keys::KeyPair;
use agora_node::NodeBuilder;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "agora-node")]
#[command(about = "Agora Node - on-ledger voting sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the node
    Run {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// API listen address
        #[arg(long)]
        api_addr: Option<String>,

        /// Data directory
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Storage backend
        #[arg(long, value_enum)]
        storage: Option<StorageArg>,
    },

    /// Write the default configuration
    Config {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a new signing keypair
    Keygen {
        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum StorageArg {
    Memory,
    Sled,
}

impl From<StorageArg> for StorageBackend {
    fn from(arg: StorageArg) -> Self {
        match arg {
            StorageArg::Memory => StorageBackend::Memory,
            StorageArg::Sled => StorageBackend::Sled,
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            api_addr,
            data_dir,
            storage,
        } => {
            let config = match config {
                Some(path) => NodeConfig::load(&path)?,
                None => NodeConfig::default(),
            };
            init_logging(&config.log_level);

            let mut builder = NodeBuilder::new().config(config);
            if let Some(addr) = api_addr {
                builder = builder.api_addr(&addr);
            }
            if let Some(dir) = data_dir {
                builder = builder.data_dir(dir);
            }
            if let Some(backend) = storage {
                builder = builder.storage(backend.into());
            }

            builder.build().start().await?;
        }

        Commands::Config { output } => {
            let json = NodeConfig::default().to_json()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    println!("Configuration saved to: {}", path.display());
                }
                None => {
                    println!("{}", json);
                }
            }
        }

        Commands::Keygen { output } => {
            init_logging("info");
            let keypair = KeyPair::generate();

            let info = serde_json::json!({
                "public_key": keypair.public_key().to_hex(),
                "address": keypair.address().to_hex(),
                "secret_key": hex::encode(keypair.secret_bytes()),
            });

            let json = serde_json::to_string_pretty(&info)?;

            match output {
                Some(path) => {
                    std::fs::write(&path, &json)?;
                    info!("Keypair saved to {}", path.display());
                }
                None => {
                    println!("{}", json);
                }
            }
        }
    }

    Ok(())
}
