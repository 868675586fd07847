mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nimbus")]
#[command(about = "Uniform object storage client for OCI, S3, Azure, GCS and local disk")]
#[command(version)]
struct Cli {
    /// Path to the Nimbus config directory (default: ~/.nimbus)
    #[arg(long, global = true, env = "NIMBUS_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration (local backend)
    Init,

    /// Show current configuration
    Config,

    /// Upload a local file under KEY
    Put {
        /// Object key
        key: String,
        /// File to upload
        file: PathBuf,
    },

    /// Print an object to stdout, or write it to --output
    Get {
        /// Object key
        key: String,
        /// Write the whole object to this file instead of streaming to stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Stream an object into a local file
    Download {
        /// Object key
        key: String,
        /// Destination path (overwritten)
        dest: PathBuf,
    },

    /// Exit 0 if KEY exists, 1 otherwise
    Exists {
        /// Object key
        key: String,
    },

    /// Delete an object
    Rm {
        /// Object key
        key: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("nimbus=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let base_dir = match cli.config_dir {
        Some(ref dir) => dir.clone(),
        None => nimbus_core::config::NimbusConfig::default_base_dir()?,
    };

    let rt = tokio::runtime::Runtime::new()?;

    match cli.command {
        Commands::Init => commands::init::run(&base_dir),
        Commands::Config => commands::config::run(&base_dir),
        Commands::Put { ref key, ref file } => rt.block_on(commands::put::run(&base_dir, key, file)),
        Commands::Get { ref key, ref output } => {
            rt.block_on(commands::get::run(&base_dir, key, output.as_deref()))
        }
        Commands::Download { ref key, ref dest } => {
            rt.block_on(commands::download::run(&base_dir, key, dest))
        }
        Commands::Exists { ref key } => {
            let found = rt.block_on(commands::exists::run(&base_dir, key))?;
            if !found {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Rm { ref key } => rt.block_on(commands::rm::run(&base_dir, key)),
    }
}
