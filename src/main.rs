//! # sensorweb-harvest CLI (`swh`)
//!
//! Harvests the configured sensor observation services into the DCAT
//! catalog graph and inspects the result.
//!
//! ## Usage
//!
//! ```bash
//! swh --config ./config/swh.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `swh init` | Create the SQLite database and the catalog tables |
//! | `swh sources` | List configured sources |
//! | `swh harvest <source>` | Harvest one source, or `all` enabled sources |
//! | `swh catalog` | Print the persisted catalog graph as JSON |
//!
//! Logging is controlled with `RUST_LOG` (default `info`) and goes to
//! stderr, as does progress output.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use sensorweb_harvest::progress::ProgressMode;
use sensorweb_harvest::{config, harvest, migrate, sources};

/// sensorweb-harvest: sensor observation services into a DCAT catalog.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file.
#[derive(Parser)]
#[command(
    name = "swh",
    about = "Harvest sensor observation services into a DCAT catalog graph",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/swh.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// List configured sources and their snapshot status.
    Sources,

    /// Harvest a source into the catalog.
    ///
    /// Source format: `all` or the key of a `[sources.<key>]` table.
    Harvest {
        source: String,

        /// Progress output on stderr. Defaults to human output on a TTY.
        #[arg(long, value_enum)]
        progress: Option<ProgressArg>,
    },

    /// Print the persisted catalog graph.
    Catalog,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProgressArg {
    Off,
    Human,
    Json,
}

impl From<ProgressArg> for ProgressMode {
    fn from(arg: ProgressArg) -> Self {
        match arg {
            ProgressArg::Off => ProgressMode::Off,
            ProgressArg::Human => ProgressMode::Human,
            ProgressArg::Json => ProgressMode::Json,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Sources => {
            sources::list_sources(&cfg)?;
        }
        Commands::Harvest { source, progress } => {
            let mode = progress
                .map(ProgressMode::from)
                .unwrap_or_else(ProgressMode::default_for_tty);
            harvest::run_harvest(&cfg, &source, mode).await?;
        }
        Commands::Catalog => {
            harvest::run_catalog(&cfg).await?;
        }
    }

    Ok(())
}
