//! The landmem CLI application.

use std::sync::Arc;

use landmem_core::Result;
use landmem_search::LandMemorySystem;
use landmem_vector::{create_embedding_provider, create_plot_store};
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Command};
use crate::config::LandmemConfig;
use crate::{config_handlers, handlers};

// ============================================================================
// LandmemCli
// ============================================================================

/// CLI application over one loaded configuration.
pub struct LandmemCli {
    name: String,
    config: Arc<LandmemConfig>,
    version: String,
}

impl LandmemCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = LandmemConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create a new CLI application.
    pub fn new(name: impl Into<String>, config: LandmemConfig) -> Self {
        Self {
            name: name.into(),
            config: Arc::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn config(&self) -> &LandmemConfig {
        &self.config
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` env var if set, otherwise defaults based on verbosity flags.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be set (e.g. in tests).
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }

    /// Build the plot memory described by the configuration.
    pub async fn system(&self) -> Result<LandMemorySystem> {
        let config = &*self.config;
        let embedder = create_embedding_provider(&config.embedding)?;
        let store = create_plot_store(&config.resolved_store()?, embedder.dimension()).await?;
        tracing::debug!(
            store = store.name(),
            embedder = embedder.name(),
            collection = %config.collection,
            "plot memory ready"
        );

        Ok(LandMemorySystem::from_config(config, store, embedder)?
            .with_threshold(config.search.similarity_threshold)
            .with_ordering(config.search.ordering()?)
            .with_match_count(config.search.match_count))
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);

        let output = match args.command {
            Some(Command::Version) => format!("{} {}", self.name, self.version),
            Some(Command::Config(config_cmd)) => {
                return config_handlers::handle_config_command(
                    args.config.as_deref(),
                    config_cmd.command,
                );
            }
            Some(Command::Ingest { path }) => {
                handlers::handle_ingest(&self.system().await?, &path).await?
            }
            Some(Command::Search(search)) => {
                handlers::handle_search(&self.system().await?, &search).await?
            }
            Some(Command::Rarity {
                min,
                max,
                limit,
                json,
            }) => handlers::handle_rarity(&self.system().await?, min, max, limit, json).await?,
            Some(Command::Show { id, json }) => {
                handlers::handle_show(&self.system().await?, &id, json).await?
            }
            Some(Command::Stats { json }) => {
                handlers::handle_stats(&self.system().await?, json).await?
            }
            None => format!("{} {} (use --help for usage)", self.name, self.version),
        };
        println!("{output}");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
