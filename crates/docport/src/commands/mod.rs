//! CLI command implementations.

pub(crate) mod check;
pub(crate) mod serve;
pub(crate) mod tree;

use std::path::PathBuf;

use clap::Args;
use docport_config::{CliSettings, Config};
use docport_store::SectionStore;

pub(crate) use check::CheckArgs;
pub(crate) use serve::ServeArgs;
pub(crate) use tree::TreeArgs;

use crate::error::CliError;

/// Options shared by commands that read the section database.
#[derive(Args)]
pub(crate) struct DatabaseArgs {
    /// Path to configuration file (default: auto-discover docport.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Section database file, or `:memory:` (overrides config).
    #[arg(long)]
    database: Option<PathBuf>,
}

impl DatabaseArgs {
    /// Load configuration and open the section database.
    async fn open_store(self) -> Result<SectionStore, CliError> {
        let cli_settings = CliSettings {
            database_path: self.database,
            ..CliSettings::default()
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;
        Ok(SectionStore::connect(&config.database_resolved).await?)
    }
}
