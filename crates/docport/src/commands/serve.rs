//! `docport serve` command implementation.

use std::path::PathBuf;

use clap::Args;
use docport_config::{CliSettings, Config, ContentBackend, DatabaseLocation};
use docport_server::{run_server, server_config_from_config};

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the serve command.
#[derive(Args)]
pub(crate) struct ServeArgs {
    /// Path to configuration file (default: auto-discover docport.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Host to bind to (overrides config).
    #[arg(long)]
    host: Option<String>,

    /// Port to bind to (overrides config).
    #[arg(short, long)]
    port: Option<u16>,

    /// Section database file, or `:memory:` (overrides config).
    #[arg(long)]
    database: Option<PathBuf>,

    /// Enable verbose output (request and storage logs).
    #[arg(short, long)]
    pub verbose: bool,
}

impl ServeArgs {
    /// Execute the serve command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration fails or the server fails to start.
    pub(crate) async fn execute(self) -> Result<(), CliError> {
        let output = Output::new();

        let cli_settings = CliSettings {
            host: self.host,
            port: self.port,
            database_path: self.database,
        };

        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        output.info(&format!(
            "Starting server on {}:{}",
            config.server.host, config.server.port
        ));

        match &config.database_resolved.location {
            DatabaseLocation::File(path) => {
                output.info(&format!("Database: {}", path.display()));
            }
            DatabaseLocation::Memory => {
                output.warning("Database: in-memory (sections are lost on shutdown)");
            }
        }

        let content = &config.content_resolved;
        match &content.backend {
            ContentBackend::Fs { dir } => output.info(&format!(
                "Content: {} (served at {})",
                dir.display(),
                content.public_base_url
            )),
            ContentBackend::S3 { bucket, .. } => output.info(&format!(
                "Content: s3://{bucket} (public URL {})",
                content.public_base_url
            )),
        }

        let server_config = server_config_from_config(&config);
        run_server(server_config)
            .await
            .map_err(|e| CliError::Server(e.to_string()))?;

        Ok(())
    }
}
