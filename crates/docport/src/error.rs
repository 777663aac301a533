//! CLI error types.

use docport_config::ConfigError;
use docport_store::StoreError;

/// CLI error type.
#[derive(Debug, thiserror::Error)]
pub(crate) enum CliError {
    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Server(String),

    #[error("{0}")]
    Validation(String),
}
