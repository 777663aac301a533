//! Configuration management for the documentation portal.
//!
//! Parses `docport.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `server.host`
//! - `database.path`
//! - `content.public_base_url`
//! - `content.bucket`
//! - `content.endpoint`

mod expand;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override database file path.
    pub database_path: Option<PathBuf>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "docport.toml";

/// Database path that selects a private in-memory database.
const MEMORY_DATABASE: &str = ":memory:";

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration (path is a relative string from TOML).
    database: DatabaseConfigRaw,
    /// Content storage configuration (paths are relative strings from TOML).
    content: ContentConfigRaw,

    /// Resolved database configuration (set after loading).
    #[serde(skip)]
    pub database_resolved: DatabaseConfig,
    /// Resolved content configuration (set after loading).
    #[serde(skip)]
    pub content_resolved: ContentConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Server configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 8080,
        }
    }
}

/// Raw database configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct DatabaseConfigRaw {
    path: Option<String>,
    max_connections: Option<u32>,
    busy_timeout_secs: Option<u64>,
}

/// Where the section database lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// SQLite file on disk (created if missing).
    File(PathBuf),
    /// Private in-memory database, discarded on shutdown.
    Memory,
}

/// Resolved database configuration.
#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Database location.
    pub location: DatabaseLocation,
    /// Connection pool size.
    pub max_connections: u32,
    /// How long a writer waits for a locked database.
    pub busy_timeout: Duration,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            location: DatabaseLocation::File(PathBuf::from("docport.db")),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
        }
    }
}

impl DatabaseConfig {
    /// Single-connection in-memory database, used by tests and dry runs.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            location: DatabaseLocation::Memory,
            max_connections: 1,
            ..Self::default()
        }
    }

    fn resolve(path: &str, config_dir: &Path) -> DatabaseLocation {
        if path == MEMORY_DATABASE {
            DatabaseLocation::Memory
        } else {
            DatabaseLocation::File(config_dir.join(path))
        }
    }
}

/// Raw content configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ContentConfigRaw {
    backend: Option<String>,
    dir: Option<String>,
    public_base_url: Option<String>,
    prefix: Option<String>,
    bucket: Option<String>,
    region: Option<String>,
    endpoint: Option<String>,
    upload_timeout_secs: Option<u64>,
}

/// Blob backend holding rendered section bodies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentBackend {
    /// Local directory, served by the portal itself under `/content`.
    Fs {
        /// Root directory for blobs.
        dir: PathBuf,
    },
    /// S3 or an S3-compatible service.
    S3 {
        /// Bucket name.
        bucket: String,
        /// AWS region.
        region: String,
        /// Custom endpoint (`MinIO`, `LocalStack`); switches to path-style URLs.
        endpoint: Option<String>,
    },
}

/// Resolved content configuration.
#[derive(Clone, Debug)]
pub struct ContentConfig {
    /// Blob backend.
    pub backend: ContentBackend,
    /// URL prefix under which stored blobs are publicly readable.
    pub public_base_url: String,
    /// Key prefix inside the backend (e.g. `docs` gives `docs/sec_7.html`).
    pub prefix: String,
    /// Upper bound for a single blob write.
    pub upload_timeout: Duration,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            backend: ContentBackend::Fs {
                dir: PathBuf::from("content"),
            },
            public_base_url: FS_PUBLIC_BASE_URL.to_owned(),
            prefix: "docs".to_owned(),
            upload_timeout: Duration::from_secs(30),
        }
    }
}

/// Route under which the portal serves the filesystem blob directory.
pub const FS_PUBLIC_BASE_URL: &str = "/content";

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`content.bucket`").
        field: String,
        /// Error message (e.g., "${`DOCS_BUCKET`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `docport.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(host) = &settings.host {
            self.server.host.clone_from(host);
        }
        if let Some(port) = settings.port {
            self.server.port = port;
        }
        if let Some(path) = &settings.database_path {
            self.database_resolved.location = if path.as_os_str() == MEMORY_DATABASE {
                DatabaseLocation::Memory
            } else {
                DatabaseLocation::File(path.clone())
            };
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfigRaw::default(),
            content: ContentConfigRaw::default(),
            database_resolved: DatabaseConfig {
                location: DatabaseLocation::File(base.join("docport.db")),
                ..DatabaseConfig::default()
            },
            content_resolved: ContentConfig {
                backend: ContentBackend::Fs {
                    dir: base.join("content"),
                },
                ..ContentConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir)?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_database()?;
        self.validate_content()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.server.host, "server.host")?;

        if self.server.port == 0 {
            return Err(ConfigError::Validation(
                "server.port cannot be 0".to_owned(),
            ));
        }

        Ok(())
    }

    fn validate_database(&self) -> Result<(), ConfigError> {
        const MAX_CONNECTIONS: u32 = 64;

        let max = self.database_resolved.max_connections;
        if max == 0 {
            return Err(ConfigError::Validation(
                "database.max_connections must be greater than 0".to_owned(),
            ));
        }
        if max > MAX_CONNECTIONS {
            return Err(ConfigError::Validation(format!(
                "database.max_connections cannot exceed {MAX_CONNECTIONS}"
            )));
        }

        Ok(())
    }

    fn validate_content(&self) -> Result<(), ConfigError> {
        let content = &self.content_resolved;

        if let ContentBackend::S3 { bucket, region, .. } = &content.backend {
            require_non_empty(bucket, "content.bucket")?;
            require_non_empty(region, "content.region")?;
            require_http_url(&content.public_base_url, "content.public_base_url")?;
        }

        require_non_empty(&content.public_base_url, "content.public_base_url")?;

        if content.prefix.contains("..") {
            return Err(ConfigError::Validation(
                "content.prefix cannot contain '..'".to_owned(),
            ));
        }

        if content.upload_timeout.is_zero() {
            return Err(ConfigError::Validation(
                "content.upload_timeout_secs must be greater than 0".to_owned(),
            ));
        }

        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.server.host = expand::expand_env(&self.server.host, "server.host")?;

        if let Some(ref path) = self.database.path {
            self.database.path = Some(expand::expand_env(path, "database.path")?);
        }

        let content = &mut self.content;
        if let Some(ref url) = content.public_base_url {
            content.public_base_url = Some(expand::expand_env(url, "content.public_base_url")?);
        }
        if let Some(ref bucket) = content.bucket {
            content.bucket = Some(expand::expand_env(bucket, "content.bucket")?);
        }
        if let Some(ref endpoint) = content.endpoint {
            content.endpoint = Some(expand::expand_env(endpoint, "content.endpoint")?);
        }

        Ok(())
    }

    /// Resolve relative paths against the config directory and fill defaults.
    ///
    /// Validates that `bucket` is provided when the S3 backend is selected.
    fn resolve_paths(&mut self, config_dir: &Path) -> Result<(), ConfigError> {
        let db_defaults = DatabaseConfig::default();
        self.database_resolved = DatabaseConfig {
            location: DatabaseConfig::resolve(
                self.database.path.as_deref().unwrap_or("docport.db"),
                config_dir,
            ),
            max_connections: self
                .database
                .max_connections
                .unwrap_or(db_defaults.max_connections),
            busy_timeout: self
                .database
                .busy_timeout_secs
                .map_or(db_defaults.busy_timeout, Duration::from_secs),
        };

        let raw = &self.content;
        let content_defaults = ContentConfig::default();
        let (backend, default_base_url) = match raw.backend.as_deref().unwrap_or("fs") {
            "fs" => (
                ContentBackend::Fs {
                    dir: config_dir.join(raw.dir.as_deref().unwrap_or("content")),
                },
                FS_PUBLIC_BASE_URL.to_owned(),
            ),
            "s3" => {
                let bucket = raw.bucket.clone().ok_or_else(|| {
                    ConfigError::Validation(
                        "content.backend = \"s3\" requires content.bucket to be set".to_owned(),
                    )
                })?;
                let region = raw.region.clone().unwrap_or_else(|| "us-east-1".to_owned());
                let base_url = match &raw.endpoint {
                    Some(endpoint) => format!("{}/{bucket}", endpoint.trim_end_matches('/')),
                    None => format!("https://{bucket}.s3.{region}.amazonaws.com"),
                };
                (
                    ContentBackend::S3 {
                        bucket,
                        region,
                        endpoint: raw.endpoint.clone(),
                    },
                    base_url,
                )
            }
            other => {
                return Err(ConfigError::Validation(format!(
                    "content.backend must be \"fs\" or \"s3\", got \"{other}\""
                )));
            }
        };

        self.content_resolved = ContentConfig {
            backend,
            public_base_url: raw
                .public_base_url
                .clone()
                .unwrap_or(default_base_url)
                .trim_end_matches('/')
                .to_owned(),
            prefix: raw
                .prefix
                .clone()
                .unwrap_or(content_defaults.prefix)
                .trim_matches('/')
                .to_owned(),
            upload_timeout: raw
                .upload_timeout_secs
                .map_or(content_defaults.upload_timeout, Duration::from_secs),
        };

        Ok(())
    }
}
