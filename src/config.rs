//! Service configuration
//!
//! Sources, later ones winning: built-in defaults, an optional TOML file,
//! `CLOUDSNAP__SECTION__KEY` environment variables, then the conventional
//! upstream variables such as `OPENAI_API_KEY`.

use crate::error::Result;
use crate::ingest::IngestConfig;
use crate::search::SearchConfig;
use crate::upstream::UpstreamConfig;
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub library: LibraryConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum JSON request body size in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8081 }
fn default_max_body_bytes() -> usize { 1024 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| crate::error::Error::Configuration(format!("invalid listen address: {}", e)))
    }
}

/// Photo library configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LibraryConfig {
    /// Directory the upload collaborator stores photos in
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
    /// URL prefix photos are served under
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
}

fn default_uploads_dir() -> PathBuf { PathBuf::from("uploads") }
fn default_public_prefix() -> String { "/uploads".to_string() }

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            uploads_dir: default_uploads_dir(),
            public_prefix: default_public_prefix(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    #[serde(default = "default_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}

impl Config {
    /// Load from `.env`, `config.toml` (if present) and the environment
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_file(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific file (optional) layered under the environment
    pub fn from_file(path: &str) -> Result<Self> {
        let config: Config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CLOUDSNAP").separator("__"))
            .build()?
            .try_deserialize()?;

        Ok(config.with_env_overrides())
    }

    /// Parse a TOML document, without consulting the environment
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::from_str(contents, config::FileFormat::Toml))
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    fn with_env_overrides(mut self) -> Self {
        self.upstream = self.upstream.from_env();
        self
    }
}
