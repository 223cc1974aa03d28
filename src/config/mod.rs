mod file_config;

pub use file_config::FileConfig;

use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub db_path: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub read_pool_size: usize,
    pub enable_debug_routes: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub read_pool_size: usize,
    pub enable_debug_routes: bool,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_path = file
            .db_path
            .map(PathBuf::from)
            .or_else(|| cli.db_path.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("db_path must be specified via --db-path or in config file")
            })?;

        if db_path.is_dir() {
            bail!("db_path is a directory: {:?}", db_path);
        }
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                bail!("Database directory does not exist: {:?}", parent);
            }
        }

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let read_pool_size = file.read_pool_size.unwrap_or(cli.read_pool_size);
        if read_pool_size == 0 {
            bail!("read_pool_size must be at least 1");
        }

        let enable_debug_routes = file
            .enable_debug_routes
            .unwrap_or(cli.enable_debug_routes);

        Ok(Self {
            db_path,
            port,
            metrics_port,
            logging_level,
            read_pool_size,
            enable_debug_routes,
        })
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            enable_debug_routes: self.enable_debug_routes,
        }
    }
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
