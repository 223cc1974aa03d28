use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::{fmt::Debug, path::PathBuf};
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use splat_catalog_server::catalog_store::SqliteCatalogStore;
use splat_catalog_server::config::{AppConfig, CliConfig, FileConfig};
use splat_catalog_server::server::{metrics, run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to the SQLite catalog database file. Created if missing.
    #[clap(long, value_parser = parse_path)]
    pub db_path: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 5000)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// Number of read-only database connections.
    #[clap(long, default_value_t = 4)]
    pub read_pool_size: usize,

    /// Mount the unauthenticated /debug/query and /debug/reset routes.
    #[clap(long)]
    pub enable_debug_routes: bool,

    /// Optional TOML config file. Its values override the CLI arguments.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_path: self.db_path.clone(),
            port: self.port,
            metrics_port: self.metrics_port,
            logging_level: self.logging_level.clone(),
            read_pool_size: self.read_pool_size,
            enable_debug_routes: self.enable_debug_routes,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };
    let app_config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;

    metrics::init_metrics();

    info!("Opening catalog database {:?}...", app_config.db_path);
    let catalog_store = SqliteCatalogStore::new(&app_config.db_path, app_config.read_pool_size)?;

    if app_config.enable_debug_routes {
        info!("Debug routes are enabled, /debug/query accepts arbitrary SQL");
    }

    run_server(app_config.server_config(), Arc::new(catalog_store)).await
}
