//! Splat Catalog Server Library
//!
//! A music catalog (artists, albums, songs, playlists and daily play counts)
//! stored in SQLite and served over HTTP.

pub mod catalog_store;
pub mod config;
pub mod server;
pub mod sqlite_persistence;

// Re-export commonly used types for convenience
pub use catalog_store::{CatalogError, CatalogStore, SqliteCatalogStore};
pub use server::{run_server, RequestsLoggingLevel};
