mod analytics;
mod error;
mod lookup;
mod models;
mod mutations;
mod raw_query;
mod schema;
mod store;
mod trait_def;
pub mod validation;

pub use error::{CatalogError, CatalogResult};
pub use models::*;
pub use raw_query::RawRow;
pub use schema::CATALOG_VERSIONED_SCHEMAS;
pub use store::SqliteCatalogStore;
pub use trait_def::CatalogStore;
