use axum::extract::FromRef;

use crate::catalog_store::CatalogStore;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedCatalogStore = Arc<dyn CatalogStore>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub catalog_store: GuardedCatalogStore,
    pub version: String,
}

impl FromRef<ServerState> for GuardedCatalogStore {
    fn from_ref(input: &ServerState) -> Self {
        input.catalog_store.clone()
    }
}
