use super::RequestsLoggingLevel;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub metrics_port: u16,
    /// Mounts `/debug/query` and `/debug/reset`. Neither is authenticated.
    pub enable_debug_routes: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 5000,
            metrics_port: 9091,
            enable_debug_routes: false,
        }
    }
}
