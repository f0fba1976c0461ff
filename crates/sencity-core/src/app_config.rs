use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    /// Browser origins allowed to call the API. Empty outside production
    /// means any origin.
    pub cors_origins: Vec<String>,
    pub log_level: String,
    pub auth_salt: String,
    pub navitia_token: String,
    pub navitia_base_url: String,
    pub navitia_coverage: String,
    pub navitia_timeout_secs: u64,
    pub navitia_max_retries: u32,
    pub navitia_backoff_base_ms: u64,
    /// Walking sections searched for detours at the same time.
    pub detour_concurrency: usize,
    pub closest_poi_radius_m: f64,
    pub place_kinds_path: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("cors_origins", &self.cors_origins)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("auth_salt", &"[redacted]")
            .field("navitia_token", &"[redacted]")
            .field("navitia_base_url", &self.navitia_base_url)
            .field("navitia_coverage", &self.navitia_coverage)
            .field("navitia_timeout_secs", &self.navitia_timeout_secs)
            .field("navitia_max_retries", &self.navitia_max_retries)
            .field("navitia_backoff_base_ms", &self.navitia_backoff_base_ms)
            .field("detour_concurrency", &self.detour_concurrency)
            .field("closest_poi_radius_m", &self.closest_poi_radius_m)
            .field("place_kinds_path", &self.place_kinds_path)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .finish()
    }
}
