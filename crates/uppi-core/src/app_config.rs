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
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Upper bound on a single website reachability probe.
    pub validator_timeout_secs: u64,
    pub validator_user_agent: String,
    /// Additional attempts after a write conflict on the same profile.
    pub merge_max_retries: u32,
    pub merge_retry_backoff_ms: u64,
    pub field_weights_path: Option<PathBuf>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("validator_timeout_secs", &self.validator_timeout_secs)
            .field("validator_user_agent", &self.validator_user_agent)
            .field("merge_max_retries", &self.merge_max_retries)
            .field("merge_retry_backoff_ms", &self.merge_retry_backoff_ms)
            .field("field_weights_path", &self.field_weights_path)
            .finish()
    }
}
