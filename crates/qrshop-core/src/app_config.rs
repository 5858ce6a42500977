use std::net::SocketAddr;

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
    /// Public base URL of this app; scan links in generated QR codes point here.
    pub app_url: String,
    pub shopify_access_token: String,
    pub shopify_api_version: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub shopify_request_timeout_secs: u64,
    pub shopify_user_agent: String,
    pub shopify_max_retries: u32,
    pub shopify_retry_backoff_base_secs: u64,
    /// Replaces `https://{shop}` as the Admin API origin when set.
    pub shopify_admin_origin: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("app_url", &self.app_url)
            .field("database_url", &"[redacted]")
            .field("shopify_access_token", &"[redacted]")
            .field("shopify_api_version", &self.shopify_api_version)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field(
                "shopify_request_timeout_secs",
                &self.shopify_request_timeout_secs,
            )
            .field("shopify_user_agent", &self.shopify_user_agent)
            .field("shopify_max_retries", &self.shopify_max_retries)
            .field(
                "shopify_retry_backoff_base_secs",
                &self.shopify_retry_backoff_base_secs,
            )
            .field("shopify_admin_origin", &self.shopify_admin_origin)
            .finish()
    }
}
