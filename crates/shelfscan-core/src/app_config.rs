use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub log_level: String,
    /// Optional YAML file of retailer profiles layered over the built-ins.
    pub retailers_path: Option<PathBuf>,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Maximum number of payloads fetched at once by the CLI supplier.
    pub max_concurrent_fetches: usize,
    /// Depth cap for the embedded-state tree search.
    pub max_traversal_depth: usize,
}
