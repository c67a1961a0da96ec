use crate::app_config::AppConfig;
use crate::ConfigError;

/// Default browser-like user agent for the payload supplier. Several retailer
/// storefronts refuse requests from obviously non-browser clients.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Upper bound accepted for `SHELFSCAN_MAX_TRAVERSAL_DEPTH`.
pub const MAX_TRAVERSAL_DEPTH_LIMIT: usize = 64;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a pure
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let log_level = or_default("SHELFSCAN_LOG_LEVEL", "info");
    let retailers_path = lookup("SHELFSCAN_RETAILERS_PATH")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from);

    let request_timeout_secs = parse_u64("SHELFSCAN_REQUEST_TIMEOUT_SECS", "30")?;
    if request_timeout_secs == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHELFSCAN_REQUEST_TIMEOUT_SECS".to_string(),
            reason: "must be greater than zero".to_string(),
        });
    }
    let user_agent = or_default("SHELFSCAN_USER_AGENT", DEFAULT_USER_AGENT);

    let max_concurrent_fetches = parse_usize("SHELFSCAN_MAX_CONCURRENT_FETCHES", "3")?.max(1);

    let max_traversal_depth = parse_usize("SHELFSCAN_MAX_TRAVERSAL_DEPTH", "10")?;
    if !(1..=MAX_TRAVERSAL_DEPTH_LIMIT).contains(&max_traversal_depth) {
        return Err(ConfigError::InvalidEnvVar {
            var: "SHELFSCAN_MAX_TRAVERSAL_DEPTH".to_string(),
            reason: format!("must be between 1 and {MAX_TRAVERSAL_DEPTH_LIMIT}"),
        });
    }

    Ok(AppConfig {
        log_level,
        retailers_path,
        request_timeout_secs,
        user_agent,
        max_concurrent_fetches,
        max_traversal_depth,
    })
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
