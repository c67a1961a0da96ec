//! Shared domain types and configuration for shelfscan.

pub mod app_config;
pub mod config;
pub mod products;
pub mod retailers;

use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env, DEFAULT_USER_AGENT};
pub use products::{Product, Retailer, StrategyKind};
pub use retailers::{
    load_retailer_profiles, parse_retailer_profiles, FieldMap, FieldOverrides, RetailerProfile,
    RetailerProfiles, RetailersFile, StateMarker,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read retailers file {path}: {source}")]
    RetailersFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse retailers file: {0}")]
    RetailersFileParse(#[source] serde_yaml::Error),

    #[error("retailer profile validation failed: {0}")]
    Validation(String),
}
