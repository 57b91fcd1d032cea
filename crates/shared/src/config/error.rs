//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading or validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required configuration variable is missing
    #[error("Missing required configuration: {var}")]
    MissingRequired { var: String },

    /// A configuration variable has an invalid value
    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },

    /// Failed to load .env file
    #[error("Failed to load .env file from {path}: {source}")]
    EnvFileLoad {
        path: PathBuf,
        #[source]
        source: dotenv::Error,
    },

    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Invalid database URL format
    #[error("Invalid database URL: {0}")]
    InvalidDatabaseUrl(String),

    /// Invalid broker subject
    #[error("Invalid broker subject: {0}")]
    InvalidSubject(String),
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_names_the_variable() {
        let err = ConfigError::MissingRequired {
            var: "VERIFLOW_DATABASE_URL".to_string(),
        };
        assert!(err.to_string().contains("VERIFLOW_DATABASE_URL"));
        assert!(err.to_string().contains("Missing required"));
    }

    #[test]
    fn invalid_value_names_variable_and_value() {
        let err = ConfigError::InvalidValue {
            var: "VERIFLOW_DB_POOL_SIZE".to_string(),
            value: "lots".to_string(),
        };
        assert!(err.to_string().contains("VERIFLOW_DB_POOL_SIZE"));
        assert!(err.to_string().contains("lots"));
    }
}
