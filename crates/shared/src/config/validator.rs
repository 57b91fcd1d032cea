//! Configuration validation.
//!
//! Hand-rolled checks; we only need to catch obviously broken values before
//! the process starts talking to real infrastructure.

use super::dto::ServiceConfig;
use super::error::{ConfigError, Result};

/// Validate a PostgreSQL connection URL.
pub fn validate_database_url(url: &str) -> Result<()> {
    if url.is_empty() {
        return Err(ConfigError::InvalidDatabaseUrl(
            "database URL cannot be empty".to_string(),
        ));
    }
    if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
        return Err(ConfigError::InvalidDatabaseUrl(format!(
            "database URL must start with postgres:// or postgresql://, got: {url}"
        )));
    }
    Ok(())
}

/// Validate a NATS connection URL.
pub fn validate_nats_url(url: &str) -> Result<()> {
    if !url.starts_with("nats://") && !url.starts_with("tls://") {
        return Err(ConfigError::InvalidUrl(format!(
            "NATS URL must start with nats:// or tls://, got: {url}"
        )));
    }
    Ok(())
}

/// Validate an http(s) URL for the mail gateway or downstream service.
pub fn validate_http_url(url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::InvalidUrl(format!(
            "expected an http:// or https:// URL, got: {url}"
        )));
    }
    Ok(())
}

/// Validate a broker subject name.
///
/// Subjects must be non-empty and must not contain whitespace or the NATS
/// wildcard tokens; consumers subscribe to exact subjects only.
pub fn validate_subject(subject: &str) -> Result<()> {
    if subject.is_empty() {
        return Err(ConfigError::InvalidSubject(
            "subject cannot be empty".to_string(),
        ));
    }
    if subject.chars().any(|c| c.is_whitespace()) || subject.contains('*') || subject.contains('>')
    {
        return Err(ConfigError::InvalidSubject(format!(
            "subject may not contain whitespace or wildcards: {subject}"
        )));
    }
    Ok(())
}

/// Validate a complete service configuration.
pub fn validate_service_config(config: &ServiceConfig) -> Result<()> {
    validate_database_url(&config.database.url)?;
    validate_nats_url(&config.nats.url)?;
    validate_http_url(&config.mail.endpoint)?;
    validate_http_url(&config.mail.verify_link_base)?;
    validate_http_url(&config.downstream.base_url)?;
    validate_subject(&config.topics.intake_subject)?;
    validate_subject(&config.topics.verify_subject)?;

    if config.database.pool_size == 0 {
        return Err(ConfigError::InvalidValue {
            var: "VERIFLOW_DB_POOL_SIZE".to_string(),
            value: "0".to_string(),
        });
    }
    if config.mail.api_key.trim().is_empty() {
        return Err(ConfigError::MissingRequired {
            var: "VERIFLOW_MAIL_API_KEY".to_string(),
        });
    }
    if config.downstream.failure_threshold == 0 {
        return Err(ConfigError::InvalidValue {
            var: "VERIFLOW_CB_FAILURE_THRESHOLD".to_string(),
            value: "0".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_postgres_urls() {
        assert!(validate_database_url("postgresql://u:p@localhost:5432/users").is_ok());
        assert!(validate_database_url("postgres://localhost:5432/users").is_ok());
    }

    #[test]
    fn rejects_non_postgres_urls() {
        assert!(validate_database_url("mysql://localhost/users").is_err());
        assert!(validate_database_url("").is_err());
    }

    #[test]
    fn rejects_http_for_nats() {
        assert!(validate_nats_url("http://localhost:4222").is_err());
        assert!(validate_nats_url("nats://localhost:4222").is_ok());
    }

    #[test]
    fn rejects_wildcard_subjects() {
        assert!(validate_subject("registration-intake").is_ok());
        assert!(validate_subject("events.>").is_err());
        assert!(validate_subject("events.*").is_err());
        assert!(validate_subject("").is_err());
    }

    #[test]
    fn accepts_https_urls() {
        assert!(validate_http_url("https://mail.example.com/v3/send").is_ok());
        assert!(validate_http_url("ftp://mail.example.com").is_err());
    }
}
