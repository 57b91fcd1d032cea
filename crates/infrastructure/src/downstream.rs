//! Circuit-broken HTTP client for the authentication service.
//!
//! Forwards a completed registration as `POST <base>/register` with the
//! email and credential hash. The call runs under the shared circuit
//! breaker, which also owns the per-call timeout. The client never retries;
//! broker redelivery is the retry path.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use veriflow_domain::{
    CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, Credential, EmailAddress,
    ForwardError, RegistrationForwarder,
};
use veriflow_shared::DownstreamConfig;

#[derive(Serialize)]
struct RegisterRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Resilient forwarder over the authentication service's register endpoint.
#[derive(Clone)]
pub struct HttpRegistrationForwarder {
    client: reqwest::Client,
    register_url: String,
    breaker: CircuitBreaker,
}

impl HttpRegistrationForwarder {
    pub fn new(config: &DownstreamConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        let breaker = CircuitBreaker::new(
            "downstream-register",
            CircuitBreakerConfig {
                failure_threshold: config.failure_threshold,
                open_duration: config.open_duration(),
                success_threshold: config.success_threshold,
                call_timeout: config.timeout(),
            },
        );
        Ok(Self {
            client,
            register_url: format!("{}/register", config.base_url.trim_end_matches('/')),
            breaker,
        })
    }

    async fn post_registration(
        &self,
        email: &EmailAddress,
        credential: &Credential,
    ) -> Result<(), ForwardError> {
        let response = self
            .client
            .post(&self.register_url)
            .json(&RegisterRequest {
                email: email.as_str(),
                password: credential.expose(),
            })
            .send()
            .await
            .map_err(|e| ForwardError::Unavailable {
                reason: e.to_string(),
            })?;

        classify_status(response.status().as_u16())
    }
}

/// Map the register endpoint's status code to a forward outcome.
///
/// 4xx means the authentication service made a decision about this
/// registration; retrying cannot change it. Everything else non-2xx is
/// treated as transient.
fn classify_status(status: u16) -> Result<(), ForwardError> {
    match status {
        200..=299 => Ok(()),
        400..=499 => Err(ForwardError::Rejected { status }),
        _ => Err(ForwardError::Unavailable {
            reason: format!("status {status}"),
        }),
    }
}

#[async_trait]
impl RegistrationForwarder for HttpRegistrationForwarder {
    async fn forward(
        &self,
        email: &EmailAddress,
        credential: &Credential,
    ) -> Result<(), ForwardError> {
        match self
            .breaker
            .execute(self.post_registration(email, credential))
            .await
        {
            Ok(()) => {
                debug!(email = %email, "registration accepted downstream");
                Ok(())
            }
            Err(CircuitBreakerError::Open) => Err(ForwardError::CircuitOpen),
            Err(CircuitBreakerError::Timeout) => Err(ForwardError::Timeout),
            Err(CircuitBreakerError::Failed(err)) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_statuses_pass() {
        assert!(classify_status(200).is_ok());
        assert!(classify_status(204).is_ok());
    }

    #[test]
    fn client_errors_are_rejections() {
        assert!(matches!(
            classify_status(409),
            Err(ForwardError::Rejected { status: 409 })
        ));
        assert!(matches!(
            classify_status(400),
            Err(ForwardError::Rejected { status: 400 })
        ));
    }

    #[test]
    fn server_errors_and_oddities_are_transient() {
        assert!(matches!(
            classify_status(500),
            Err(ForwardError::Unavailable { .. })
        ));
        assert!(matches!(
            classify_status(503),
            Err(ForwardError::Unavailable { .. })
        ));
        assert!(matches!(
            classify_status(302),
            Err(ForwardError::Unavailable { .. })
        ));
    }

    #[test]
    fn register_url_is_joined_without_double_slash() {
        let config = DownstreamConfig {
            base_url: "http://auth:8081/".into(),
            timeout_secs: 10,
            failure_threshold: 5,
            open_duration_secs: 30,
            success_threshold: 2,
        };
        let forwarder = HttpRegistrationForwarder::new(&config).unwrap();
        assert_eq!(forwarder.register_url, "http://auth:8081/register");
    }
}
