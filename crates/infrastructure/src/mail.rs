//! HTTP mail gateway client.
//!
//! Talks to a transactional mail API (Brevo-compatible payload shape): one
//! POST per mail, authenticated with an `api-key` header. The gateway's
//! response is the delivery confirmation the intake saga waits for before
//! committing.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use veriflow_domain::{MailError, MailMessage, MailSender};
use veriflow_shared::MailGatewayConfig;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GatewayAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailBody {
    sender: GatewayAddress,
    to: Vec<GatewayAddress>,
    subject: String,
    html_content: String,
}

/// Mail sender backed by an HTTP gateway.
#[derive(Clone)]
pub struct HttpMailGateway {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
}

impl HttpMailGateway {
    pub fn new(config: &MailGatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            sender_email: config.sender_email.clone(),
            sender_name: config.sender_name.clone(),
        })
    }
}

#[async_trait]
impl MailSender for HttpMailGateway {
    async fn send(&self, mail: &MailMessage) -> Result<(), MailError> {
        let body = SendEmailBody {
            sender: GatewayAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: mail
                .to
                .iter()
                .map(|email| GatewayAddress {
                    email: email.clone(),
                    name: None,
                })
                .collect(),
            subject: mail.subject.clone(),
            html_content: mail.html_body.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| MailError::Transport {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Gateway {
                status: status.as_u16(),
            });
        }

        debug!(subject = %mail.subject, "mail accepted by gateway");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_serializes_with_gateway_field_names() {
        let body = SendEmailBody {
            sender: GatewayAddress {
                email: "noreply@example.com".into(),
                name: Some("Veriflow".into()),
            },
            to: vec![GatewayAddress {
                email: "alice@example.com".into(),
                name: None,
            }],
            subject: "Verify your email address".into(),
            html_content: "<p>hi</p>".into(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"htmlContent\""));
        assert!(json.contains("\"sender\""));
        // Absent names are omitted entirely.
        assert!(!json.contains("null"));
    }
}
