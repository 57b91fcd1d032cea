//! Outbound mail port and the verification email composer.

use async_trait::async_trait;
use thiserror::Error;

use crate::shared_kernel::{EmailAddress, VerificationId};

/// An outbound email. The gateway contract is subject, HTML body and
/// recipients; success or failure is all it reports back.
#[derive(Debug, Clone)]
pub struct MailMessage {
    pub subject: String,
    pub html_body: String,
    pub to: Vec<String>,
}

/// Errors sending mail through the gateway.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail gateway returned status {status}")]
    Gateway { status: u16 },

    #[error("mail gateway unreachable: {reason}")]
    Transport { reason: String },
}

/// Mail gateway port.
#[async_trait]
pub trait MailSender: Send + Sync {
    async fn send(&self, mail: &MailMessage) -> Result<(), MailError>;
}

/// Compose the verification email for a freshly created record.
///
/// The link embeds the verification token as a query parameter on the
/// configured base URL.
pub fn verification_email(
    link_base: &str,
    id: VerificationId,
    recipient: &EmailAddress,
) -> MailMessage {
    let link = format!("{}?id={}", link_base.trim_end_matches('/'), id);
    MailMessage {
        subject: "Verify your email address".to_string(),
        html_body: format!(
            "<h1>Verify your email</h1>\n<p><a href=\"{link}\">Confirm your registration</a></p>"
        ),
        to: vec![recipient.as_str().to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_embeds_the_token() {
        let id = VerificationId::new();
        let recipient = EmailAddress::parse("alice@example.com").unwrap();
        let mail = verification_email("https://acc.example.com/verify", id, &recipient);
        assert!(mail.html_body.contains(&id.to_string()));
        assert!(mail
            .html_body
            .contains("https://acc.example.com/verify?id="));
        assert_eq!(mail.to, vec!["alice@example.com".to_string()]);
    }

    #[test]
    fn trailing_slash_on_base_is_normalized() {
        let id = VerificationId::new();
        let recipient = EmailAddress::parse("alice@example.com").unwrap();
        let mail = verification_email("https://acc.example.com/verify/", id, &recipient);
        assert!(!mail.html_body.contains("verify/?id="));
    }
}
