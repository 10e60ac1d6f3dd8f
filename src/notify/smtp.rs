//! SMTP mail client (STARTTLS with login, e.g. Gmail app passwords)

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::{info, warn};

use crate::core::config::EmailConfig;
use crate::core::{ItineraError, Result};
use crate::notify::{EmailMessage, EmailSender};

/// Sends mail through an authenticated SMTP relay
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Option<String>,
}

fn mailbox(address: &str) -> Result<Mailbox> {
    address
        .trim()
        .parse()
        .map_err(|e| ItineraError::email(format!("Invalid address '{}': {}", address, e)))
}

impl SmtpMailer {
    /// Create a mailer; fails without a password or a login user
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let password = config
            .smtp_password
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ItineraError::config("GMAIL_APP_PASSWORD is not set"))?;

        let user = config
            .smtp_user
            .clone()
            .or_else(|| config.sender.clone())
            .ok_or_else(|| {
                ItineraError::config("Set ITINERA_SMTP_USER or ITINERA_EMAIL_SENDER for SMTP login")
            })?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| ItineraError::email(format!("SMTP relay {}: {}", config.smtp_host, e)))?
            .port(config.smtp_port)
            .credentials(Credentials::new(user.clone(), password))
            .build();

        Ok(Self {
            transport,
            sender: config.sender.clone().or(Some(user)),
        })
    }

    /// Build the HTML message
    fn build_message(sender: &str, message: &EmailMessage) -> Result<lettre::Message> {
        lettre::Message::builder()
            .from(mailbox(sender)?)
            .to(mailbox(&message.recipient)?)
            .subject(message.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(message.body.clone())
            .map_err(|e| ItineraError::email(e.to_string()))
    }
}

#[async_trait]
impl EmailSender for SmtpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        message.validate()?;

        let sender = message
            .sender
            .as_deref()
            .or(self.sender.as_deref())
            .ok_or_else(|| ItineraError::email("No sender address configured"))?;

        let email = Self::build_message(sender, message)?;
        self.transport.send(email).await.map_err(|e| {
            warn!(error = %e, "SMTP delivery failed");
            ItineraError::email(format!("SMTP error: {}", e))
        })?;

        info!(recipient = %message.recipient, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            sender: Some("agent@example.com".into()),
            smtp_user: None,
            smtp_password: Some("app-password".into()),
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_requires_password() {
        let config = EmailConfig {
            smtp_password: None,
            ..config()
        };
        assert!(SmtpMailer::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_sender_falls_back_to_login() {
        let config = EmailConfig {
            sender: None,
            smtp_user: Some("me@gmail.com".into()),
            ..config()
        };
        let mailer = SmtpMailer::from_config(&config).unwrap();
        assert_eq!(mailer.sender.as_deref(), Some("me@gmail.com"));
    }

    #[test]
    fn test_message_is_html() {
        let message = EmailMessage::new(" you@example.com ", "Trip", "<b>$120</b>");
        let email = SmtpMailer::build_message("agent@example.com", &message).unwrap();
        let raw = String::from_utf8(email.formatted()).unwrap();

        assert!(raw.contains("From: agent@example.com"));
        assert!(raw.contains("To: you@example.com"));
        assert!(raw.contains("Subject: Trip"));
        assert!(raw.contains("Content-Type: text/html"));
        assert!(raw.contains("<b>$120</b>"));
    }

    #[test]
    fn test_bad_sender_rejected() {
        let message = EmailMessage::new("you@example.com", "Trip", "body");
        assert!(SmtpMailer::build_message("not an address", &message).is_err());
    }
}
