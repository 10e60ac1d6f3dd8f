//! Notify module - delivering finished answers by email

pub mod sendgrid;
pub mod smtp;

use async_trait::async_trait;
use std::sync::Arc;

use crate::core::config::{EmailConfig, EmailTransport};
use crate::core::{ItineraError, Result};

pub use sendgrid::SendGridMailer;
pub use smtp::SmtpMailer;

/// An email carrying a travel answer
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub recipient: String,
    pub subject: String,
    /// HTML or plain text, sent as-is
    pub body: String,
    /// Overrides the configured sender address
    pub sender: Option<String>,
}

impl EmailMessage {
    pub fn new(
        recipient: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            body: body.into(),
            sender: None,
        }
    }

    #[must_use]
    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    /// All fields are required and the recipient must look like an address
    pub fn validate(&self) -> Result<()> {
        if self.recipient.trim().is_empty()
            || self.subject.trim().is_empty()
            || self.body.trim().is_empty()
        {
            return Err(ItineraError::email("All fields are required."));
        }
        if !looks_like_address(&self.recipient) {
            return Err(ItineraError::email(format!(
                "Invalid recipient address: {}",
                self.recipient
            )));
        }
        if let Some(ref sender) = self.sender {
            if !looks_like_address(sender) {
                return Err(ItineraError::email(format!("Invalid sender address: {}", sender)));
            }
        }
        Ok(())
    }
}

fn looks_like_address(address: &str) -> bool {
    match address.trim().split_once('@') {
        Some((user, domain)) => !user.is_empty() && domain.contains('.'),
        None => false,
    }
}

/// Outbound email transport
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Create the mailer selected by `transport`
///
/// Fails when that transport is missing its credentials.
pub fn create_mailer(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    match config.transport {
        EmailTransport::Smtp => Ok(Arc::new(SmtpMailer::from_config(config)?)),
        EmailTransport::SendGrid => Ok(Arc::new(SendGridMailer::from_config(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation() {
        assert!(EmailMessage::new("a@b.com", "Trip", "<p>hi</p>").validate().is_ok());
        assert!(EmailMessage::new("", "Trip", "body").validate().is_err());
        assert!(EmailMessage::new("a@b.com", "", "body").validate().is_err());
        assert!(EmailMessage::new("a@b.com", "Trip", " ").validate().is_err());
        assert!(EmailMessage::new("nobody", "Trip", "body").validate().is_err());
        assert!(EmailMessage::new("a@b.com", "Trip", "body")
            .with_sender("me")
            .validate()
            .is_err());
    }

    #[tokio::test]
    async fn test_create_mailer_follows_transport() {
        let smtp = EmailConfig {
            transport: EmailTransport::Smtp,
            sender: Some("agent@example.com".into()),
            smtp_password: Some("app-password".into()),
            api_key: None,
            ..EmailConfig::default()
        };
        assert!(create_mailer(&smtp).is_ok());

        // SendGrid selected but only SMTP credentials present
        let sendgrid = EmailConfig {
            transport: EmailTransport::SendGrid,
            ..smtp
        };
        assert!(create_mailer(&sendgrid).is_err());
    }
}
