//! SendGrid v3 mail client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{info, warn};

use crate::core::config::EmailConfig;
use crate::core::{ItineraError, Result};
use crate::notify::{EmailMessage, EmailSender};

/// Sends mail through the SendGrid HTTP API
#[derive(Clone)]
pub struct SendGridMailer {
    client: Client,
    api_url: String,
    api_key: String,
    sender: Option<String>,
}

impl SendGridMailer {
    /// Create a mailer; fails when no API key is configured
    pub fn from_config(config: &EmailConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ItineraError::config("SENDGRID_API_KEY is not set"))?;

        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key,
            sender: config.sender.clone(),
        })
    }

    fn request_body(sender: &str, message: &EmailMessage) -> Value {
        json!({
            "personalizations": [{ "to": [{ "email": message.recipient.trim() }] }],
            "from": { "email": sender },
            "subject": message.subject,
            "content": [{ "type": "text/html", "value": message.body }],
        })
    }
}

#[async_trait]
impl EmailSender for SendGridMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        message.validate()?;

        let sender = message
            .sender
            .as_deref()
            .or(self.sender.as_deref())
            .ok_or_else(|| ItineraError::email("No sender address configured"))?;

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&Self::request_body(sender, message))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%status, "SendGrid rejected message");
            return Err(ItineraError::email(format!(
                "SendGrid API error ({}): {}",
                status, body
            )));
        }

        info!(recipient = %message.recipient, "email sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let config = EmailConfig {
            api_key: None,
            sender: Some("agent@example.com".into()),
            ..EmailConfig::default()
        };
        assert!(SendGridMailer::from_config(&config).is_err());
    }

    #[test]
    fn test_request_body_shape() {
        let message = EmailMessage::new(" you@example.com ", "Trip", "<b>$120</b>");
        let body = SendGridMailer::request_body("agent@example.com", &message);

        assert_eq!(body["personalizations"][0]["to"][0]["email"], "you@example.com");
        assert_eq!(body["from"]["email"], "agent@example.com");
        assert_eq!(body["content"][0]["type"], "text/html");
        assert_eq!(body["content"][0]["value"], "<b>$120</b>");
    }
}
