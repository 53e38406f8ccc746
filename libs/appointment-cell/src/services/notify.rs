use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};

use shared_config::AppConfig;

/// One outgoing email.
#[derive(Debug, Clone)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn new(to: &str, subject: &str, body: String) -> Self {
        Self {
            to: to.to_string(),
            subject: subject.to_string(),
            body,
        }
    }
}

#[derive(Clone)]
pub struct MailerService {
    client: Client,
    base_url: String,
    api_key: String,
}

impl MailerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.api_key.is_empty()
    }

    pub async fn send(&self, notification: &Notification) -> Result<(), String> {
        let response = self
            .client
            .post(format!("{}/send", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "to": notification.to,
                "subject": notification.subject,
                "body": notification.body,
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("Mail provider returned {}", response.status()));
        }

        debug!("Notification sent to {}", notification.to);
        Ok(())
    }

    /// Deliver off the request path. Provider latency or failure must never
    /// affect the outcome of the booking or cancellation that triggered it.
    pub fn send_in_background(&self, notifications: Vec<Notification>) {
        if !self.is_configured() {
            debug!("Mailer not configured, skipping {} notifications", notifications.len());
            return;
        }

        let mailer = self.clone();
        tokio::spawn(async move {
            for notification in notifications {
                if let Err(e) = mailer.send(&notification).await {
                    warn!(
                        "Failed to send '{}' to {}: {}",
                        notification.subject, notification.to, e
                    );
                }
            }
        });
    }
}
