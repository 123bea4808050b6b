use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;

use super::Mailer;
use crate::services::settings::SettingsHandle;

/// Sends plain-text mail through the SendGrid v3 API. The from-address and
/// API key come from the settings snapshot at send time, so credential
/// changes apply without a restart.
pub struct SendGridMailer {
    settings: SettingsHandle,
    client: reqwest::Client,
}

impl SendGridMailer {
    pub fn new(settings: SettingsHandle) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl Mailer for SendGridMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        let settings = self.settings.get();
        anyhow::ensure!(!settings.mail_api_key.is_empty(), "mail API key not configured");

        let payload = json!({
            "personalizations": [{ "to": [{ "email": to }] }],
            "from": { "email": settings.mail_user },
            "subject": subject,
            "content": [{ "type": "text/plain", "value": body }],
        });

        self.client
            .post("https://api.sendgrid.com/v3/mail/send")
            .bearer_auth(&settings.mail_api_key)
            .json(&payload)
            .send()
            .await
            .context("failed to send mail")?
            .error_for_status()
            .context("mail API returned error")?;

        Ok(())
    }
}
