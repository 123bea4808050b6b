use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// Singleton operational settings, editable through the admin API. A save
/// replaces the whole record; there is no partial update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSettings {
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub stripe_secret_key: String,
    pub stripe_publishable_key: String,
    pub notify_email: String,
    pub mail_user: String,
    pub mail_api_key: String,
}

impl SiteSettings {
    /// Fallback settings from the environment, used until an admin saves a
    /// record of their own.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            paypal_client_id: config.paypal_client_id.clone(),
            paypal_client_secret: config.paypal_client_secret.clone(),
            stripe_secret_key: config.stripe_secret_key.clone(),
            stripe_publishable_key: config.stripe_publishable_key.clone(),
            notify_email: config.notify_email.clone(),
            mail_user: config.mail_user.clone(),
            mail_api_key: config.mail_api_key.clone(),
        }
    }
}
