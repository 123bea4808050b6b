use std::env;

/// Environment-level configuration. The provider credentials here are
/// fallbacks only, used when no settings row has been saved through the
/// admin API yet.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_secret: String,
    pub paypal_client_id: String,
    pub paypal_client_secret: String,
    pub paypal_api_base: String,
    pub stripe_secret_key: String,
    pub stripe_publishable_key: String,
    pub notify_email: String,
    pub mail_user: String,
    pub mail_api_key: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "tinytots.db".to_string()),
            admin_secret: env::var("ADMIN_SECRET").unwrap_or_else(|_| "changeme".to_string()),
            paypal_client_id: env::var("PAYPAL_CLIENT_ID").unwrap_or_default(),
            paypal_client_secret: env::var("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
            paypal_api_base: env::var("PAYPAL_API_BASE")
                .unwrap_or_else(|_| "https://api-m.sandbox.paypal.com".to_string()),
            stripe_secret_key: env::var("STRIPE_SECRET_KEY").unwrap_or_default(),
            stripe_publishable_key: env::var("STRIPE_PUBLISHABLE_KEY").unwrap_or_default(),
            notify_email: env::var("NOTIFY_EMAIL").unwrap_or_default(),
            mail_user: env::var("MAIL_USER").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
        }
    }
}
