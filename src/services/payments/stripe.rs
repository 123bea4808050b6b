use async_trait::async_trait;

use super::{to_minor_units, CardGateway, ClientToken};
use crate::errors::AppError;
use crate::services::settings::SettingsHandle;

pub struct StripeGateway {
    settings: SettingsHandle,
    client: reqwest::Client,
}

impl StripeGateway {
    pub fn new(settings: SettingsHandle) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CardGateway for StripeGateway {
    async fn create_charge_intent(
        &self,
        amount: f64,
        currency: &str,
    ) -> Result<ClientToken, AppError> {
        let settings = self.settings.get();
        if settings.stripe_secret_key.is_empty() {
            return Err(AppError::ProviderUnconfigured);
        }

        let minor = to_minor_units(amount)?;
        let form = [
            ("amount", minor.to_string()),
            ("currency", currency.to_lowercase()),
            ("automatic_payment_methods[enabled]", "true".to_string()),
        ];

        let resp = self
            .client
            .post("https://api.stripe.com/v1/payment_intents")
            .bearer_auth(&settings.stripe_secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("Stripe request failed: {e}")))?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("failed to parse Stripe response: {e}")))?;

        if !status.is_success() {
            let msg = data["error"]["message"].as_str().unwrap_or("unknown error");
            return Err(AppError::Provider(format!(
                "Stripe API error ({status}): {msg}"
            )));
        }

        data["client_secret"]
            .as_str()
            .map(|s| ClientToken {
                client_secret: s.to_string(),
            })
            .ok_or_else(|| AppError::Provider("missing client_secret in Stripe response".into()))
    }
}
