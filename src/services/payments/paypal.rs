use async_trait::async_trait;
use serde_json::json;

use super::{
    to_minor_units, ChargeOutcome, ChargeRef, ChargeStatus, RedirectCharge, RedirectGateway,
};
use crate::errors::AppError;
use crate::models::SiteSettings;
use crate::services::settings::SettingsHandle;

/// PayPal adapter covering both supported shapes: the v2 Orders API
/// (create + capture) and the legacy v1 Payments API (redirect + execute).
pub struct PayPalGateway {
    settings: SettingsHandle,
    api_base: String,
    client: reqwest::Client,
}

impl PayPalGateway {
    pub fn new(settings: SettingsHandle, api_base: String) -> Self {
        Self {
            settings,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn access_token(&self, settings: &SiteSettings) -> Result<String, AppError> {
        let resp = self
            .client
            .post(format!("{}/v1/oauth2/token", self.api_base))
            .basic_auth(
                &settings.paypal_client_id,
                Some(&settings.paypal_client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("PayPal token request failed: {e}")))?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("failed to parse PayPal token response: {e}")))?;

        if !status.is_success() {
            let msg = data["error_description"]
                .as_str()
                .unwrap_or("unknown error");
            return Err(AppError::Provider(format!(
                "PayPal auth error ({status}): {msg}"
            )));
        }

        data["access_token"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::Provider("missing access_token in PayPal response".into()))
    }

    async fn post_json(
        &self,
        token: &str,
        url: String,
        body: serde_json::Value,
    ) -> Result<(reqwest::StatusCode, serde_json::Value), AppError> {
        let resp = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Provider(format!("PayPal request failed: {e}")))?;

        let status = resp.status();
        let data: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| AppError::Provider(format!("failed to parse PayPal response: {e}")))?;
        Ok((status, data))
    }
}

#[async_trait]
impl RedirectGateway for PayPalGateway {
    async fn create_redirect_charge(
        &self,
        amount: f64,
        return_url: Option<&str>,
        cancel_url: Option<&str>,
    ) -> Result<RedirectCharge, AppError> {
        let settings = self.settings.get();
        if settings.paypal_client_id.is_empty() || settings.paypal_client_secret.is_empty() {
            return Err(AppError::ProviderUnconfigured);
        }

        // Validate before touching the network.
        to_minor_units(amount)?;
        let value = format!("{amount:.2}");

        let token = self.access_token(&settings).await?;

        match (return_url, cancel_url) {
            (Some(return_url), cancel_url) => {
                // Legacy redirect flow via the v1 Payments API.
                let body = json!({
                    "intent": "sale",
                    "payer": { "payment_method": "paypal" },
                    "transactions": [{ "amount": { "total": value, "currency": "USD" } }],
                    "redirect_urls": {
                        "return_url": return_url,
                        "cancel_url": cancel_url.unwrap_or(return_url),
                    },
                });
                let (status, data) = self
                    .post_json(&token, format!("{}/v1/payments/payment", self.api_base), body)
                    .await?;

                if !status.is_success() {
                    let msg = data["message"].as_str().unwrap_or("unknown error");
                    return Err(AppError::Provider(format!(
                        "PayPal payment creation failed ({status}): {msg}"
                    )));
                }

                let payment_id = data["id"]
                    .as_str()
                    .ok_or_else(|| AppError::Provider("missing id in PayPal response".into()))?
                    .to_string();
                let approval_url = data["links"]
                    .as_array()
                    .and_then(|links| {
                        links
                            .iter()
                            .find(|l| l["rel"].as_str() == Some("approval_url"))
                    })
                    .and_then(|l| l["href"].as_str())
                    .ok_or_else(|| {
                        AppError::Provider("missing approval_url in PayPal response".into())
                    })?
                    .to_string();

                Ok(RedirectCharge::Approval {
                    payment_id,
                    approval_url,
                })
            }
            (None, _) => {
                // Order flow via the v2 Orders API.
                let body = json!({
                    "intent": "CAPTURE",
                    "purchase_units": [{ "amount": { "currency_code": "USD", "value": value } }],
                });
                let (status, data) = self
                    .post_json(&token, format!("{}/v2/checkout/orders", self.api_base), body)
                    .await?;

                if !status.is_success() {
                    let msg = data["message"].as_str().unwrap_or("unknown error");
                    return Err(AppError::Provider(format!(
                        "PayPal order creation failed ({status}): {msg}"
                    )));
                }

                let order_id = data["id"]
                    .as_str()
                    .ok_or_else(|| AppError::Provider("missing id in PayPal response".into()))?
                    .to_string();

                Ok(RedirectCharge::Order { order_id })
            }
        }
    }

    async fn finalize_charge(&self, reference: &ChargeRef) -> Result<ChargeOutcome, AppError> {
        let settings = self.settings.get();
        if settings.paypal_client_id.is_empty() || settings.paypal_client_secret.is_empty() {
            return Err(AppError::ProviderUnconfigured);
        }

        let token = self.access_token(&settings).await?;

        let (status_field, http_status, data, terminal) = match reference {
            ChargeRef::Order { order_id } => {
                let (status, data) = self
                    .post_json(
                        &token,
                        format!("{}/v2/checkout/orders/{order_id}/capture", self.api_base),
                        json!({}),
                    )
                    .await?;
                ("status", status, data, "COMPLETED")
            }
            ChargeRef::Redirect {
                payment_id,
                payer_id,
            } => {
                let (status, data) = self
                    .post_json(
                        &token,
                        format!("{}/v1/payments/payment/{payment_id}/execute", self.api_base),
                        json!({ "payer_id": payer_id }),
                    )
                    .await?;
                ("state", status, data, "approved")
            }
        };

        let provider_status = data[status_field]
            .as_str()
            .or_else(|| data["name"].as_str())
            .unwrap_or("UNKNOWN")
            .to_string();

        // Only an explicit terminal-success state counts as completed; a
        // declined capture or provider-side error body is an incomplete
        // charge, not a transport failure.
        let status = if http_status.is_success() && provider_status == terminal {
            ChargeStatus::Completed
        } else {
            ChargeStatus::Incomplete
        };

        Ok(ChargeOutcome {
            status,
            provider_status,
            payload: data,
        })
    }
}
