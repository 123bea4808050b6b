pub mod paypal;
pub mod stripe;

use async_trait::async_trait;

use crate::errors::AppError;

/// Opaque token the browser uses to complete a card payment client-side.
#[derive(Debug, Clone)]
pub struct ClientToken {
    pub client_secret: String,
}

/// What creating a redirect-style charge hands back to the client.
#[derive(Debug, Clone)]
pub enum RedirectCharge {
    /// Legacy flow: the customer is sent to the provider's site, which calls
    /// back with payment and payer identifiers.
    Approval {
        payment_id: String,
        approval_url: String,
    },
    /// Order flow: the client approves the order in the browser, then asks
    /// the server to capture it.
    Order { order_id: String },
}

/// Provider reference used to finalize a charge.
#[derive(Debug, Clone)]
pub enum ChargeRef {
    /// Order flow: capture by order id.
    Order { order_id: String },
    /// Legacy flow: execute with the callback's payment and payer ids.
    Redirect {
        payment_id: String,
        payer_id: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChargeStatus {
    Completed,
    Incomplete,
}

/// Result of a finalize attempt. `provider_status` is the provider's own
/// status word (e.g. `COMPLETED`, `DECLINED`) and `payload` the full
/// response body.
#[derive(Debug, Clone)]
pub struct ChargeOutcome {
    pub status: ChargeStatus,
    pub provider_status: String,
    pub payload: serde_json::Value,
}

#[async_trait]
pub trait CardGateway: Send + Sync {
    /// Create a payment intent for `amount` in major currency units and
    /// return the client-side token.
    async fn create_charge_intent(
        &self,
        amount: f64,
        currency: &str,
    ) -> Result<ClientToken, AppError>;
}

#[async_trait]
pub trait RedirectGateway: Send + Sync {
    /// Create a redirect charge. With return/cancel URLs this is the legacy
    /// approval-URL flow; without them, the order flow.
    async fn create_redirect_charge(
        &self,
        amount: f64,
        return_url: Option<&str>,
        cancel_url: Option<&str>,
    ) -> Result<RedirectCharge, AppError>;

    async fn finalize_charge(&self, reference: &ChargeRef) -> Result<ChargeOutcome, AppError>;
}

/// Convert a major-unit amount to integer minor units (cents), rounding to
/// the nearest cent. Negative and non-finite amounts are rejected before any
/// provider call is made.
pub fn to_minor_units(amount: f64) -> Result<i64, AppError> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(AppError::Provider(format!("invalid amount: {amount}")));
    }
    Ok((amount * 100.0).round() as i64)
}

pub fn to_major_units(minor: i64) -> f64 {
    minor as f64 / 100.0
}
