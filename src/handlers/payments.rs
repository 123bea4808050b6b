use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::PendingBooking;
use crate::services::checkout;
use crate::services::payments::RedirectCharge;
use crate::state::AppState;

use super::bookings::BookingResponse;

// POST /api/payment/card-intent
#[derive(Deserialize)]
pub struct CardIntentRequest {
    pub amount: f64,
    pub currency: Option<String>,
}

pub async fn create_card_intent(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CardIntentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let currency = body.currency.as_deref().unwrap_or("USD");
    let token = state.cards.create_charge_intent(body.amount, currency).await?;

    let publishable_key = state.settings.get().stripe_publishable_key.clone();
    Ok(Json(serde_json::json!({
        "client_secret": token.client_secret,
        "publishable_key": publishable_key,
    })))
}

// POST /api/payment/redirect
//
// With return/cancel URLs this is the legacy approval flow: the pending
// booking is persisted up front, keyed by the provider payment id, and the
// customer is sent to the approval URL. Without them it is the order flow:
// nothing is persisted until capture.
#[derive(Deserialize)]
pub struct RedirectChargeRequest {
    pub amount: f64,
    pub return_url: Option<String>,
    pub cancel_url: Option<String>,
    pub booking: Option<PendingBooking>,
}

pub async fn create_redirect_charge(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RedirectChargeRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let charge = state
        .redirects
        .create_redirect_charge(
            body.amount,
            body.return_url.as_deref(),
            body.cancel_url.as_deref(),
        )
        .await?;

    match charge {
        RedirectCharge::Approval {
            payment_id,
            approval_url,
        } => {
            let pending = body.booking.ok_or_else(|| {
                AppError::Invalid("booking details are required for the redirect flow".to_string())
            })?;
            checkout::register_pending(&state, pending, &payment_id)?;

            Ok(Json(serde_json::json!({
                "payment_id": payment_id,
                "approval_url": approval_url,
            })))
        }
        RedirectCharge::Order { order_id } => {
            Ok(Json(serde_json::json!({ "order_id": order_id })))
        }
    }
}

// POST /api/payment/redirect/capture
#[derive(Deserialize)]
pub struct CaptureRequest {
    pub order_id: String,
    pub booking: PendingBooking,
}

pub async fn capture_redirect_charge(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CaptureRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = checkout::confirm_order(&state, &body.order_id, body.booking).await?;
    Ok(Json(booking.into()))
}

// GET /api/payment/redirect/return
//
// Query parameter names match what the provider appends to the return URL.
#[derive(Deserialize)]
pub struct ReturnQuery {
    #[serde(rename = "paymentId")]
    pub payment_id: String,
    #[serde(rename = "PayerID")]
    pub payer_id: String,
}

pub async fn redirect_return(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReturnQuery>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = checkout::confirm_legacy(&state, &query.payment_id, &query.payer_id).await?;
    Ok(Json(booking.into()))
}
