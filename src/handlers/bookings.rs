use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::handlers::check_secret;
use crate::models::{Booking, BookingStatus, PaymentMethod, PendingBooking};
use crate::services::checkout;
use crate::state::AppState;

#[derive(Serialize)]
pub struct BookingResponse {
    id: String,
    name: String,
    email: String,
    children: String,
    price: f64,
    day: String,
    time: String,
    service: String,
    payment_method: String,
    payment_ref: Option<String>,
    status: String,
    created_at: String,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            name: b.name,
            email: b.email,
            children: b.children,
            price: b.price,
            day: b.day,
            time: b.time,
            service: b.service,
            payment_method: b.payment_method.as_str().to_string(),
            payment_ref: b.payment_ref,
            status: b.status.as_str().to_string(),
            created_at: b.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

// GET /api/bookings
pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::list_bookings(&db)?
    };

    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    #[serde(flatten)]
    pub booking: PendingBooking,
    pub payment_method: String,
    pub status: Option<String>,
    pub payment_ref: Option<String>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let payment_method = PaymentMethod::parse(&body.payment_method);
    let status = body
        .status
        .as_deref()
        .map(BookingStatus::parse)
        .unwrap_or(BookingStatus::Pending);

    let booking = checkout::submit(
        &state,
        body.booking,
        payment_method,
        status,
        body.payment_ref,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking.into())))
}

// DELETE /api/bookings/:id
#[derive(Deserialize)]
pub struct DeleteRequest {
    pub secret: String,
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<DeleteRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_secret(&state, &body.secret)?;

    let removed = {
        let db = state.db.lock().unwrap();
        queries::delete_booking(&db, &id)?
    };

    if removed {
        Ok(Json(serde_json::json!({ "ok": true })))
    } else {
        Err(AppError::NotFound(format!("booking {id}")))
    }
}
