use chrono::Utc;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PaymentMethod, PendingBooking};
use crate::services::notifications;
use crate::services::payments::{ChargeRef, ChargeStatus};
use crate::state::AppState;

/// Booking confirmation orchestration: ties a payment outcome to booking
/// persistence and notification dispatch, with at-most-once side effects.
/// The gateway does not deduplicate capture attempts; that happens here.

fn materialize(
    pending: PendingBooking,
    payment_method: PaymentMethod,
    status: BookingStatus,
    payment_ref: Option<String>,
) -> Booking {
    Booking {
        id: Uuid::new_v4().to_string(),
        name: pending.name,
        email: pending.email,
        children: pending.children,
        price: pending.price,
        day: pending.day,
        time: pending.time,
        service: pending.service,
        payment_method,
        payment_ref,
        status,
        created_at: Utc::now().naive_utc(),
    }
}

/// Persist a directly submitted booking. Card submissions are treated as
/// settled: the status comes from the caller and notifications fire right
/// away. Redirect submissions stay pending and are notified only after the
/// provider confirms the charge.
pub async fn submit(
    state: &AppState,
    pending: PendingBooking,
    payment_method: PaymentMethod,
    status: BookingStatus,
    payment_ref: Option<String>,
) -> Result<Booking, AppError> {
    if status == BookingStatus::Paid && payment_ref.is_none() {
        return Err(AppError::Invalid(
            "a paid booking requires a payment reference".to_string(),
        ));
    }

    let booking = materialize(pending, payment_method, status, payment_ref);
    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking)?;
    }
    tracing::info!(booking_id = %booking.id, status = booking.status.as_str(), "booking created");

    if payment_method != PaymentMethod::Redirect {
        let settings = state.settings.get();
        notifications::notify_booking(state.mailer.as_ref(), &settings, &booking).await;
    }

    Ok(booking)
}

/// Persist the pending booking for a legacy redirect charge, keyed by the
/// provider payment id so the return callback can find it again.
pub fn register_pending(
    state: &AppState,
    pending: PendingBooking,
    payment_id: &str,
) -> Result<Booking, AppError> {
    let booking = materialize(
        pending,
        PaymentMethod::Redirect,
        BookingStatus::Pending,
        Some(payment_id.to_string()),
    );
    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking)?;
    }
    tracing::info!(booking_id = %booking.id, payment_id, "pending booking registered for redirect charge");
    Ok(booking)
}

/// Order-flow confirmation: capture the order, then persist and notify in
/// one pass. Nothing is persisted unless the provider reports terminal
/// success, and a re-capture of an already confirmed order returns the
/// existing booking without notifying again.
pub async fn confirm_order(
    state: &AppState,
    order_id: &str,
    pending: PendingBooking,
) -> Result<Booking, AppError> {
    let existing = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_payment_ref(&db, order_id)?
    };
    if let Some(booking) = existing {
        tracing::info!(booking_id = %booking.id, order_id, "order already confirmed");
        return Ok(booking);
    }

    let reference = ChargeRef::Order {
        order_id: order_id.to_string(),
    };
    let outcome = state.redirects.finalize_charge(&reference).await?;

    if outcome.status != ChargeStatus::Completed {
        tracing::warn!(order_id, provider_status = %outcome.provider_status, "order capture incomplete");
        return Err(AppError::IncompleteCharge(outcome.provider_status));
    }

    let booking = materialize(
        pending,
        PaymentMethod::Redirect,
        BookingStatus::Paid,
        Some(order_id.to_string()),
    );
    {
        let db = state.db.lock().unwrap();
        queries::create_booking(&db, &booking)?;
    }
    tracing::info!(booking_id = %booking.id, order_id, "order captured, booking paid");

    let settings = state.settings.get();
    notifications::notify_booking(state.mailer.as_ref(), &settings, &booking).await;

    Ok(booking)
}

/// Legacy-flow confirmation: the booking already exists as pending. Execute
/// the payment with the callback identifiers, then move the booking to paid
/// and notify, or to failed when the provider reports anything else.
pub async fn confirm_legacy(
    state: &AppState,
    payment_id: &str,
    payer_id: &str,
) -> Result<Booking, AppError> {
    let mut booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_payment_ref(&db, payment_id)?
    }
    .ok_or_else(|| AppError::NotFound(format!("no booking for payment {payment_id}")))?;

    if booking.status == BookingStatus::Paid {
        tracing::info!(booking_id = %booking.id, payment_id, "payment already confirmed");
        return Ok(booking);
    }

    let reference = ChargeRef::Redirect {
        payment_id: payment_id.to_string(),
        payer_id: payer_id.to_string(),
    };
    let outcome = state.redirects.finalize_charge(&reference).await?;

    if outcome.status != ChargeStatus::Completed {
        {
            let db = state.db.lock().unwrap();
            queries::mark_booking_failed(&db, &booking.id)?;
        }
        tracing::warn!(booking_id = %booking.id, provider_status = %outcome.provider_status, "payment execution failed, booking marked failed");
        return Err(AppError::IncompleteCharge(outcome.provider_status));
    }

    let updated = {
        let db = state.db.lock().unwrap();
        queries::mark_booking_paid(&db, &booking.id, payment_id)?
    };
    if !updated {
        // Lost the race to a concurrent callback; the winner already
        // notified.
        let db = state.db.lock().unwrap();
        return queries::get_booking_by_payment_ref(&db, payment_id)?
            .ok_or_else(|| AppError::NotFound(format!("no booking for payment {payment_id}")));
    }

    booking.status = BookingStatus::Paid;
    booking.payment_ref = Some(payment_id.to_string());
    tracing::info!(booking_id = %booking.id, payment_id, "payment executed, booking paid");

    let settings = state.settings.get();
    notifications::notify_booking(state.mailer.as_ref(), &settings, &booking).await;

    Ok(booking)
}
