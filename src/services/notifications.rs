use crate::models::{Booking, SiteSettings};
use crate::services::mail::Mailer;

/// Best-effort dispatch of the two booking emails: customer confirmation
/// first, then the operator alert. Each send is independently guarded; a
/// failure is logged and never reaches the caller, and never prevents the
/// other send. Skips both silently when mail is not configured.
pub async fn notify_booking(mailer: &dyn Mailer, settings: &SiteSettings, booking: &Booking) {
    if settings.mail_api_key.is_empty() || settings.notify_email.is_empty() {
        tracing::info!(booking_id = %booking.id, "mail not configured, skipping notifications");
        return;
    }

    if let Err(e) = mailer
        .send(
            &booking.email,
            "Your Tiny Tots booking is confirmed",
            &customer_email(booking),
        )
        .await
    {
        tracing::error!(error = %e, booking_id = %booking.id, "failed to send customer confirmation");
    }

    if let Err(e) = mailer
        .send(
            &settings.notify_email,
            "New booking received",
            &operator_email(booking),
        )
        .await
    {
        tracing::error!(error = %e, booking_id = %booking.id, "failed to send operator alert");
    }
}

fn customer_email(b: &Booking) -> String {
    format!(
        "Hi {},\n\nThanks for booking with Tiny Tots!\n\n\
         Service: {}\nDay: {}\nTime: {}\nChildren: {}\nTotal: ${:.2}\n\n\
         We look forward to seeing you.\n\nTiny Tots Childcare",
        b.name, b.service, b.day, b.time, b.children, b.price
    )
}

fn operator_email(b: &Booking) -> String {
    format!(
        "New booking {}\n\nCustomer: {} <{}>\nService: {}\nDay: {}\nTime: {}\n\
         Children: {}\nTotal: ${:.2}\nPayment: {} ({})\nStatus: {}",
        b.id,
        b.name,
        b.email,
        b.service,
        b.day,
        b.time,
        b.children,
        b.price,
        b.payment_method.as_str(),
        b.payment_ref.as_deref().unwrap_or("no reference"),
        b.status.as_str(),
    )
}
