use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{BlogPost, Booking, BookingStatus, PaymentMethod, SiteSettings};

// ── Bookings ──

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let created_at = booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO bookings (id, name, email, children, price, day, time, service, payment_method, payment_ref, status, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            booking.id,
            booking.name,
            booking.email,
            booking.children,
            booking.price,
            booking.day,
            booking.time,
            booking.service,
            booking.payment_method.as_str(),
            booking.payment_ref,
            booking.status.as_str(),
            created_at,
        ],
    )?;
    Ok(())
}

pub fn list_bookings(conn: &Connection) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, children, price, day, time, service, payment_method, payment_ref, status, created_at
         FROM bookings ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map([], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_booking_by_payment_ref(
    conn: &Connection,
    payment_ref: &str,
) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        "SELECT id, name, email, children, price, day, time, service, payment_method, payment_ref, status, created_at
         FROM bookings WHERE payment_ref = ?1",
        params![payment_ref],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Move a pending booking to paid, setting its provider reference. The
/// status guard in the WHERE clause keeps terminal bookings terminal.
pub fn mark_booking_paid(conn: &Connection, id: &str, payment_ref: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'paid', payment_ref = ?1 WHERE id = ?2 AND status = 'pending'",
        params![payment_ref, id],
    )?;
    Ok(count > 0)
}

pub fn mark_booking_failed(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = 'failed' WHERE id = ?1 AND status = 'pending'",
        params![id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let email: String = row.get(2)?;
    let children: String = row.get(3)?;
    let price: f64 = row.get(4)?;
    let day: String = row.get(5)?;
    let time: String = row.get(6)?;
    let service: String = row.get(7)?;
    let payment_method_str: String = row.get(8)?;
    let payment_ref: Option<String> = row.get(9)?;
    let status_str: String = row.get(10)?;
    let created_at_str: String = row.get(11)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id,
        name,
        email,
        children,
        price,
        day,
        time,
        service,
        payment_method: PaymentMethod::parse(&payment_method_str),
        payment_ref,
        status: BookingStatus::parse(&status_str),
        created_at,
    })
}

// ── Blog posts ──

pub fn create_blog(conn: &Connection, post: &BlogPost) -> anyhow::Result<()> {
    let created_at = post.created_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO blogs (id, title, content, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![post.id, post.title, post.content, created_at],
    )?;
    Ok(())
}

pub fn list_blogs(conn: &Connection) -> anyhow::Result<Vec<BlogPost>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, content, created_at FROM blogs ORDER BY created_at DESC, rowid DESC",
    )?;

    let rows = stmt.query_map([], |row| {
        let id: String = row.get(0)?;
        let title: String = row.get(1)?;
        let content: String = row.get(2)?;
        let created_at_str: String = row.get(3)?;
        Ok((id, title, content, created_at_str))
    })?;

    let mut posts = vec![];
    for row in rows {
        let (id, title, content, created_at_str) = row?;
        let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
            .unwrap_or_else(|_| Utc::now().naive_utc());
        posts.push(BlogPost {
            id,
            title,
            content,
            created_at,
        });
    }
    Ok(posts)
}

pub fn delete_blog(conn: &Connection, id: &str) -> anyhow::Result<bool> {
    let count = conn.execute("DELETE FROM blogs WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ── Site settings ──

pub fn load_settings(conn: &Connection) -> anyhow::Result<Option<SiteSettings>> {
    let result = conn.query_row(
        "SELECT paypal_client_id, paypal_client_secret, stripe_secret_key, stripe_publishable_key, notify_email, mail_user, mail_api_key
         FROM site_settings WHERE id = 1",
        [],
        |row| {
            Ok(SiteSettings {
                paypal_client_id: row.get(0)?,
                paypal_client_secret: row.get(1)?,
                stripe_secret_key: row.get(2)?,
                stripe_publishable_key: row.get(3)?,
                notify_email: row.get(4)?,
                mail_user: row.get(5)?,
                mail_api_key: row.get(6)?,
            })
        },
    );

    match result {
        Ok(settings) => Ok(Some(settings)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Full replacement of the settings singleton. The upsert writes every
/// column, so a save never leaves a mix of old and new values behind.
pub fn save_settings(conn: &Connection, settings: &SiteSettings) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO site_settings (id, paypal_client_id, paypal_client_secret, stripe_secret_key, stripe_publishable_key, notify_email, mail_user, mail_api_key)
         VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(id) DO UPDATE SET
           paypal_client_id = excluded.paypal_client_id,
           paypal_client_secret = excluded.paypal_client_secret,
           stripe_secret_key = excluded.stripe_secret_key,
           stripe_publishable_key = excluded.stripe_publishable_key,
           notify_email = excluded.notify_email,
           mail_user = excluded.mail_user,
           mail_api_key = excluded.mail_api_key",
        params![
            settings.paypal_client_id,
            settings.paypal_client_secret,
            settings.stripe_secret_key,
            settings.stripe_publishable_key,
            settings.notify_email,
            settings.mail_user,
            settings.mail_api_key,
        ],
    )?;
    Ok(())
}
