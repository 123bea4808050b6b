use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: String,
    pub name: String,
    pub email: String,
    pub children: String,
    pub price: f64,
    pub day: String,
    pub time: String,
    pub service: String,
    pub payment_method: PaymentMethod,
    pub payment_ref: Option<String>,
    pub status: BookingStatus,
    pub created_at: NaiveDateTime,
}

/// Booking fields as submitted by the client, before an id, status, or
/// provider reference have been assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingBooking {
    pub name: String,
    pub email: String,
    pub children: String,
    pub price: f64,
    pub day: String,
    pub time: String,
    pub service: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Redirect,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Card => "card",
            PaymentMethod::Redirect => "redirect",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "redirect" => PaymentMethod::Redirect,
            _ => PaymentMethod::Card,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Paid,
    Failed,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Paid => "paid",
            BookingStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "paid" => BookingStatus::Paid,
            "failed" => BookingStatus::Failed,
            _ => BookingStatus::Pending,
        }
    }
}
