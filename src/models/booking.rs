use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use strum_macros::{Display, EnumString};
use validator::{Validate, ValidationError};

use crate::models::payment::Payment;
use crate::models::ticket::Ticket;
use crate::utils::money::decimal_column;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

// Booking Status Enum
// "Canceled" is accepted on input, "cancelled" is what gets stored
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Booking {
    pub id: i64,
    pub customer_id: i64,
    pub event_id: i64,
    pub number_of_tickets: i64,
    pub ticket_price: Decimal,
    pub total_amount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub promotion_code: Option<String>,
    pub loyalty_used: i64,
    pub loyalty_earned: i64,
    pub payment_status: PaymentStatus,
    pub booking_status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Booking {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Booking {
            id: row.try_get("id")?,
            customer_id: row.try_get("customer_id")?,
            event_id: row.try_get("event_id")?,
            number_of_tickets: row.try_get("number_of_tickets")?,
            ticket_price: decimal_column(row, "ticket_price")?,
            total_amount: decimal_column(row, "total_amount")?,
            discount_amount: decimal_column(row, "discount_amount")?,
            final_amount: decimal_column(row, "final_amount")?,
            promotion_code: row.try_get("promotion_code")?,
            loyalty_used: row.try_get("loyalty_used")?,
            loyalty_earned: row.try_get("loyalty_earned")?,
            payment_status: row.try_get("payment_status")?,
            booking_status: row.try_get("booking_status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount < Decimal::ZERO {
        return Err(ValidationError::new("negative_amount"));
    }
    Ok(())
}

// The amounts are the ones displayed to the customer; they are checked
// against a server-side recomputation before anything is stored.
#[derive(Debug, Clone, Deserialize, Validate, JsonSchema)]
pub struct CreateBookingRequest {
    pub event_id: i64,
    #[validate(range(min = 1, message = "At least one ticket must be booked"))]
    pub number_of_tickets: i64,
    pub promo_code: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0, message = "Loyalty points cannot be negative"))]
    pub loyalty_used: i64,
    #[validate(custom(function = "validate_non_negative"))]
    pub total_amount: Decimal,
    #[validate(custom(function = "validate_non_negative"))]
    pub discount_amount: Decimal,
    #[validate(custom(function = "validate_non_negative"))]
    pub final_amount: Decimal,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CreateBookingResponse {
    pub booking_id: i64,
    pub booking_status: BookingStatus,
    pub payment_status: PaymentStatus,
    pub final_amount: Decimal,
}

/// Server-side price breakdown for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct PriceQuote {
    pub total_amount: Decimal,
    pub promotion_discount: Decimal,
    pub loyalty_discount: Decimal,
    pub discount_amount: Decimal,
    pub final_amount: Decimal,
    pub loyalty_earned: i64,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct CheckoutResponse {
    pub booking: Booking,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BookingDetail {
    pub booking: Booking,
    pub event_title: String,
    pub tickets: Vec<Ticket>,
    pub payment: Option<Payment>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateBookingStatusRequest {
    pub status: String,
}

// Booking as seen from the organizer side
#[derive(Debug, Serialize, JsonSchema)]
pub struct OrganizerBooking {
    pub booking: Booking,
    pub event_title: String,
    pub customer_name: String,
    pub tickets: Vec<Ticket>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct OrganizerBookingsResponse {
    pub bookings: Vec<OrganizerBooking>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct EventBookingsResponse {
    pub event_id: i64,
    pub event_title: String,
    pub tickets_sold: i64,
    pub revenue: Decimal,
    pub bookings: Vec<OrganizerBooking>,
}
