use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::models::booking::BookingStatus;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TicketStatus {
    Valid,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct Ticket {
    pub id: i64,
    pub booking_id: i64,
    pub ticket_number: String,
    /// PNG QR code as a `data:` URI
    pub qr_code: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// A ticket ready to be written: number and encoded payload are computed
/// up front so the checkout transaction only does persistence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketDraft {
    pub ticket_number: String,
    pub verify_url: String,
    pub qr_code: String,
}

#[derive(Debug, Serialize, JsonSchema, sqlx::FromRow)]
pub struct TicketVerification {
    pub ticket_number: String,
    pub ticket_status: TicketStatus,
    pub booking_id: i64,
    pub booking_status: BookingStatus,
    pub event_id: i64,
    pub event_title: String,
    pub event_date: NaiveDate,
    #[sqlx(skip)]
    pub admissible: bool,
}
