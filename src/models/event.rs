use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use strum_macros::{Display, EnumString};

use crate::utils::money::decimal_column;

// Event Status Enum
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventStatus {
    Upcoming,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub ticket_price: Decimal,
    pub total_capacity: i64,
    pub status: EventStatus,
    pub category_id: i64,
    pub venue_id: i64,
    pub organizer_id: i64,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Event {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Event {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            event_date: row.try_get("event_date")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            ticket_price: decimal_column(row, "ticket_price")?,
            total_capacity: row.try_get("total_capacity")?,
            status: row.try_get("status")?,
            category_id: row.try_get("category_id")?,
            venue_id: row.try_get("venue_id")?,
            organizer_id: row.try_get("organizer_id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

// Event with its catalog data (venue, category, images) and remaining seats
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct EventDetail {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub event_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue_name: Option<String>,
    pub location: Option<String>,
    pub category: Option<String>,
    pub ticket_price: Decimal,
    pub total_capacity: i64,
    pub available_tickets: i64,
    pub status: EventStatus,
    pub organizer_id: i64,
    pub images: Vec<String>,
}

impl<'r> FromRow<'r, SqliteRow> for EventDetail {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(EventDetail {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            event_date: row.try_get("event_date")?,
            start_time: row.try_get("start_time")?,
            end_time: row.try_get("end_time")?,
            venue_name: row.try_get("venue_name")?,
            location: row.try_get("location")?,
            category: row.try_get("category")?,
            ticket_price: decimal_column(row, "ticket_price")?,
            total_capacity: row.try_get("total_capacity")?,
            available_tickets: row.try_get("available_tickets")?,
            status: row.try_get("status")?,
            organizer_id: row.try_get("organizer_id")?,
            images: Vec::new(),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, JsonSchema, EnumString, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventSort {
    #[default]
    DateAsc,
    DateDesc,
    PriceAsc,
    PriceDesc,
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct EventSearchQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub location: Option<String>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    #[serde(default)]
    pub sort: EventSort,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct EventSearchResponse {
    pub count: usize,
    pub events: Vec<EventDetail>,
}

// Everything a customer needs to fill in the booking form
#[derive(Debug, Serialize, JsonSchema)]
pub struct BookablePage {
    pub event: EventDetail,
    pub available_tickets: i64,
    pub ticket_price: Decimal,
    pub loyalty_balance: i64,
}
