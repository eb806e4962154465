use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row};
use strum_macros::{Display, EnumString};

use crate::utils::money::decimal_column;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Fixed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PromotionStatus {
    Active,
    Inactive,
    Expired,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct Promotion {
    pub id: i64,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount_value: Decimal,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: PromotionStatus,
    pub created_at: DateTime<Utc>,
}

impl<'r> FromRow<'r, SqliteRow> for Promotion {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Promotion {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            discount_type: row.try_get("discount_type")?,
            discount_value: decimal_column(row, "discount_value")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

impl Promotion {
    /// Status as seen at `now`. An active promotion past its end date reads
    /// as expired; the stored row is left untouched.
    pub fn effective_status(&self, now: DateTime<Utc>) -> PromotionStatus {
        if self.status == PromotionStatus::Active && now > self.end_date {
            PromotionStatus::Expired
        } else {
            self.status
        }
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.status == PromotionStatus::Active && self.start_date <= now && now <= self.end_date
    }

    /// Discount granted on an order subtotal. Fixed discounts never exceed
    /// the subtotal.
    pub fn discount_for(&self, subtotal: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::Percentage => subtotal * (self.discount_value / dec!(100)),
            DiscountType::Fixed => self.discount_value.min(subtotal),
        }
    }

    pub fn describe(&self) -> String {
        match self.discount_type {
            DiscountType::Percentage => format!("{}%", self.discount_value.normalize()),
            DiscountType::Fixed => format!("{} Rs", self.discount_value.normalize()),
        }
    }
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct PromotionValidation {
    pub valid: bool,
    pub code: Option<String>,
    pub discount_type: Option<DiscountType>,
    pub discount_value: Option<Decimal>,
    pub message: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ApplyPromoCodeRequest {
    #[serde(default)]
    pub code: String,
    pub total_price: Decimal,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct ApplyPromoCodeResponse {
    pub success: bool,
    pub message: String,
    pub discount: Decimal,
    pub discount_type: Option<DiscountType>,
}
