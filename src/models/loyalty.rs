use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, sqlx::Type, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LoyaltyChangeType {
    Earn,
    Use,
}

#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct LoyaltyPoint {
    pub id: i64,
    pub customer_id: i64,
    pub points: i64,
    pub updated_at: DateTime<Utc>,
}

// Append-only ledger row, `points` is always positive and the direction
// comes from `change_type`
#[derive(Debug, Clone, Serialize, JsonSchema, sqlx::FromRow)]
pub struct LoyaltyHistory {
    pub id: i64,
    pub customer_id: i64,
    pub booking_id: Option<i64>,
    pub change_type: LoyaltyChangeType,
    pub points: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct LoyaltySummary {
    pub customer_id: i64,
    pub balance: i64,
    pub updated_at: Option<DateTime<Utc>>,
    pub history: Vec<LoyaltyHistory>,
}
