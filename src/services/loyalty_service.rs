use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sqlx::{SqliteConnection, SqlitePool};

use crate::models::loyalty::{LoyaltyChangeType, LoyaltyHistory, LoyaltyPoint, LoyaltySummary};
use crate::utils::error::{AppError, AppResult};

/// Currency value of a single loyalty point when redeemed.
pub const POINT_VALUE: Decimal = dec!(0.10);

/// Amount spent per point earned.
pub const SPEND_PER_POINT: Decimal = dec!(10);

/// Points earned on a finalized amount: one point per 10 currency units.
pub fn points_earned_for(final_amount: Decimal) -> i64 {
    if final_amount <= Decimal::ZERO {
        return 0;
    }
    (final_amount / SPEND_PER_POINT).floor().to_i64().unwrap_or(0)
}

/// Discount bought by redeeming `points`, capped at `remaining` so the
/// total discount never exceeds the subtotal.
pub fn points_discount(points: i64, remaining: Decimal) -> Decimal {
    (Decimal::from(points) * POINT_VALUE).min(remaining.max(Decimal::ZERO))
}

/// The loyalty ledger: one balance row per customer plus an append-only
/// history. Mutations take a connection so they run inside the caller's
/// transaction.
#[derive(Clone)]
pub struct LoyaltyService {
    pool: SqlitePool,
}

impl LoyaltyService {
    pub fn new(pool: SqlitePool) -> Self {
        LoyaltyService { pool }
    }

    // Customers without a ledger row have zero points
    pub async fn balance(&self, customer_id: i64) -> AppResult<i64> {
        let points: Option<i64> =
            sqlx::query_scalar("SELECT points FROM loyalty_points WHERE customer_id = ?")
                .bind(customer_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(points.unwrap_or(0))
    }

    pub async fn summary(&self, customer_id: i64) -> AppResult<LoyaltySummary> {
        let account = sqlx::query_as::<_, LoyaltyPoint>(
            "SELECT * FROM loyalty_points WHERE customer_id = ?",
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?;

        let history = sqlx::query_as::<_, LoyaltyHistory>(
            r#"
            SELECT * FROM loyalty_history
            WHERE customer_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(LoyaltySummary {
            customer_id,
            balance: account.as_ref().map_or(0, |a| a.points),
            updated_at: account.map(|a| a.updated_at),
            history,
        })
    }

    pub async fn ensure_account(
        conn: &mut SqliteConnection,
        customer_id: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loyalty_points (customer_id, points, updated_at)
            VALUES (?, 0, ?)
            ON CONFLICT (customer_id) DO NOTHING
            "#,
        )
        .bind(customer_id)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Take `points` from the customer's balance. Fails without writing
    /// anything if the balance does not cover it.
    pub async fn debit(
        conn: &mut SqliteConnection,
        customer_id: i64,
        points: i64,
        booking_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if points <= 0 {
            return Err(AppError::ValidationError("Debit must be positive".into()));
        }

        let result = sqlx::query(
            r#"
            UPDATE loyalty_points
            SET points = points - ?, updated_at = ?
            WHERE customer_id = ? AND points >= ?
            "#,
        )
        .bind(points)
        .bind(now)
        .bind(customer_id)
        .bind(points)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            let available: Option<i64> =
                sqlx::query_scalar("SELECT points FROM loyalty_points WHERE customer_id = ?")
                    .bind(customer_id)
                    .fetch_optional(&mut *conn)
                    .await?;
            return Err(AppError::InsufficientPoints {
                requested: points,
                available: available.unwrap_or(0),
            });
        }

        Self::append_history(conn, customer_id, booking_id, LoyaltyChangeType::Use, points, now).await
    }

    pub async fn credit(
        conn: &mut SqliteConnection,
        customer_id: i64,
        points: i64,
        booking_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        if points <= 0 {
            return Err(AppError::ValidationError("Credit must be positive".into()));
        }

        let result = sqlx::query(
            r#"
            UPDATE loyalty_points
            SET points = points + ?, updated_at = ?
            WHERE customer_id = ?
            "#,
        )
        .bind(points)
        .bind(now)
        .bind(customer_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "No loyalty account for customer {customer_id}"
            )));
        }

        Self::append_history(conn, customer_id, booking_id, LoyaltyChangeType::Earn, points, now).await
    }

    async fn append_history(
        conn: &mut SqliteConnection,
        customer_id: i64,
        booking_id: Option<i64>,
        change_type: LoyaltyChangeType,
        points: i64,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO loyalty_history (customer_id, booking_id, change_type, points, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(customer_id)
        .bind(booking_id)
        .bind(change_type)
        .bind(points)
        .bind(now)
        .execute(conn)
        .await?;
        Ok(())
    }
}
