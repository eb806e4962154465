use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

/// Largest difference tolerated between a client-submitted amount and the
/// amount recomputed by the server.
pub const AMOUNT_TOLERANCE: Decimal = dec!(0.01);

// Round a currency amount to two decimal places
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn within_tolerance(submitted: Decimal, expected: Decimal) -> bool {
    (submitted - expected).abs() <= AMOUNT_TOLERANCE
}

// SQLite has no exact decimal type, amounts are stored as canonical text
pub fn to_db(amount: Decimal) -> String {
    round_currency(amount).normalize().to_string()
}

pub fn decimal_column(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    raw.parse::<Decimal>()
        .map_err(|e| sqlx::Error::ColumnDecode {
            index: column.to_string(),
            source: Box::new(e),
        })
}
