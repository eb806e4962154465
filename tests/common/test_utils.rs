#![allow(dead_code)]

use chrono::{DateTime, Duration, NaiveDate, Utc};
use event_booking_system::db::run_migrations;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Error;

pub const VERIFY_BASE_URL: &str = "http://tickets.test";

pub struct TestDb;

impl TestDb {
    // Fresh in-memory database per test. A single connection that never
    // expires keeps the schema alive for the lifetime of the pool.
    pub async fn new_pool() -> Result<SqlitePool, Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;

        sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;
        run_migrations(&pool).await?;
        Ok(pool)
    }
}

pub async fn insert_user(pool: &SqlitePool, name: &str, role: &str) -> Result<i64, Error> {
    let result = sqlx::query("INSERT INTO users (name, email, role) VALUES (?, ?, ?)")
        .bind(name)
        .bind(format!("{}@example.com", name.to_lowercase().replace(' ', ".")))
        .bind(role)
        .execute(pool)
        .await?;
    Ok(result.last_insert_rowid())
}

pub fn upcoming_date(days: i64) -> NaiveDate {
    (Utc::now() + Duration::days(days)).date_naive()
}

pub struct EventSeed<'a> {
    pub title: &'a str,
    pub category: &'a str,
    pub location: &'a str,
    pub ticket_price: &'a str,
    pub total_capacity: i64,
    pub event_date: NaiveDate,
}

impl Default for EventSeed<'_> {
    fn default() -> Self {
        EventSeed {
            title: "Spring Concert",
            category: "Music",
            location: "Colombo",
            ticket_price: "1000",
            total_capacity: 100,
            event_date: upcoming_date(30),
        }
    }
}

pub async fn insert_event(pool: &SqlitePool, organizer_id: i64, seed: EventSeed<'_>) -> Result<i64, Error> {
    let category_id = sqlx::query("INSERT INTO event_categories (name) VALUES (?)")
        .bind(seed.category)
        .execute(pool)
        .await?
        .last_insert_rowid();

    let venue_id = sqlx::query("INSERT INTO venues (name, location, capacity) VALUES (?, ?, ?)")
        .bind(format!("{} Hall", seed.location))
        .bind(seed.location)
        .bind(seed.total_capacity)
        .execute(pool)
        .await?
        .last_insert_rowid();

    let result = sqlx::query(
        r#"
        INSERT INTO events (
            title, description, event_date, start_time, end_time, ticket_price,
            total_capacity, status, category_id, venue_id, organizer_id, created_at
        )
        VALUES (?, ?, ?, '18:00:00', '22:00:00', ?, ?, 'upcoming', ?, ?, ?, ?)
        "#,
    )
    .bind(seed.title)
    .bind(format!("{} description", seed.title))
    .bind(seed.event_date)
    .bind(seed.ticket_price)
    .bind(seed.total_capacity)
    .bind(category_id)
    .bind(venue_id)
    .bind(organizer_id)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn insert_promotion(
    pool: &SqlitePool,
    code: &str,
    discount_type: &str,
    discount_value: &str,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: &str,
) -> Result<i64, Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO promotions (code, discount_type, discount_value, start_date, end_date, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(code)
    .bind(discount_type)
    .bind(discount_value)
    .bind(start_date)
    .bind(end_date)
    .bind(status)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(result.last_insert_rowid())
}

// Active promotion valid from yesterday to next month
pub async fn insert_active_promotion(
    pool: &SqlitePool,
    code: &str,
    discount_type: &str,
    discount_value: &str,
) -> Result<i64, Error> {
    let now = Utc::now();
    insert_promotion(
        pool,
        code,
        discount_type,
        discount_value,
        now - Duration::days(1),
        now + Duration::days(30),
        "active",
    )
    .await
}

pub async fn set_loyalty_points(pool: &SqlitePool, customer_id: i64, points: i64) -> Result<(), Error> {
    sqlx::query(
        r#"
        INSERT INTO loyalty_points (customer_id, points, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT (customer_id) DO UPDATE SET points = excluded.points
        "#,
    )
    .bind(customer_id)
    .bind(points)
    .bind(Utc::now())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn count_rows(pool: &SqlitePool, table: &str) -> Result<i64, Error> {
    sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
        .fetch_one(pool)
        .await
}
