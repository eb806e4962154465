use std::collections::HashMap;

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::models::event::{Event, EventDetail, EventSearchQuery, EventSearchResponse, EventSort};
use crate::utils::error::{AppError, AppResult};

const EVENT_DETAIL_SELECT: &str = r#"
    SELECT
        e.id,
        e.title,
        e.description,
        e.event_date,
        e.start_time,
        e.end_time,
        e.ticket_price,
        e.total_capacity,
        e.status,
        e.organizer_id,
        v.name AS venue_name,
        v.location AS location,
        c.name AS category,
        e.total_capacity - COALESCE((
            SELECT SUM(b.number_of_tickets)
            FROM bookings b
            WHERE b.event_id = e.id AND b.booking_status = 'confirmed'
        ), 0) AS available_tickets
    FROM events e
    LEFT JOIN venues v ON v.id = e.venue_id
    LEFT JOIN event_categories c ON c.id = e.category_id
"#;

/// Read-only access to the event catalog.
#[derive(Clone)]
pub struct EventService {
    pool: SqlitePool,
}

impl EventService {
    pub fn new(pool: SqlitePool) -> Self {
        EventService { pool }
    }

    pub async fn find_event(&self, event_id: i64) -> AppResult<Event> {
        sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    /// Seats left once confirmed bookings are taken out. Pending and
    /// cancelled bookings do not hold capacity.
    pub async fn available_tickets(&self, event_id: i64) -> AppResult<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::remaining_capacity(&mut conn, event_id).await
    }

    pub async fn remaining_capacity(conn: &mut SqliteConnection, event_id: i64) -> AppResult<i64> {
        let remaining: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT e.total_capacity - COALESCE((
                SELECT SUM(b.number_of_tickets)
                FROM bookings b
                WHERE b.event_id = e.id AND b.booking_status = 'confirmed'
            ), 0)
            FROM events e
            WHERE e.id = ?
            "#,
        )
        .bind(event_id)
        .fetch_optional(conn)
        .await?;

        remaining.ok_or_else(|| AppError::NotFound("Event not found".into()))
    }

    pub async fn get_event_detail(&self, event_id: i64) -> AppResult<EventDetail> {
        let mut event = sqlx::query_as::<_, EventDetail>(&format!("{EVENT_DETAIL_SELECT} WHERE e.id = ?"))
            .bind(event_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".into()))?;

        let mut images = self.images_for(&[event.id]).await?;
        event.images = images.remove(&event.id).unwrap_or_default();
        Ok(event)
    }

    // Search upcoming events
    pub async fn search_events(&self, query: EventSearchQuery) -> AppResult<EventSearchResponse> {
        let today = Utc::now().date_naive();

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(EVENT_DETAIL_SELECT);
        builder.push(" WHERE e.status = 'upcoming' AND e.event_date >= ");
        builder.push_bind(query.from.map_or(today, |from| from.max(today)));

        if let Some(to) = query.to {
            builder.push(" AND e.event_date <= ").push_bind(to);
        }

        if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", search.trim());
            builder
                .push(" AND (e.title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR e.description LIKE ")
                .push_bind(pattern.clone())
                .push(" OR v.location LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        if let Some(category) = query
            .category
            .as_deref()
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
        {
            builder
                .push(" AND LOWER(c.name) = LOWER(")
                .push_bind(category.to_string())
                .push(")");
        }

        if let Some(location) = query
            .location
            .as_deref()
            .filter(|l| !l.is_empty() && !l.eq_ignore_ascii_case("all"))
        {
            builder
                .push(" AND v.location LIKE ")
                .push_bind(format!("%{location}%"));
        }

        builder.push(match query.sort {
            EventSort::DateDesc => " ORDER BY e.event_date DESC, e.id DESC",
            _ => " ORDER BY e.event_date ASC, e.id ASC",
        });

        let mut events: Vec<EventDetail> = builder
            .build_query_as::<EventDetail>()
            .fetch_all(&self.pool)
            .await?;

        // Prices are stored as decimal text, so price filters and ordering run here
        events.retain(|event| {
            query.min_price.map_or(true, |min| event.ticket_price >= min)
                && query.max_price.map_or(true, |max| event.ticket_price <= max)
        });
        match query.sort {
            EventSort::PriceAsc => events.sort_by(|a, b| a.ticket_price.cmp(&b.ticket_price)),
            EventSort::PriceDesc => events.sort_by(|a, b| b.ticket_price.cmp(&a.ticket_price)),
            EventSort::DateAsc | EventSort::DateDesc => {}
        }

        let ids: Vec<i64> = events.iter().map(|event| event.id).collect();
        let mut images = self.images_for(&ids).await?;
        for event in events.iter_mut() {
            event.images = images.remove(&event.id).unwrap_or_default();
        }

        Ok(EventSearchResponse {
            count: events.len(),
            events,
        })
    }

    async fn images_for(&self, event_ids: &[i64]) -> AppResult<HashMap<i64, Vec<String>>> {
        let mut images: HashMap<i64, Vec<String>> = HashMap::new();
        if event_ids.is_empty() {
            return Ok(images);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT event_id, image_url FROM event_images WHERE event_id IN (");
        let mut separated = builder.separated(", ");
        for id in event_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY id");

        let rows: Vec<(i64, String)> = builder.build_query_as().fetch_all(&self.pool).await?;
        for (event_id, url) in rows {
            images.entry(event_id).or_default().push(url);
        }
        Ok(images)
    }
}
