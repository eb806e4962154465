use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqlitePool};

use crate::models::booking::{
    Booking, BookingStatus, EventBookingsResponse, OrganizerBooking, OrganizerBookingsResponse,
    PaymentStatus,
};
use crate::models::user::{Actor, Capability};
use crate::services::event_service::EventService;
use crate::services::ticket_service::TicketService;
use crate::utils::error::{AppError, AppResult};

const ORGANIZER_BOOKING_SELECT: &str = r#"
    SELECT b.*, e.title AS event_title, u.name AS customer_name
    FROM bookings b
    JOIN events e ON e.id = b.event_id
    JOIN users u ON u.id = b.customer_id
"#;

fn organizer_row(row: &SqliteRow) -> Result<(Booking, String, String), sqlx::Error> {
    Ok((
        Booking::from_row(row)?,
        row.try_get("event_title")?,
        row.try_get("customer_name")?,
    ))
}

/// Bookings seen from the organizer dashboard.
#[derive(Clone)]
pub struct OrganizerService {
    pool: SqlitePool,
    event_service: EventService,
    ticket_service: TicketService,
}

impl OrganizerService {
    pub fn new(pool: SqlitePool, ticket_verify_base_url: impl Into<String>) -> Self {
        OrganizerService {
            event_service: EventService::new(pool.clone()),
            ticket_service: TicketService::new(pool.clone(), ticket_verify_base_url),
            pool,
        }
    }

    // Every booking on the organizer's events, admins see all events
    pub async fn list_bookings(&self, actor: &Actor) -> AppResult<OrganizerBookingsResponse> {
        if !actor.can(Capability::ManageBookings) {
            return Err(AppError::Forbidden("Not allowed to manage bookings".into()));
        }

        let rows = sqlx::query(&format!(
            "{ORGANIZER_BOOKING_SELECT} WHERE (? OR e.organizer_id = ?) ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(actor.can(Capability::ViewAllEvents))
        .bind(actor.user_id)
        .fetch_all(&self.pool)
        .await?;

        let bookings = self.with_tickets(rows).await?;
        Ok(OrganizerBookingsResponse { bookings })
    }

    /// Bookings of a single event with its sales figures. Events the actor
    /// does not manage are reported as missing.
    pub async fn event_bookings(&self, actor: &Actor, event_id: i64) -> AppResult<EventBookingsResponse> {
        if !actor.can(Capability::ManageBookings) {
            return Err(AppError::Forbidden("Not allowed to manage bookings".into()));
        }

        let event = self.event_service.find_event(event_id).await?;
        if !actor.can_manage_event(event.organizer_id) {
            return Err(AppError::NotFound("Event not found".into()));
        }

        let rows = sqlx::query(&format!(
            "{ORGANIZER_BOOKING_SELECT} WHERE b.event_id = ? ORDER BY b.created_at DESC, b.id DESC"
        ))
        .bind(event_id)
        .fetch_all(&self.pool)
        .await?;

        let bookings = self.with_tickets(rows).await?;

        let tickets_sold = bookings
            .iter()
            .filter(|b| b.booking.booking_status == BookingStatus::Confirmed)
            .map(|b| b.booking.number_of_tickets)
            .sum();
        let revenue = bookings
            .iter()
            .filter(|b| b.booking.payment_status == PaymentStatus::Paid)
            .map(|b| b.booking.final_amount)
            .sum::<Decimal>();

        Ok(EventBookingsResponse {
            event_id,
            event_title: event.title,
            tickets_sold,
            revenue,
            bookings,
        })
    }

    async fn with_tickets(&self, rows: Vec<SqliteRow>) -> AppResult<Vec<OrganizerBooking>> {
        let rows = rows
            .iter()
            .map(organizer_row)
            .collect::<Result<Vec<_>, _>>()?;

        let ids: Vec<i64> = rows.iter().map(|(booking, _, _)| booking.id).collect();
        let mut tickets = self.ticket_service.tickets_for_bookings(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|(booking, event_title, customer_name)| OrganizerBooking {
                tickets: tickets.remove(&booking.id).unwrap_or_default(),
                booking,
                event_title,
                customer_name,
            })
            .collect())
    }
}
