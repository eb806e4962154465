use std::collections::HashMap;
use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use image::{GrayImage, ImageFormat, Luma};
use qrcode::{Color, EcLevel, QrCode};
use sqlx::{FromRow, QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};

use crate::models::booking::BookingStatus;
use crate::models::ticket::{Ticket, TicketDraft, TicketStatus, TicketVerification};
use crate::models::user::{Actor, Capability};
use crate::utils::error::{AppError, AppResult};

/// Pixels per QR module
pub const QR_MODULE_SCALE: u32 = 20;

/// Light modules around the symbol
const QR_QUIET_ZONE: u32 = 4;

pub fn ticket_number(booking_id: i64, sequence: i64) -> String {
    format!("TCKT-{booking_id:05}-{sequence:03}")
}

pub fn verification_url(base_url: &str, ticket_number: &str) -> String {
    format!("{}/Tickets/Verify/{}", base_url.trim_end_matches('/'), ticket_number)
}

/// Encode `content` as a QR code (error correction Q) and return the PNG
/// as a `data:` URI.
pub fn qr_data_uri(content: &str) -> AppResult<String> {
    let code = QrCode::with_error_correction_level(content.as_bytes(), EcLevel::Q)
        .map_err(|e| AppError::TransactionFailure(format!("QR encoding failed: {e}")))?;

    let width = code.width() as u32;
    let colors = code.to_colors();
    let side = (width + 2 * QR_QUIET_ZONE) * QR_MODULE_SCALE;

    let image = GrayImage::from_fn(side, side, |x, y| {
        let module_x = (x / QR_MODULE_SCALE) as i64 - QR_QUIET_ZONE as i64;
        let module_y = (y / QR_MODULE_SCALE) as i64 - QR_QUIET_ZONE as i64;
        let inside = (0..width as i64).contains(&module_x) && (0..width as i64).contains(&module_y);
        let dark = inside && colors[(module_y as u32 * width + module_x as u32) as usize] == Color::Dark;
        if dark {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });

    let mut png = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::TransactionFailure(format!("QR image encoding failed: {e}")))?;

    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}

/// Build the `count` tickets of a booking. Pure: nothing is written.
pub fn issue_ticket_drafts(booking_id: i64, count: i64, base_url: &str) -> AppResult<Vec<TicketDraft>> {
    (1..=count)
        .map(|sequence| {
            let ticket_number = ticket_number(booking_id, sequence);
            let verify_url = verification_url(base_url, &ticket_number);
            let qr_code = qr_data_uri(&verify_url)?;
            Ok(TicketDraft {
                ticket_number,
                verify_url,
                qr_code,
            })
        })
        .collect()
}

#[derive(Clone)]
pub struct TicketService {
    pool: SqlitePool,
    verify_base_url: String,
}

impl TicketService {
    pub fn new(pool: SqlitePool, verify_base_url: impl Into<String>) -> Self {
        TicketService {
            pool,
            verify_base_url: verify_base_url.into(),
        }
    }

    // Image encoding is CPU bound, keep it off the async workers
    pub async fn prepare_tickets(&self, booking_id: i64, count: i64) -> AppResult<Vec<TicketDraft>> {
        let base_url = self.verify_base_url.clone();
        tokio::task::spawn_blocking(move || issue_ticket_drafts(booking_id, count, &base_url))
            .await
            .map_err(|e| AppError::TransactionFailure(format!("ticket generation task failed: {e}")))?
    }

    /// Write the drafts for a booking unless it already has tickets.
    /// Returns the number of tickets written.
    pub async fn insert_tickets(
        conn: &mut SqliteConnection,
        booking_id: i64,
        drafts: &[TicketDraft],
        now: DateTime<Utc>,
    ) -> AppResult<usize> {
        let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_one(&mut *conn)
            .await?;
        if existing > 0 || drafts.is_empty() {
            return Ok(0);
        }

        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
            "INSERT INTO tickets (booking_id, ticket_number, qr_code, status, created_at) ",
        );
        builder.push_values(drafts, |mut row, draft| {
            row.push_bind(booking_id)
                .push_bind(draft.ticket_number.clone())
                .push_bind(draft.qr_code.clone())
                .push_bind(TicketStatus::Valid)
                .push_bind(now);
        });
        builder.build().execute(conn).await?;

        Ok(drafts.len())
    }

    pub async fn set_status_for_booking(
        conn: &mut SqliteConnection,
        booking_id: i64,
        status: TicketStatus,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query("UPDATE tickets SET status = ?, updated_at = ? WHERE booking_id = ?")
            .bind(status)
            .bind(now)
            .bind(booking_id)
            .execute(conn)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn tickets_for_booking(&self, booking_id: i64) -> AppResult<Vec<Ticket>> {
        let tickets = sqlx::query_as::<_, Ticket>(
            "SELECT * FROM tickets WHERE booking_id = ? ORDER BY ticket_number",
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tickets)
    }

    pub async fn tickets_for_bookings(&self, booking_ids: &[i64]) -> AppResult<HashMap<i64, Vec<Ticket>>> {
        let mut grouped: HashMap<i64, Vec<Ticket>> = HashMap::new();
        if booking_ids.is_empty() {
            return Ok(grouped);
        }

        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT * FROM tickets WHERE booking_id IN (");
        let mut separated = builder.separated(", ");
        for id in booking_ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(") ORDER BY ticket_number");

        let tickets: Vec<Ticket> = builder.build_query_as().fetch_all(&self.pool).await?;
        for ticket in tickets {
            grouped.entry(ticket.booking_id).or_default().push(ticket);
        }
        Ok(grouped)
    }

    /// Look up a scanned ticket. Only staff of the event (or an admin) may
    /// verify it.
    pub async fn verify_ticket(&self, actor: &Actor, ticket_number: &str) -> AppResult<TicketVerification> {
        if !actor.can(Capability::VerifyTickets) {
            return Err(AppError::Forbidden("Not allowed to verify tickets".into()));
        }

        let row = sqlx::query(
            r#"
            SELECT
                t.ticket_number,
                t.status AS ticket_status,
                b.id AS booking_id,
                b.booking_status,
                e.id AS event_id,
                e.title AS event_title,
                e.event_date,
                e.organizer_id
            FROM tickets t
            JOIN bookings b ON b.id = t.booking_id
            JOIN events e ON e.id = b.event_id
            WHERE t.ticket_number = ?
            "#,
        )
        .bind(ticket_number)
        .fetch_optional(&self.pool)
        .await?;

        let row = row.ok_or_else(|| AppError::NotFound("Ticket not found".into()))?;
        let organizer_id: i64 = row.try_get("organizer_id")?;
        let mut verification = TicketVerification::from_row(&row)?;

        if !actor.can_manage_event(organizer_id) {
            return Err(AppError::Forbidden("Ticket belongs to another organizer's event".into()));
        }

        verification.admissible = verification.ticket_status == TicketStatus::Valid
            && verification.booking_status == BookingStatus::Confirmed;

        tracing::info!(
            ticket_number,
            admissible = verification.admissible,
            "ticket verified"
        );
        Ok(verification)
    }
}
