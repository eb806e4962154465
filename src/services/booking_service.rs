use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::models::booking::{
    Booking, BookingDetail, BookingStatus, CheckoutResponse, CreateBookingRequest,
    CreateBookingResponse, PaymentStatus, PriceQuote,
};
use crate::models::event::BookablePage;
use crate::models::payment::{Payment, TransactionStatus, CARD_PAYMENT_METHOD};
use crate::models::promotion::Promotion;
use crate::models::ticket::{TicketDraft, TicketStatus};
use crate::models::user::{Actor, Capability};
use crate::services::event_service::EventService;
use crate::services::loyalty_service::{self, LoyaltyService};
use crate::services::promotion_service::PromotionService;
use crate::services::ticket_service::TicketService;
use crate::utils::error::{AppError, AppResult};
use crate::utils::money::{round_currency, to_db, within_tolerance};

// Remaining seats of the booking's event, excluding the booking itself
const REMAINING_FOR_BOOKING: &str = r#"
    (SELECT e.total_capacity - COALESCE((
        SELECT SUM(other.number_of_tickets)
        FROM bookings other
        WHERE other.event_id = e.id AND other.booking_status = 'confirmed'
    ), 0)
    FROM events e WHERE e.id = bookings.event_id)
"#;

/// Price a booking from the event price, the promotion (if any) and the
/// loyalty points redeemed.
pub fn quote_booking(
    ticket_price: Decimal,
    number_of_tickets: i64,
    promotion: Option<&Promotion>,
    loyalty_used: i64,
) -> PriceQuote {
    let total_amount = ticket_price * Decimal::from(number_of_tickets);
    let promotion_discount = promotion
        .map(|p| round_currency(p.discount_for(total_amount)))
        .unwrap_or(Decimal::ZERO);
    let loyalty_discount =
        round_currency(loyalty_service::points_discount(loyalty_used, total_amount - promotion_discount));
    let discount_amount = promotion_discount + loyalty_discount;
    let final_amount = total_amount - discount_amount;

    PriceQuote {
        total_amount,
        promotion_discount,
        loyalty_discount,
        discount_amount,
        final_amount,
        loyalty_earned: loyalty_service::points_earned_for(final_amount),
    }
}

// Reject the request if any displayed amount drifted from the server's
fn verify_submitted_amounts(request: &CreateBookingRequest, quote: &PriceQuote) -> AppResult<()> {
    let checks = [
        ("total_amount", request.total_amount, quote.total_amount),
        ("discount_amount", request.discount_amount, quote.discount_amount),
        ("final_amount", request.final_amount, quote.final_amount),
    ];

    for (field, submitted, expected) in checks {
        if !within_tolerance(submitted, expected) {
            return Err(AppError::AmountMismatch {
                field: field.to_string(),
                submitted,
                expected,
            });
        }
    }
    Ok(())
}

// Keep business rejections as they are, hide everything else behind a
// generic checkout failure
fn checkout_failure(booking_id: i64, err: AppError) -> AppError {
    if err.is_business_rule() {
        warn!(booking_id, error = %err, "checkout rejected");
        return err;
    }
    let cause = match err {
        AppError::DatabaseError(cause) | AppError::TransactionFailure(cause) => cause,
        other => other.to_string(),
    };
    error!(booking_id, cause = %cause, "checkout rolled back");
    AppError::TransactionFailure(cause)
}

enum CheckoutOutcome {
    Completed,
    AlreadyCompleted,
}

/// The booking workflow: availability, pricing, pending booking creation
/// and the atomic checkout that confirms it.
#[derive(Clone)]
pub struct BookingService {
    pool: SqlitePool,
    event_service: EventService,
    promotion_service: PromotionService,
    loyalty_service: LoyaltyService,
    ticket_service: TicketService,
}

impl BookingService {
    pub fn new(pool: SqlitePool, ticket_verify_base_url: impl Into<String>) -> Self {
        BookingService {
            event_service: EventService::new(pool.clone()),
            promotion_service: PromotionService::new(pool.clone()),
            loyalty_service: LoyaltyService::new(pool.clone()),
            ticket_service: TicketService::new(pool.clone(), ticket_verify_base_url),
            pool,
        }
    }

    pub async fn get_bookable_page(&self, event_id: i64, customer_id: i64) -> AppResult<BookablePage> {
        let event = self.event_service.get_event_detail(event_id).await?;
        let loyalty_balance = self.loyalty_service.balance(customer_id).await?;

        Ok(BookablePage {
            available_tickets: event.available_tickets,
            ticket_price: event.ticket_price,
            loyalty_balance,
            event,
        })
    }

    /// Validate a booking request and store it as pending. Nothing is
    /// charged and no loyalty points move until checkout.
    pub async fn create_booking(
        &self,
        customer_id: i64,
        request: CreateBookingRequest,
    ) -> AppResult<CreateBookingResponse> {
        request.validate()?;
        let now = Utc::now();

        let event = self.event_service.find_event(request.event_id).await?;

        let available = self.event_service.available_tickets(event.id).await?;
        if request.number_of_tickets > available {
            warn!(event_id = event.id, requested = request.number_of_tickets, available, "not enough tickets left");
            return Err(AppError::CapacityExceeded {
                requested: request.number_of_tickets,
                available,
            });
        }

        let balance = self.loyalty_service.balance(customer_id).await?;
        if request.loyalty_used > balance {
            return Err(AppError::InsufficientPoints {
                requested: request.loyalty_used,
                available: balance,
            });
        }

        let promo_code = request.promo_code.as_deref().filter(|code| !code.is_empty());
        let promotion = match promo_code {
            Some(code) => Some(
                self.promotion_service
                    .find_valid(code, now)
                    .await?
                    .ok_or_else(|| AppError::InvalidPromotion(code.to_string()))?,
            ),
            None => None,
        };

        let quote = quote_booking(
            event.ticket_price,
            request.number_of_tickets,
            promotion.as_ref(),
            request.loyalty_used,
        );
        if let Err(e) = verify_submitted_amounts(&request, &quote) {
            warn!(event_id = event.id, customer_id, error = ?e, "submitted amounts rejected");
            return Err(e);
        }

        // Insert only if the seats are still there when the row is written
        let result = sqlx::query(
            r#"
            INSERT INTO bookings (
                customer_id, event_id, number_of_tickets, ticket_price,
                total_amount, discount_amount, final_amount, promotion_code,
                loyalty_used, loyalty_earned, payment_status, booking_status, created_at
            )
            SELECT ?, e.id, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            FROM events e
            WHERE e.id = ?
              AND e.total_capacity - COALESCE((
                    SELECT SUM(b.number_of_tickets)
                    FROM bookings b
                    WHERE b.event_id = e.id AND b.booking_status = 'confirmed'
                  ), 0) >= ?
            "#,
        )
        .bind(customer_id)
        .bind(request.number_of_tickets)
        .bind(to_db(event.ticket_price))
        .bind(to_db(quote.total_amount))
        .bind(to_db(quote.discount_amount))
        .bind(to_db(quote.final_amount))
        .bind(promo_code)
        .bind(request.loyalty_used)
        .bind(quote.loyalty_earned)
        .bind(PaymentStatus::Pending)
        .bind(BookingStatus::Pending)
        .bind(now)
        .bind(event.id)
        .bind(request.number_of_tickets)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let available = self.event_service.available_tickets(event.id).await?;
            warn!(event_id = event.id, requested = request.number_of_tickets, available, "seats taken while booking");
            return Err(AppError::CapacityExceeded {
                requested: request.number_of_tickets,
                available,
            });
        }

        let booking_id = result.last_insert_rowid();
        info!(booking_id, event_id = event.id, customer_id, tickets = request.number_of_tickets, "booking created");

        Ok(CreateBookingResponse {
            booking_id,
            booking_status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            final_amount: quote.final_amount,
        })
    }

    /// Confirm a pending booking in one transaction: loyalty debit and
    /// credit, payment record, status flip and ticket generation. Calling it
    /// again on a confirmed booking returns the existing tickets.
    pub async fn finalize_checkout(&self, booking_id: i64, customer_id: i64) -> AppResult<CheckoutResponse> {
        let booking = self.get_booking(booking_id, customer_id).await?;

        match booking.booking_status {
            BookingStatus::Cancelled => {
                return Err(AppError::Conflict("Booking has been cancelled".into()));
            }
            BookingStatus::Confirmed => {
                info!(booking_id, "checkout already completed");
                let tickets = self.ticket_service.tickets_for_booking(booking_id).await?;
                return Ok(CheckoutResponse { booking, tickets });
            }
            BookingStatus::Pending => {}
        }

        let drafts = self
            .ticket_service
            .prepare_tickets(booking.id, booking.number_of_tickets)
            .await
            .map_err(|e| checkout_failure(booking_id, e))?;

        match self.run_checkout(&booking, &drafts).await {
            Ok(CheckoutOutcome::Completed) => {
                info!(booking_id, customer_id, tickets = drafts.len(), "checkout completed");
            }
            Ok(CheckoutOutcome::AlreadyCompleted) => {
                info!(booking_id, "checkout completed by a concurrent request");
            }
            Err(e) => return Err(checkout_failure(booking_id, e)),
        }

        let booking = self.get_booking(booking_id, customer_id).await?;
        let tickets = self.ticket_service.tickets_for_booking(booking_id).await?;
        Ok(CheckoutResponse { booking, tickets })
    }

    async fn run_checkout(&self, booking: &Booking, drafts: &[TicketDraft]) -> AppResult<CheckoutOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Claim the booking first so concurrent checkouts serialize here
        let confirmed = sqlx::query(&format!(
            r#"
            UPDATE bookings
            SET payment_status = ?, booking_status = ?
            WHERE id = ? AND booking_status = 'pending'
              AND number_of_tickets <= {REMAINING_FOR_BOOKING}
            "#
        ))
        .bind(PaymentStatus::Paid)
        .bind(BookingStatus::Confirmed)
        .bind(booking.id)
        .execute(&mut *tx)
        .await?;

        if confirmed.rows_affected() == 0 {
            let outcome = Self::explain_unclaimed(&mut tx, booking).await;
            tx.rollback().await?;
            return outcome;
        }

        let customer_id = booking.customer_id;
        LoyaltyService::ensure_account(&mut tx, customer_id, now).await?;

        if booking.loyalty_used > 0 {
            LoyaltyService::debit(&mut tx, customer_id, booking.loyalty_used, Some(booking.id), now).await?;
        }

        let loyalty_earned = loyalty_service::points_earned_for(booking.final_amount);
        if loyalty_earned > 0 {
            LoyaltyService::credit(&mut tx, customer_id, loyalty_earned, Some(booking.id), now).await?;
        }

        sqlx::query("UPDATE bookings SET loyalty_earned = ? WHERE id = ?")
            .bind(loyalty_earned)
            .bind(booking.id)
            .execute(&mut *tx)
            .await?;

        Self::record_payment(&mut tx, booking, now).await?;

        TicketService::insert_tickets(&mut tx, booking.id, drafts, now).await?;

        tx.commit().await?;
        Ok(CheckoutOutcome::Completed)
    }

    // Why the pending -> confirmed update matched no row
    async fn explain_unclaimed(conn: &mut SqliteConnection, booking: &Booking) -> AppResult<CheckoutOutcome> {
        let status: Option<BookingStatus> =
            sqlx::query_scalar("SELECT booking_status FROM bookings WHERE id = ?")
                .bind(booking.id)
                .fetch_optional(&mut *conn)
                .await?;

        match status {
            None => Err(AppError::NotFound("Booking not found".into())),
            Some(BookingStatus::Confirmed) => Ok(CheckoutOutcome::AlreadyCompleted),
            Some(BookingStatus::Cancelled) => Err(AppError::Conflict("Booking has been cancelled".into())),
            Some(BookingStatus::Pending) => {
                let available = EventService::remaining_capacity(conn, booking.event_id).await?;
                Err(AppError::CapacityExceeded {
                    requested: booking.number_of_tickets,
                    available,
                })
            }
        }
    }

    // At most one payment per booking
    async fn record_payment(conn: &mut SqliteConnection, booking: &Booking, now: DateTime<Utc>) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (booking_id, amount, payment_method, transaction_id, status, created_at)
            SELECT ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS (SELECT 1 FROM payments WHERE booking_id = ?)
            "#,
        )
        .bind(booking.id)
        .bind(to_db(booking.final_amount))
        .bind(CARD_PAYMENT_METHOD)
        .bind(Uuid::new_v4().to_string())
        .bind(TransactionStatus::Completed)
        .bind(now)
        .bind(booking.id)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// A booking owned by `customer_id`.
    pub async fn get_booking(&self, booking_id: i64, customer_id: i64) -> AppResult<Booking> {
        let booking = self.find_booking(booking_id).await?;
        if booking.customer_id != customer_id {
            return Err(AppError::Forbidden("Booking belongs to another customer".into()));
        }
        Ok(booking)
    }

    pub async fn get_booking_detail(&self, booking_id: i64, customer_id: i64) -> AppResult<BookingDetail> {
        let booking = self.get_booking(booking_id, customer_id).await?;
        let event = self.event_service.find_event(booking.event_id).await?;
        let tickets = self.ticket_service.tickets_for_booking(booking_id).await?;
        let payment = sqlx::query_as::<_, Payment>("SELECT * FROM payments WHERE booking_id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(BookingDetail {
            booking,
            event_title: event.title,
            tickets,
            payment,
        })
    }

    // Newest first
    pub async fn list_bookings_for_customer(&self, customer_id: i64) -> AppResult<Vec<Booking>> {
        let bookings = sqlx::query_as::<_, Booking>(
            r#"
            SELECT * FROM bookings
            WHERE customer_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(bookings)
    }

    /// Organizer-side confirm/cancel. Tickets follow the booking: valid when
    /// confirmed, cancelled when cancelled. Loyalty and payments are left
    /// alone.
    pub async fn update_booking_status(
        &self,
        actor: &Actor,
        booking_id: i64,
        new_status: BookingStatus,
    ) -> AppResult<Booking> {
        if !actor.can(Capability::ManageBookings) {
            return Err(AppError::Forbidden("Not allowed to manage bookings".into()));
        }

        let booking = self.find_booking(booking_id).await?;
        let event = self.event_service.find_event(booking.event_id).await?;
        if !actor.can_manage_event(event.organizer_id) {
            return Err(AppError::Forbidden("Booking belongs to another organizer's event".into()));
        }

        if new_status == BookingStatus::Pending {
            return Err(AppError::BadRequest("Invalid status.".into()));
        }
        if booking.booking_status == new_status {
            return Ok(booking);
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        match new_status {
            BookingStatus::Pending => {
                return Err(AppError::BadRequest("Invalid status.".into()));
            }
            BookingStatus::Cancelled => {
                sqlx::query("UPDATE bookings SET booking_status = ? WHERE id = ?")
                    .bind(BookingStatus::Cancelled)
                    .bind(booking_id)
                    .execute(&mut *tx)
                    .await?;
                TicketService::set_status_for_booking(&mut tx, booking_id, TicketStatus::Cancelled, now).await?;
            }
            BookingStatus::Confirmed => {
                if booking.payment_status != PaymentStatus::Paid {
                    return Err(AppError::Conflict(
                        "Only paid bookings can be confirmed, the customer has to check out".into(),
                    ));
                }

                let result = sqlx::query(&format!(
                    r#"
                    UPDATE bookings
                    SET booking_status = ?
                    WHERE id = ? AND number_of_tickets <= {REMAINING_FOR_BOOKING}
                    "#
                ))
                .bind(BookingStatus::Confirmed)
                .bind(booking_id)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    let available = EventService::remaining_capacity(&mut tx, booking.event_id).await?;
                    return Err(AppError::CapacityExceeded {
                        requested: booking.number_of_tickets,
                        available,
                    });
                }
                TicketService::set_status_for_booking(&mut tx, booking_id, TicketStatus::Valid, now).await?;
            }
        }

        tx.commit().await?;
        info!(booking_id, actor = actor.user_id, status = %new_status, "booking status updated");

        self.find_booking(booking_id).await
    }

    async fn find_booking(&self, booking_id: i64) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = ?")
            .bind(booking_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".into()))
    }
}
