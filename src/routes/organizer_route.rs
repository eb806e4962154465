use std::str::FromStr;

use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::models::booking::{
    Booking, BookingStatus, EventBookingsResponse, OrganizerBookingsResponse, UpdateBookingStatusRequest,
};
use crate::services::booking_service::BookingService;
use crate::services::organizer_service::OrganizerService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

/// Bookings across the organizer's events
#[openapi(tag = "Organizer")]
#[get("/organizer/bookings")]
pub async fn list_organizer_bookings(
    auth: AuthenticatedUser,
    organizer_service: &State<OrganizerService>,
) -> Result<Json<OrganizerBookingsResponse>, AppError> {
    let bookings = organizer_service.list_bookings(&auth.actor()).await?;
    Ok(Json(bookings))
}

/// Bookings and sales of one event
#[openapi(tag = "Organizer")]
#[get("/organizer/events/<event_id>/bookings")]
pub async fn get_event_bookings(
    event_id: i64,
    auth: AuthenticatedUser,
    organizer_service: &State<OrganizerService>,
) -> Result<Json<EventBookingsResponse>, AppError> {
    let response = organizer_service.event_bookings(&auth.actor(), event_id).await?;
    Ok(Json(response))
}

/// Confirm or cancel a booking
#[openapi(tag = "Organizer")]
#[put("/organizer/bookings/<booking_id>/status", format = "json", data = "<request>")]
pub async fn update_booking_status(
    booking_id: i64,
    request: Json<UpdateBookingStatusRequest>,
    auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<Booking>, AppError> {
    let status = BookingStatus::from_str(request.status.trim())
        .ok()
        .filter(|status| *status != BookingStatus::Pending)
        .ok_or_else(|| AppError::BadRequest("Invalid status.".into()))?;

    let booking = booking_service
        .update_booking_status(&auth.actor(), booking_id, status)
        .await?;
    Ok(Json(booking))
}
