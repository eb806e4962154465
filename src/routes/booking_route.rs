use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::models::booking::{
    BookingDetail, BookingListResponse, CheckoutResponse, CreateBookingRequest, CreateBookingResponse,
};
use crate::models::loyalty::LoyaltySummary;
use crate::models::user::Capability;
use crate::services::booking_service::BookingService;
use crate::services::loyalty_service::LoyaltyService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

/// Create a pending booking
#[openapi(tag = "Bookings")]
#[post("/bookings", format = "json", data = "<request>")]
pub async fn create_booking(
    request: Json<CreateBookingRequest>,
    auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    auth.require(Capability::BookEvents)?;
    let response = booking_service
        .create_booking(auth.user_id, request.into_inner())
        .await?;
    Ok(Json(response))
}

/// Pay for a pending booking and issue its tickets
#[openapi(tag = "Bookings")]
#[post("/bookings/<booking_id>/checkout")]
pub async fn finalize_checkout(
    booking_id: i64,
    auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<CheckoutResponse>, AppError> {
    auth.require(Capability::BookEvents)?;
    let response = booking_service.finalize_checkout(booking_id, auth.user_id).await?;
    Ok(Json(response))
}

/// A booking with its tickets and payment
#[openapi(tag = "Bookings")]
#[get("/bookings/<booking_id>")]
pub async fn get_booking(
    booking_id: i64,
    auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<BookingDetail>, AppError> {
    auth.require(Capability::BookEvents)?;
    let detail = booking_service.get_booking_detail(booking_id, auth.user_id).await?;
    Ok(Json(detail))
}

/// The caller's bookings, newest first
#[openapi(tag = "Bookings")]
#[get("/bookings")]
pub async fn list_bookings(
    auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<BookingListResponse>, AppError> {
    auth.require(Capability::BookEvents)?;
    let bookings = booking_service.list_bookings_for_customer(auth.user_id).await?;
    Ok(Json(BookingListResponse { bookings }))
}

/// Loyalty balance and history
#[openapi(tag = "Bookings")]
#[get("/loyalty")]
pub async fn get_loyalty_summary(
    auth: AuthenticatedUser,
    loyalty_service: &State<LoyaltyService>,
) -> Result<Json<LoyaltySummary>, AppError> {
    auth.require(Capability::BookEvents)?;
    let summary = loyalty_service.summary(auth.user_id).await?;
    Ok(Json(summary))
}
