use std::str::FromStr;

use chrono::NaiveDate;
use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;
use rust_decimal::Decimal;

use crate::models::event::{BookablePage, EventDetail, EventSearchQuery, EventSearchResponse, EventSort};
use crate::models::user::Capability;
use crate::services::booking_service::BookingService;
use crate::services::event_service::EventService;
use crate::utils::error::AppError;
use crate::utils::jwt::AuthenticatedUser;

fn parse_date(value: Option<String>, name: &str) -> Result<Option<NaiveDate>, AppError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| {
            NaiveDate::parse_from_str(&v, "%Y-%m-%d")
                .map_err(|_| AppError::BadRequest(format!("Invalid {name} date format")))
        })
        .transpose()
}

fn parse_price(value: Option<String>, name: &str) -> Result<Option<Decimal>, AppError> {
    value
        .filter(|v| !v.is_empty())
        .map(|v| Decimal::from_str(&v).map_err(|_| AppError::BadRequest(format!("Invalid {name}"))))
        .transpose()
}

/// Search upcoming events
#[allow(clippy::too_many_arguments)]
#[openapi(tag = "Events")]
#[get("/events/search?<search>&<category>&<location>&<from>&<to>&<min_price>&<max_price>&<sort>")]
pub async fn search_events(
    search: Option<String>,
    category: Option<String>,
    location: Option<String>,
    from: Option<String>,
    to: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    sort: Option<String>,
    event_service: &State<EventService>,
) -> Result<Json<EventSearchResponse>, AppError> {
    let sort = match sort.filter(|s| !s.is_empty()) {
        Some(sort) => EventSort::from_str(&sort)
            .map_err(|_| AppError::BadRequest(format!("Unknown sort order {sort}")))?,
        None => EventSort::default(),
    };

    let query = EventSearchQuery {
        search,
        category,
        location,
        from: parse_date(from, "start")?,
        to: parse_date(to, "end")?,
        min_price: parse_price(min_price, "minimum price")?,
        max_price: parse_price(max_price, "maximum price")?,
        sort,
    };
    let events = event_service.search_events(query).await?;
    Ok(Json(events))
}

/// Event details
#[openapi(tag = "Events")]
#[get("/events/<event_id>")]
pub async fn get_event_details(
    event_id: i64,
    event_service: &State<EventService>,
) -> Result<Json<EventDetail>, AppError> {
    let event = event_service.get_event_detail(event_id).await?;
    Ok(Json(event))
}

/// Data for the booking form: availability, price and loyalty balance
#[openapi(tag = "Events")]
#[get("/events/<event_id>/booking")]
pub async fn get_bookable_page(
    event_id: i64,
    auth: AuthenticatedUser,
    booking_service: &State<BookingService>,
) -> Result<Json<BookablePage>, AppError> {
    auth.require(Capability::BookEvents)?;
    let page = booking_service.get_bookable_page(event_id, auth.user_id).await?;
    Ok(Json(page))
}
