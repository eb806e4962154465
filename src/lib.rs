#[macro_use]
extern crate rocket;

pub mod config;
pub mod db;
pub mod models;
pub mod routes;
pub mod services;
pub mod swagger;
pub mod utils;

use rocket::fairing::AdHoc;
use rocket::{Build, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::make_swagger_ui;
use sqlx::SqlitePool;

use crate::config::AppConfig;
use crate::services::booking_service::BookingService;
use crate::services::event_service::EventService;
use crate::services::loyalty_service::LoyaltyService;
use crate::services::organizer_service::OrganizerService;
use crate::services::promotion_service::PromotionService;
use crate::services::ticket_service::TicketService;
use crate::swagger::swagger_ui;

/// Assemble the server around an already migrated pool.
pub fn build_rocket(pool: SqlitePool, config: AppConfig) -> Rocket<Build> {
    let base_url = config.ticket_verify_base_url.clone();

    rocket::build()
        .manage(EventService::new(pool.clone()))
        .manage(PromotionService::new(pool.clone()))
        .manage(LoyaltyService::new(pool.clone()))
        .manage(TicketService::new(pool.clone(), base_url.clone()))
        .manage(BookingService::new(pool.clone(), base_url.clone()))
        .manage(OrganizerService::new(pool, base_url))
        .manage(config)
        .mount(
            "/api",
            openapi_get_routes![
                routes::event_route::search_events,
                routes::event_route::get_event_details,
                routes::event_route::get_bookable_page,
                routes::promotion_route::validate_promotion,
                routes::promotion_route::apply_promo_code,
                routes::booking_route::create_booking,
                routes::booking_route::finalize_checkout,
                routes::booking_route::get_booking,
                routes::booking_route::list_bookings,
                routes::booking_route::get_loyalty_summary,
                routes::organizer_route::list_organizer_bookings,
                routes::organizer_route::get_event_bookings,
                routes::organizer_route::update_booking_status,
            ],
        )
        .mount("/", routes![routes::ticket_route::verify_ticket])
        .mount("/swagger", make_swagger_ui(&swagger_ui()))
        .attach(AdHoc::on_response("CORS", |_, res| {
            Box::pin(async move {
                res.set_header(rocket::http::Header::new(
                    "Access-Control-Allow-Origin",
                    "*",
                ));
            })
        }))
}
