use indexmap::IndexMap;
use okapi::openapi3::SchemaObject;
use rocket::http::Status;
use rocket_okapi::gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::RefOr;
use rocket_okapi::okapi::openapi3::{MediaType, Response, Responses};
use rocket_okapi::response::OpenApiResponderInner;
use rust_decimal::Decimal;
use serde_json::json;

use crate::utils::error::AppError;

// One documented example per status code a route can answer with
fn documented_errors() -> Vec<(Status, &'static str, AppError)> {
    vec![
        (
            Status::BadRequest,
            "Malformed or invalid request",
            AppError::ValidationError("number_of_tickets: At least one ticket must be booked".into()),
        ),
        (
            Status::Unauthorized,
            "Missing or invalid bearer token",
            AppError::AuthError("Unauthorized".into()),
        ),
        (
            Status::Forbidden,
            "Role or ownership does not allow the action",
            AppError::Forbidden("Booking belongs to another customer".into()),
        ),
        (
            Status::NotFound,
            "Event, booking or ticket not found",
            AppError::NotFound("Booking not found".into()),
        ),
        (
            Status::Conflict,
            "Not enough tickets left, or the booking cannot change state",
            AppError::CapacityExceeded {
                requested: 5,
                available: 2,
            },
        ),
        (
            Status::UnprocessableEntity,
            "Promotion, loyalty or amount check failed",
            AppError::AmountMismatch {
                field: "final_amount".into(),
                submitted: Decimal::new(9999, 0),
                expected: Decimal::new(1000, 0),
            },
        ),
        (
            Status::InternalServerError,
            "Checkout rolled back",
            AppError::TransactionFailure("rolled back".into()),
        ),
    ]
}

impl<'r> OpenApiResponderInner for AppError {
    fn responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        let mut responses = Responses::default();

        for (status, description, error) in documented_errors() {
            let mut content = IndexMap::new();
            content.insert(
                "application/json".to_string(),
                MediaType {
                    schema: Some(SchemaObject::default()),
                    example: Some(json!({ "error": error.to_string() })),
                    ..Default::default()
                },
            );

            responses.responses.insert(
                status.code.to_string(),
                RefOr::Object(Response {
                    description: description.to_string(),
                    content,
                    ..Default::default()
                }),
            );
        }

        Ok(responses)
    }
}
