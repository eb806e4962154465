use rocket::http::ContentType;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::Request;
use rocket::Response;
use rocket_okapi::JsonSchema;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug, Serialize, JsonSchema)]
pub enum AppError {
    #[error("Database error")]
    DatabaseError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Only {available} tickets available")]
    CapacityExceeded { requested: i64, available: i64 },

    #[error("Insufficient loyalty points")]
    InsufficientPoints { requested: i64, available: i64 },

    #[error("Invalid promotion code")]
    InvalidPromotion(String),

    #[error("Amount calculation mismatch. Please try again.")]
    AmountMismatch {
        field: String,
        submitted: Decimal,
        expected: Decimal,
    },

    // The cause is logged, never returned to the client
    #[error("Failed to process checkout. Please try again.")]
    TransactionFailure(String),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    pub fn status(&self) -> Status {
        match self {
            AppError::ValidationError(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::DatabaseError(_) => Status::InternalServerError,
            AppError::AuthError(_) => Status::Unauthorized,
            AppError::Forbidden(_) => Status::Forbidden,
            AppError::Conflict(_) => Status::Conflict,
            AppError::CapacityExceeded { .. } => Status::Conflict,
            AppError::InsufficientPoints { .. } => Status::UnprocessableEntity,
            AppError::InvalidPromotion(_) => Status::UnprocessableEntity,
            AppError::AmountMismatch { .. } => Status::UnprocessableEntity,
            AppError::TransactionFailure(_) => Status::InternalServerError,
            AppError::BadRequest(_) => Status::BadRequest,
        }
    }

    /// Business rule rejections the customer can act on, as opposed to
    /// infrastructure failures.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::Forbidden(_)
                | AppError::Conflict(_)
                | AppError::CapacityExceeded { .. }
                | AppError::InsufficientPoints { .. }
                | AppError::InvalidPromotion(_)
                | AppError::AmountMismatch { .. }
        )
    }
}

// Convert sqlx::Error (database error) to AppError::DatabaseError
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

// Define a type alias for the result type
pub type AppResult<T> = Result<T, AppError>;

// Format all error from route level to a Http Response at route level
#[rocket::async_trait]
impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, _: &'r Request<'_>) -> rocket::response::Result<'static> {
        let status = self.status();

        match &self {
            AppError::DatabaseError(cause) | AppError::TransactionFailure(cause) => {
                tracing::error!(%status, cause = %cause, "request failed");
            }
            _ => tracing::debug!(%status, error = %self, "request rejected"),
        }

        let json = json!({
            "error": self.to_string()
        });

        Response::build()
            .status(status)
            .header(ContentType::JSON)
            .sized_body(None, Cursor::new(json.to_string()))
            .ok()
    }
}
