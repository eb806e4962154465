use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rocket::http::Status;
use rocket::request::{FromRequest, Outcome};
use rocket::Request;
use rocket_okapi::request::OpenApiFromRequest;
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::models::user::{Actor, Capability, Role};
use crate::utils::error::{AppError, AppResult};

const TOKEN_LIFETIME_HOURS: i64 = 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64, // user_id
    pub role: Role,
    pub exp: usize,
}

/// Caller identity resolved from the bearer token. Tokens are issued by the
/// external login service that shares `JWT_SECRET`.
#[derive(Debug, Clone, Copy, OpenApiFromRequest)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub role: Role,
}

impl AuthenticatedUser {
    pub fn actor(&self) -> Actor {
        Actor::new(self.user_id, self.role)
    }

    pub fn require(&self, capability: Capability) -> AppResult<()> {
        if self.role.has_capability(capability) {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Role {} is not allowed to perform this action",
                self.role
            )))
        }
    }
}

pub fn generate_token(
    user_id: i64,
    role: Role,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = (chrono::Utc::now() + chrono::Duration::hours(TOKEN_LIFETIME_HOURS)).timestamp();

    let claims = Claims {
        sub: user_id,
        role,
        exp: expiration as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        let token = match request.headers().get_one("Authorization") {
            Some(header) => match header.strip_prefix("Bearer ") {
                Some(token) => token,
                None => return Outcome::Error((Status::Unauthorized, ())),
            },
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let config = match request.rocket().state::<AppConfig>() {
            Some(config) => config,
            None => {
                tracing::error!("AppConfig is not managed, cannot verify tokens");
                return Outcome::Error((Status::InternalServerError, ()));
            }
        };

        match decode_token(token, &config.jwt_secret) {
            Ok(claims) => Outcome::Success(AuthenticatedUser {
                user_id: claims.sub,
                role: claims.role,
            }),
            Err(e) => {
                tracing::debug!(error = %e, "rejected bearer token");
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}
