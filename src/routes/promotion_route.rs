use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::models::promotion::{ApplyPromoCodeRequest, ApplyPromoCodeResponse, PromotionValidation};
use crate::services::promotion_service::PromotionService;
use crate::utils::error::AppError;

/// Check whether a promotion code can be redeemed right now
#[openapi(tag = "Promotions")]
#[get("/promotions/validate?<code>")]
pub async fn validate_promotion(
    code: Option<String>,
    promotion_service: &State<PromotionService>,
) -> Result<Json<PromotionValidation>, AppError> {
    let validation = promotion_service
        .validate_promotion(code.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(validation))
}

/// Preview the discount a code grants on a total
#[openapi(tag = "Promotions")]
#[post("/promotions/apply", format = "json", data = "<request>")]
pub async fn apply_promo_code(
    request: Json<ApplyPromoCodeRequest>,
    promotion_service: &State<PromotionService>,
) -> Result<Json<ApplyPromoCodeResponse>, AppError> {
    let response = promotion_service.apply_promo_code(request.into_inner()).await?;
    Ok(Json(response))
}
