use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::SqlitePool;

use crate::models::promotion::{
    ApplyPromoCodeRequest, ApplyPromoCodeResponse, Promotion, PromotionValidation,
};
use crate::utils::error::AppResult;

#[derive(Clone)]
pub struct PromotionService {
    pool: SqlitePool,
}

impl PromotionService {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionService { pool }
    }

    // Codes are stored upper-cased by the admin screens, but redemption
    // matches the submitted code exactly
    pub async fn find_by_code(&self, code: &str) -> AppResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>("SELECT * FROM promotions WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;
        Ok(promotion)
    }

    /// The promotion behind `code` if it can be redeemed at `now`.
    pub async fn find_valid(&self, code: &str, now: DateTime<Utc>) -> AppResult<Option<Promotion>> {
        if code.is_empty() {
            return Ok(None);
        }
        let promotion = self.find_by_code(code).await?;
        Ok(promotion.filter(|p| p.is_valid_at(now)))
    }

    /// Discount `code` grants on `subtotal`, or `None` when the code is not
    /// applicable (empty, unknown, inactive or outside its window).
    pub async fn evaluate(
        &self,
        code: &str,
        subtotal: Decimal,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Decimal>> {
        Ok(self
            .find_valid(code, now)
            .await?
            .map(|promotion| promotion.discount_for(subtotal)))
    }

    pub async fn validate_promotion(&self, code: &str) -> AppResult<PromotionValidation> {
        let promotion = self.find_valid(code, Utc::now()).await?;

        Ok(match promotion {
            Some(promotion) => PromotionValidation {
                valid: true,
                message: format!("Promotion applied! {} discount", promotion.describe()),
                code: Some(promotion.code),
                discount_type: Some(promotion.discount_type),
                discount_value: Some(promotion.discount_value),
            },
            None => PromotionValidation {
                valid: false,
                code: None,
                discount_type: None,
                discount_value: None,
                message: "Invalid or expired promotion code".to_string(),
            },
        })
    }

    pub async fn apply_promo_code(
        &self,
        request: ApplyPromoCodeRequest,
    ) -> AppResult<ApplyPromoCodeResponse> {
        if request.code.trim().is_empty() {
            return Ok(ApplyPromoCodeResponse {
                success: false,
                message: "Promo code is empty".to_string(),
                discount: Decimal::ZERO,
                discount_type: None,
            });
        }

        let promotion = self.find_valid(&request.code, Utc::now()).await?;
        Ok(match promotion {
            Some(promotion) => ApplyPromoCodeResponse {
                success: true,
                message: "Promo code applied!".to_string(),
                discount: promotion.discount_for(request.total_price),
                discount_type: Some(promotion.discount_type),
            },
            None => ApplyPromoCodeResponse {
                success: false,
                message: "Invalid promo code".to_string(),
                discount: Decimal::ZERO,
                discount_type: None,
            },
        })
    }
}
