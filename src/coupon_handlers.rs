use crate::error::ApiError;
use crate::models::{Coupon, CouponInput};
use crate::response::{created, ok, ApiResponse};
use crate::AppState;
use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use chrono::Utc;
use tracing::{debug, info};

#[get("")]
pub async fn list_coupons(state: web::Data<AppState>) -> HttpResponse {
    ok(ApiResponse::list(state.db.coupons.find_all().await))
}

/// Read a coupon by code, rejecting it when it is no longer usable.
#[get("/code/{code}")]
pub async fn get_coupon_by_code(
    state: web::Data<AppState>,
    code: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let coupon = state
        .db
        .coupons
        .find_one(|c| c.code == *code)
        .await
        .ok_or_else(|| ApiError::not_found("Coupon"))?;

    coupon.check_eligibility(Utc::now()).map_err(|reason| {
        debug!(code = %coupon.code, %reason, "coupon lookup rejected");
        reason
    })?;
    Ok(ok(ApiResponse::data(coupon)))
}

#[get("/{id}")]
pub async fn get_coupon(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let coupon = state
        .db
        .coupons
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Coupon"))?;
    Ok(ok(ApiResponse::data(coupon)))
}

#[post("")]
pub async fn create_coupon(
    state: web::Data<AppState>,
    body: web::Json<CouponInput>,
) -> Result<HttpResponse, ApiError> {
    let coupon = state
        .db
        .coupons
        .insert(Coupon::create(body.into_inner())?)
        .await?;
    info!(code = %coupon.code, limit = coupon.usage_limit, "coupon created");
    Ok(created("Coupon created successfully", coupon))
}

#[put("/{id}")]
pub async fn update_coupon(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<CouponInput>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let coupon = state
        .db
        .coupons
        .update_by_id(&id, |c: &mut Coupon| c.apply(input))
        .await?
        .ok_or_else(|| ApiError::not_found("Coupon"))?;
    Ok(ok(ApiResponse::with_message(
        "Coupon updated successfully",
        coupon,
    )))
}

/// Consume one use. The eligibility check and the increment run as one
/// conditional update, so concurrent redemptions cannot overshoot the limit.
#[patch("/{code}/use")]
pub async fn use_coupon(
    state: web::Data<AppState>,
    code: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now();
    let coupon = state
        .db
        .coupons
        .update_one(
            |c| c.code == *code,
            |c: &mut Coupon| -> Result<(), ApiError> {
                c.redeem(now)?;
                Ok(())
            },
        )
        .await?
        .ok_or_else(|| ApiError::not_found("Coupon"))?;
    info!(
        code = %coupon.code,
        used = coupon.usage_count,
        limit = coupon.usage_limit,
        "coupon redeemed"
    );
    Ok(ok(ApiResponse::with_message(
        "Coupon used successfully",
        coupon,
    )))
}

#[delete("/{id}")]
pub async fn delete_coupon(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state
        .db
        .coupons
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Coupon"))?;
    info!(id = %id, "coupon deleted");
    Ok(ok(ApiResponse::message("Coupon deleted successfully")))
}
