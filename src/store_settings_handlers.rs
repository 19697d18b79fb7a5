use crate::error::ApiError;
use crate::models::{StoreSettings, StoreSettingsInput, STORE_SETTINGS_ID};
use crate::response::{created, ok, ApiResponse};
use crate::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse};
use tracing::info;

/// Settings are a singleton; the default document is created on first read.
#[get("")]
pub async fn get_store_settings(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let settings = state
        .db
        .store_settings
        .find_or_insert(STORE_SETTINGS_ID, StoreSettings::defaults)
        .await?;
    Ok(ok(ApiResponse::data(settings)))
}

#[post("")]
pub async fn create_store_settings(
    state: web::Data<AppState>,
    body: web::Json<StoreSettingsInput>,
) -> Result<HttpResponse, ApiError> {
    let settings = state
        .db
        .store_settings
        .insert(StoreSettings::create(body.into_inner())?)
        .await?;
    info!(store = %settings.store_name, "store settings created");
    Ok(created("Store settings created successfully", settings))
}

#[put("")]
pub async fn update_store_settings(
    state: web::Data<AppState>,
    body: web::Json<StoreSettingsInput>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let settings = state
        .db
        .store_settings
        .upsert_by_id(STORE_SETTINGS_ID, |existing| match existing {
            Some(mut settings) => {
                settings.apply(input)?;
                Ok::<_, ApiError>(settings)
            }
            None => StoreSettings::create(input),
        })
        .await?;
    Ok(ok(ApiResponse::with_message(
        "Store settings updated successfully",
        settings,
    )))
}

#[delete("")]
pub async fn delete_store_settings(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    state
        .db
        .store_settings
        .delete_by_id(STORE_SETTINGS_ID)
        .await?
        .ok_or_else(|| ApiError::not_found("Store settings"))?;
    info!("store settings deleted");
    Ok(ok(ApiResponse::message("Store settings deleted successfully")))
}
