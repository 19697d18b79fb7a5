use crate::error::ApiError;
use crate::models::{Product, ProductInput};
use crate::response::{created, ok, ApiResponse};
use crate::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse};
use tracing::info;

#[get("")]
pub async fn list_products(state: web::Data<AppState>) -> HttpResponse {
    ok(ApiResponse::list(state.db.products.find_all().await))
}

#[get("/{id}")]
pub async fn get_product(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let product = state
        .db
        .products
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Product"))?;
    Ok(ok(ApiResponse::data(product)))
}

#[post("")]
pub async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let product = state
        .db
        .products
        .insert(Product::create(body.into_inner())?)
        .await?;
    info!(id = %product.id, sku = %product.sku, "product created");
    Ok(created("Product created successfully", product))
}

#[put("/{id}")]
pub async fn update_product(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<ProductInput>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let product = state
        .db
        .products
        .update_by_id(&id, |p: &mut Product| p.apply(input))
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    Ok(ok(ApiResponse::with_message(
        "Product updated successfully",
        product,
    )))
}

#[delete("/{id}")]
pub async fn delete_product(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state
        .db
        .products
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product"))?;
    info!(id = %id, "product deleted");
    Ok(ok(ApiResponse::message("Product deleted successfully")))
}
