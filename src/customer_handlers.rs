use crate::error::ApiError;
use crate::models::{Customer, CustomerInput};
use crate::response::{created, ok, ApiResponse};
use crate::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse};
use tracing::info;

#[get("")]
pub async fn list_customers(state: web::Data<AppState>) -> HttpResponse {
    ok(ApiResponse::list(state.db.customers.find_all().await))
}

#[get("/{id}")]
pub async fn get_customer(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let customer = state
        .db
        .customers
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Customer"))?;
    Ok(ok(ApiResponse::data(customer)))
}

#[post("")]
pub async fn create_customer(
    state: web::Data<AppState>,
    body: web::Json<CustomerInput>,
) -> Result<HttpResponse, ApiError> {
    let customer = state
        .db
        .customers
        .insert(Customer::create(body.into_inner())?)
        .await?;
    info!(id = %customer.id, "customer created");
    Ok(created("Customer created successfully", customer))
}

#[put("/{id}")]
pub async fn update_customer(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<CustomerInput>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let customer = state
        .db
        .customers
        .update_by_id(&id, |c: &mut Customer| c.apply(input))
        .await?
        .ok_or_else(|| ApiError::not_found("Customer"))?;
    Ok(ok(ApiResponse::with_message(
        "Customer updated successfully",
        customer,
    )))
}

#[delete("/{id}")]
pub async fn delete_customer(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state
        .db
        .customers
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Customer"))?;
    info!(id = %id, "customer deleted");
    Ok(ok(ApiResponse::message("Customer deleted successfully")))
}
