use crate::db::Database;
use crate::error::ApiError;
use crate::models::{Order, OrderInput, OrderStatus, OrderView, References, StatusUpdate};
use crate::response::{created, ok, ApiResponse};
use crate::AppState;
use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use tracing::info;

const INVALID_STATUS: &str =
    "Invalid status. Must be one of: pending, processing, completed, cancelled";

async fn references(db: &Database) -> References {
    References::new(&db.customers.find_all().await, &db.products.find_all().await)
}

async fn populate(db: &Database, order: Order) -> OrderView {
    references(db).await.populate(order)
}

#[get("")]
pub async fn list_orders(state: web::Data<AppState>) -> HttpResponse {
    let orders = state.db.orders.find_all().await;
    let refs = references(&state.db).await;
    let views: Vec<OrderView> = orders.into_iter().map(|o| refs.populate(o)).collect();
    ok(ApiResponse::list(views))
}

#[get("/{id}")]
pub async fn get_order(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .db
        .orders
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found("Order"))?;
    Ok(ok(ApiResponse::data(populate(&state.db, order).await)))
}

#[post("")]
pub async fn create_order(
    state: web::Data<AppState>,
    body: web::Json<OrderInput>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .db
        .orders
        .insert(Order::create(body.into_inner())?)
        .await?;
    info!(id = %order.id, total = order.total, "order created");
    Ok(created(
        "Order created successfully",
        populate(&state.db, order).await,
    ))
}

#[put("/{id}")]
pub async fn update_order(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<OrderInput>,
) -> Result<HttpResponse, ApiError> {
    let input = body.into_inner();
    let order = state
        .db
        .orders
        .update_by_id(&id, |o: &mut Order| o.apply(input))
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;
    Ok(ok(ApiResponse::with_message(
        "Order updated successfully",
        populate(&state.db, order).await,
    )))
}

#[patch("/{id}/status")]
pub async fn update_order_status(
    state: web::Data<AppState>,
    id: web::Path<String>,
    body: web::Json<StatusUpdate>,
) -> Result<HttpResponse, ApiError> {
    let status = body
        .into_inner()
        .status
        .as_deref()
        .and_then(OrderStatus::parse)
        .ok_or_else(|| ApiError::Rejected(INVALID_STATUS.into()))?;

    let order = state
        .db
        .orders
        .update_by_id(&id, |o: &mut Order| -> Result<(), ApiError> {
            o.status = status;
            Ok(())
        })
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;
    info!(id = %order.id, ?status, "order status changed");
    Ok(ok(ApiResponse::with_message(
        "Order status updated successfully",
        populate(&state.db, order).await,
    )))
}

#[delete("/{id}")]
pub async fn delete_order(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state
        .db
        .orders
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order"))?;
    info!(id = %id, "order deleted");
    Ok(ok(ApiResponse::message("Order deleted successfully")))
}
