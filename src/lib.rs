pub mod auth;
pub mod config;
pub mod coupon_handlers;
pub mod customer_handlers;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod order_handlers;
pub mod product_handlers;
pub mod response;
pub mod store_settings_handlers;
pub mod upload_handlers;
pub mod user_handlers;
pub mod validation;

use actix_web::{get, web, HttpResponse, Responder};
use auth::TokenIssuer;
use config::Config;
use db::Database;
use error::ApiError;
use response::{ok, ApiResponse};
use serde_json::json;
use upload_handlers::UploadSettings;

/// Shared state handed to every handler through `web::Data`.
pub struct AppState {
    pub db: Database,
    pub tokens: TokenIssuer,
    pub uploads: UploadSettings,
}

impl AppState {
    pub fn new(db: Database, config: &Config) -> Self {
        Self {
            db,
            tokens: TokenIssuer::new(config.jwt_secret.as_bytes()),
            uploads: UploadSettings {
                dir: config.upload_dir.clone(),
                max_bytes: config.max_upload_bytes,
            },
        }
    }
}

#[get("/")]
async fn index() -> impl Responder {
    ok(ApiResponse::with_message(
        "Welcome to the Storefront API",
        json!({
            "endpoints": {
                "health": "GET /health",
                "products": "/api/products",
                "users": "/api/users",
                "customers": "/api/customers",
                "orders": "/api/orders",
                "coupons": "/api/coupons",
                "storeSettings": "/api/store-settings",
                "upload": "POST /api/upload/image",
                "uploads": "GET /uploads/{filename}",
            }
        }),
    ))
}

#[get("/health")]
async fn health() -> impl Responder {
    ok(ApiResponse::message("OK"))
}

async fn route_not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("Route not found".into()))
}

/// Register every route, the extractor error handlers and the 404 fallback.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| ApiError::Rejected(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| ApiError::Rejected(err.to_string()).into()),
    )
    .service(index)
    .service(health)
    .service(
        web::scope("/api/products")
            .service(product_handlers::list_products)
            .service(product_handlers::create_product)
            .service(product_handlers::get_product)
            .service(product_handlers::update_product)
            .service(product_handlers::delete_product),
    )
    .service(
        web::scope("/api/users")
            .service(user_handlers::login)
            .service(user_handlers::list_users)
            .service(user_handlers::create_user)
            .service(user_handlers::get_user)
            .service(user_handlers::update_user)
            .service(user_handlers::delete_user),
    )
    .service(
        web::scope("/api/customers")
            .service(customer_handlers::list_customers)
            .service(customer_handlers::create_customer)
            .service(customer_handlers::get_customer)
            .service(customer_handlers::update_customer)
            .service(customer_handlers::delete_customer),
    )
    .service(
        web::scope("/api/orders")
            .service(order_handlers::list_orders)
            .service(order_handlers::create_order)
            .service(order_handlers::get_order)
            .service(order_handlers::update_order)
            .service(order_handlers::update_order_status)
            .service(order_handlers::delete_order),
    )
    .service(
        web::scope("/api/coupons")
            .service(coupon_handlers::list_coupons)
            .service(coupon_handlers::create_coupon)
            .service(coupon_handlers::get_coupon_by_code)
            .service(coupon_handlers::use_coupon)
            .service(coupon_handlers::get_coupon)
            .service(coupon_handlers::update_coupon)
            .service(coupon_handlers::delete_coupon),
    )
    .service(
        web::scope("/api/store-settings")
            .service(store_settings_handlers::get_store_settings)
            .service(store_settings_handlers::create_store_settings)
            .service(store_settings_handlers::update_store_settings)
            .service(store_settings_handlers::delete_store_settings),
    )
    .service(web::scope("/api/upload").service(upload_handlers::upload_image))
    .service(upload_handlers::serve_upload)
    .default_service(web::to(route_not_found));
}
