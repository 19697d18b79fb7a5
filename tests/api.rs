use actix_web::{
    http::{header, StatusCode},
    test, web, App,
};
use chrono::{Duration, Utc};
use serde_json::{json, Value};
use storefront_api::{
    auth::password,
    config::Config,
    configure,
    db::Database,
    models::{Role, User},
    AppState,
};
use tempfile::TempDir;

const SECRET: &str = "integration-test-secret";

fn state_with(upload_dir: &TempDir, max_upload_bytes: usize) -> web::Data<AppState> {
    let dir = upload_dir.path().to_string_lossy().into_owned();
    let max = max_upload_bytes.to_string();
    let config = Config::from_lookup(|key| match key {
        "JWT_SECRET" => Some(SECRET.to_string()),
        "UPLOAD_DIR" => Some(dir.clone()),
        "MAX_UPLOAD_BYTES" => Some(max.clone()),
        _ => None,
    })
    .unwrap();
    web::Data::new(AppState::new(Database::in_memory(), &config))
}

fn state() -> (web::Data<AppState>, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    (state_with(&dir, 5 * 1024 * 1024), dir)
}

macro_rules! app {
    ($state:expr) => {
        test::init_service(App::new().app_data($state.clone()).configure(configure)).await
    };
}

async fn add_user(state: &AppState, username: &str, role: Role) -> String {
    let digest = password::hash("password123").unwrap();
    let user = state
        .db
        .users
        .insert(User::new(username.into(), digest, role))
        .await
        .unwrap();
    state.tokens.issue(&user.id, &user.username, role).unwrap()
}

fn bearer(token: &str) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

fn coupon_body(code: &str, usage_limit: i64, expiry: chrono::DateTime<Utc>) -> Value {
    json!({
        "code": code,
        "name": "Twenty off",
        "discount": 20,
        "usageLimit": usage_limit,
        "expiryDate": expiry.to_rfc3339(),
    })
}

#[actix_web::test]
async fn health_and_unknown_route() {
    let (state, _dir) = state();
    let app = app!(state);

    let req = test::TestRequest::get().uri("/health").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"success": true, "message": "OK"}));

    let req = test::TestRequest::get().uri("/nowhere").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Route not found");
}

#[actix_web::test]
async fn login_checks_credentials_and_hides_digest() {
    let (state, _dir) = state();
    state.db.seed_admin("admin", "password123").await.unwrap();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({"username": "admin", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid credentials");

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({"username": "ghost", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::post()
        .uri("/api/users/login")
        .set_json(json!({"username": "admin", "password": "password123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let token = body["data"]["token"].as_str().unwrap();
    assert_eq!(body["data"]["user"]["role"], "admin");
    assert!(body["data"]["user"].get("password").is_none());

    let claims = state.tokens.verify(token).unwrap();
    assert_eq!(claims.username, "admin");
}

#[actix_web::test]
async fn user_routes_are_gated() {
    let (state, _dir) = state();
    let admin = add_user(&state, "admin", Role::Admin).await;
    let user = add_user(&state, "bob", Role::User).await;
    let app = app!(state);
    let new_user = json!({"username": "carol", "password": "pw123456"});

    let req = test::TestRequest::post()
        .uri("/api/users")
        .set_json(&new_user)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Access token required");

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer("not-a-token"))
        .set_json(&new_user)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Invalid or expired token");

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&user))
        .set_json(&new_user)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Admin access required");

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .set_json(&new_user)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["username"], "carol");
    assert_eq!(body["data"]["role"], "user");
    assert!(body["data"].get("password").is_none());

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header(bearer(&user))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 3);
    for u in body["data"].as_array().unwrap() {
        assert!(u.get("password").is_none());
    }
}

#[actix_web::test]
async fn duplicate_username_is_rejected() {
    let (state, _dir) = state();
    let admin = add_user(&state, "admin", Role::Admin).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .set_json(json!({"username": "admin", "password": "x"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "username");
}

#[actix_web::test]
async fn validation_reports_every_missing_field() {
    let (state, _dir) = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    let fields: Vec<&str> = body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["field"].as_str().unwrap())
        .collect();
    for field in ["name", "price", "category", "sku"] {
        assert!(fields.contains(&field), "missing {field} in {fields:?}");
    }
}

#[actix_web::test]
async fn malformed_json_is_a_bad_request() {
    let (state, _dir) = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .insert_header((header::CONTENT_TYPE, "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
}

#[actix_web::test]
async fn product_crud() {
    let (state, _dir) = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({"name": "Widget", "price": 9.5, "category": "Tools", "sku": "W-1"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let id = body["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(body["message"], "Product created successfully");

    let req = test::TestRequest::put()
        .uri(&format!("/api/products/{id}"))
        .set_json(json!({"price": 12.0}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["price"], 12.0);
    assert_eq!(body["data"]["name"], "Widget");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/products/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/products/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Product not found");
}

#[actix_web::test]
async fn coupon_can_be_used_up_to_its_limit() {
    let (state, _dir) = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/coupons")
        .set_json(coupon_body("TEST20", 1, Utc::now() + Duration::days(7)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let req = test::TestRequest::get()
        .uri("/api/coupons/code/TEST20")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::patch()
        .uri("/api/coupons/TEST20/use")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["usageCount"], 1);

    let req = test::TestRequest::patch()
        .uri("/api/coupons/TEST20/use")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "Coupon usage limit exceeded");

    let req = test::TestRequest::get()
        .uri("/api/coupons/code/TEST20")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::patch()
        .uri("/api/coupons/MISSING/use")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn expired_coupon_reports_expiry_first() {
    let (state, _dir) = state();
    let app = app!(state);

    let mut body = coupon_body("OLD", 1, Utc::now() - Duration::days(1));
    body["usageCount"] = json!(1);
    let req = test::TestRequest::post()
        .uri("/api/coupons")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    for req in [
        test::TestRequest::get().uri("/api/coupons/code/OLD").to_request(),
        test::TestRequest::patch().uri("/api/coupons/OLD/use").to_request(),
    ] {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Coupon has expired");
    }
}

#[actix_web::test]
async fn concurrent_redemptions_of_last_use_succeed_once() {
    let (state, _dir) = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/coupons")
        .set_json(coupon_body("LAST", 1, Utc::now() + Duration::days(1)))
        .to_request();
    test::call_service(&app, req).await;

    let attempts = (0..8).map(|_| {
        test::call_service(
            &app,
            test::TestRequest::patch().uri("/api/coupons/LAST/use").to_request(),
        )
    });
    let responses = futures_util::future::join_all(attempts).await;
    let successes = responses
        .iter()
        .filter(|r| r.status() == StatusCode::OK)
        .count();
    assert_eq!(successes, 1);

    let coupon = state
        .db
        .coupons
        .find_one(|c| c.code == "LAST")
        .await
        .unwrap();
    assert_eq!(coupon.usage_count, 1);
}

#[actix_web::test]
async fn orders_populate_references_and_validate_status() {
    let (state, _dir) = state();
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/customers")
        .set_json(json!({"name": "Ann", "email": "ann@example.com"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let customer_id = body["data"]["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/products")
        .set_json(json!({"name": "Widget", "price": 9.5, "category": "Tools", "sku": "W-1"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let product_id = body["data"]["_id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri("/api/orders")
        .set_json(json!({
            "customerId": customer_id,
            "customerName": "Ann",
            "total": 19.0,
            "items": [{"productId": product_id, "quantity": 2, "price": 9.5, "name": "Widget"}],
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let order_id = body["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["customerId"]["email"], "ann@example.com");
    assert_eq!(body["data"]["items"][0]["productId"]["sku"], "W-1");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/orders/{order_id}/status"))
        .set_json(json!({"status": "shipped"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(
        body["message"],
        "Invalid status. Must be one of: pending, processing, completed, cancelled"
    );

    let req = test::TestRequest::patch()
        .uri(&format!("/api/orders/{order_id}/status"))
        .set_json(json!({"status": "completed"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["status"], "completed");

    let req = test::TestRequest::get().uri("/api/orders").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["count"], 1);
    assert_eq!(body["data"][0]["customerId"]["name"], "Ann");
}

#[actix_web::test]
async fn store_settings_defaults_are_created_once() {
    let (state, _dir) = state();
    let app = app!(state);

    for _ in 0..2 {
        let req = test::TestRequest::get().uri("/api/store-settings").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["storeName"], "My Store");
    }
    assert_eq!(state.db.store_settings.count().await, 1);

    let req = test::TestRequest::post()
        .uri("/api/store-settings")
        .set_json(json!({"storeName": "Second"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::put()
        .uri("/api/store-settings")
        .set_json(json!({"storeName": "Corner Shop"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["storeName"], "Corner Shop");

    let req = test::TestRequest::delete().uri("/api/store-settings").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete().uri("/api/store-settings").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

fn multipart(field: &str, filename: &str, mime: &str, data: &[u8]) -> (String, Vec<u8>) {
    let boundary = "----storefront-test-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: {mime}\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    (format!("multipart/form-data; boundary={boundary}"), body)
}

#[actix_web::test]
async fn image_upload_is_stored_and_served() {
    let (state, dir) = state();
    let app = app!(state);

    let (content_type, payload) = multipart("image", "photo.png", "image/png", b"fake-png-bytes");
    let req = test::TestRequest::post()
        .uri("/api/upload/image")
        .insert_header((header::CONTENT_TYPE, content_type))
        .set_payload(payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let filename = body["data"]["filename"].as_str().unwrap().to_string();
    assert!(filename.starts_with("image-") && filename.ends_with(".png"));
    assert_eq!(body["data"]["originalName"], "photo.png");
    assert_eq!(body["data"]["size"], 14);
    assert!(body["data"]["url"]
        .as_str()
        .unwrap()
        .ends_with(&format!("/uploads/{filename}")));
    assert!(dir.path().join(&filename).exists());

    let req = test::TestRequest::get()
        .uri(&format!("/uploads/{filename}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers().get(header::CONTENT_TYPE).unwrap(), "image/png");
    assert_eq!(&test::read_body(resp).await[..], b"fake-png-bytes");
}

#[actix_web::test]
async fn image_upload_rejections() {
    let dir = tempfile::tempdir().unwrap();
    let state = state_with(&dir, 8);
    let app = app!(state);

    let cases = [
        (multipart("image", "notes.txt", "text/plain", b"hi"), "Only image files are allowed!"),
        (multipart("file", "photo.png", "image/png", b"hi"), "No image file provided"),
        (
            multipart("image", "photo.png", "image/png", b"far too many bytes"),
            "File size too large. Maximum size is 8 bytes.",
        ),
    ];
    for ((content_type, payload), message) in cases {
        let req = test::TestRequest::post()
            .uri("/api/upload/image")
            .insert_header((header::CONTENT_TYPE, content_type))
            .set_payload(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], message);
    }

    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

macro_rules! login_status {
    ($app:expr, $username:expr, $password:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/users/login")
            .set_json(json!({"username": $username, "password": $password}))
            .to_request();
        test::call_service(&$app, req).await.status()
    }};
}

#[actix_web::test]
async fn user_update_rehashes_only_new_passwords() {
    let (state, _dir) = state();
    let admin = add_user(&state, "admin", Role::Admin).await;
    let app = app!(state);

    let req = test::TestRequest::post()
        .uri("/api/users")
        .insert_header(bearer(&admin))
        .set_json(json!({"username": "dave", "password": "old-pass"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["_id"].as_str().unwrap().to_string();
    assert_eq!(login_status!(app, "dave", "old-pass"), StatusCode::OK);

    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{id}"))
        .insert_header(bearer(&admin))
        .set_json(json!({"password": "new-pass"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(login_status!(app, "dave", "new-pass"), StatusCode::OK);
    assert_eq!(login_status!(app, "dave", "old-pass"), StatusCode::UNAUTHORIZED);

    let digest = state.db.users.find_by_id(&id).await.unwrap().password;
    let req = test::TestRequest::put()
        .uri(&format!("/api/users/{id}"))
        .insert_header(bearer(&admin))
        .set_json(json!({"role": "admin"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["role"], "admin");
    assert!(body["data"].get("password").is_none());
    assert_eq!(state.db.users.find_by_id(&id).await.unwrap().password, digest);
    assert_eq!(login_status!(app, "dave", "new-pass"), StatusCode::OK);
}

#[actix_web::test]
async fn user_reads_are_stable_and_delete_removes() {
    let (state, _dir) = state();
    let admin = add_user(&state, "admin", Role::Admin).await;
    let id = state
        .db
        .users
        .find_one(|u| u.username == "admin")
        .await
        .unwrap()
        .id;
    let app = app!(state);

    let get = || {
        test::TestRequest::get()
            .uri(&format!("/api/users/{id}"))
            .insert_header(bearer(&admin))
            .to_request()
    };
    let first: Value = test::call_and_read_body_json(&app, get()).await;
    let second: Value = test::call_and_read_body_json(&app, get()).await;
    assert_eq!(first, second);
    assert_eq!(first["data"]["username"], "admin");

    let req = test::TestRequest::delete()
        .uri(&format!("/api/users/{id}"))
        .insert_header(bearer(&admin))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["message"], "User deleted successfully");

    let resp = test::call_service(&app, get()).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "User not found");
}

#[actix_web::test]
async fn empty_bearer_token_counts_as_missing() {
    let (state, _dir) = state();
    let app = app!(state);

    for value in ["Bearer", "Bearer ", ""] {
        let req = test::TestRequest::get()
            .uri("/api/users")
            .insert_header((header::AUTHORIZATION, value))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "header {value:?}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Access token required");
    }

    let req = test::TestRequest::get()
        .uri("/api/users")
        .insert_header((header::AUTHORIZATION, "Basic dXNlcjpwYXNz"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn coupon_writes_keep_count_within_limit() {
    let (state, _dir) = state();
    let app = app!(state);

    let mut body = coupon_body("OVER", 1, Utc::now() + Duration::days(7));
    body["usageCount"] = json!(5);
    let req = test::TestRequest::post()
        .uri("/api/coupons")
        .set_json(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "usageCount");

    let req = test::TestRequest::post()
        .uri("/api/coupons")
        .set_json(coupon_body("THREE", 3, Utc::now() + Duration::days(7)))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["_id"].as_str().unwrap().to_string();
    for _ in 0..3 {
        let req = test::TestRequest::patch()
            .uri("/api/coupons/THREE/use")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    let req = test::TestRequest::put()
        .uri(&format!("/api/coupons/{id}"))
        .set_json(json!({"usageLimit": 1}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"][0]["field"], "usageCount");

    let stored = state.db.coupons.find_by_id(&id).await.unwrap();
    assert_eq!((stored.usage_count, stored.usage_limit), (3, 3));
}
