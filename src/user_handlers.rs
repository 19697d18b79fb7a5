use crate::auth::{authenticate, password, require_admin};
use crate::error::ApiError;
use crate::models::{Identity, LoginRequest, LoginResponse, User, UserInput, UserView};
use crate::response::{created, ok, ApiResponse};
use crate::AppState;
use actix_web::{delete, get, middleware::from_fn, post, put, web, HttpResponse};
use tracing::{info, warn};

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> Result<HttpResponse, ApiError> {
    let (username, plaintext) = body.into_inner().into_credentials()?;

    let Some(user) = state.db.users.find_one(|u| u.username == username).await else {
        warn!(%username, "login for unknown user");
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.into()));
    };

    if !password::verify_blocking(plaintext, user.password.clone()).await? {
        warn!(%username, "login with wrong password");
        return Err(ApiError::Unauthenticated(INVALID_CREDENTIALS.into()));
    }

    let token = state.tokens.issue(&user.id, &user.username, user.role)?;
    info!(%username, role = %user.role, "login succeeded");
    Ok(ok(ApiResponse::with_message(
        "Login successful",
        LoginResponse {
            token,
            user: UserView::from(&user),
        },
    )))
}

#[post("", wrap = "from_fn(require_admin)", wrap = "from_fn(authenticate)")]
pub async fn create_user(
    state: web::Data<AppState>,
    actor: Identity,
    body: web::Json<UserInput>,
) -> Result<HttpResponse, ApiError> {
    let new_user = body.into_inner().into_new()?;
    let digest = password::hash_blocking(new_user.password).await?;
    let user = state
        .db
        .users
        .insert(User::new(new_user.username, digest, new_user.role))
        .await?;
    info!(by = %actor.username, username = %user.username, role = %user.role, "user created");
    Ok(created("User created successfully", UserView::from(&user)))
}

#[get("", wrap = "from_fn(authenticate)")]
pub async fn list_users(state: web::Data<AppState>) -> HttpResponse {
    let users = state.db.users.find_all().await;
    ok(ApiResponse::list(
        users.iter().map(UserView::from).collect::<Vec<_>>(),
    ))
}

#[get("/{id}", wrap = "from_fn(authenticate)")]
pub async fn get_user(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let user = state
        .db
        .users
        .find_by_id(&id)
        .await
        .ok_or_else(|| ApiError::not_found("User"))?;
    Ok(ok(ApiResponse::data(UserView::from(&user))))
}

#[put("/{id}", wrap = "from_fn(require_admin)", wrap = "from_fn(authenticate)")]
pub async fn update_user(
    state: web::Data<AppState>,
    actor: Identity,
    id: web::Path<String>,
    body: web::Json<UserInput>,
) -> Result<HttpResponse, ApiError> {
    let mut changes = body.into_inner().into_changes()?;
    let digest = match changes.password.take() {
        Some(plaintext) => Some(password::hash_blocking(plaintext).await?),
        None => None,
    };

    let user = state
        .db
        .users
        .update_by_id(&id, |u: &mut User| -> Result<(), ApiError> {
            u.apply(changes, digest);
            Ok(())
        })
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    info!(by = %actor.username, id = %user.id, "user updated");
    Ok(ok(ApiResponse::with_message(
        "User updated successfully",
        UserView::from(&user),
    )))
}

#[delete("/{id}", wrap = "from_fn(require_admin)", wrap = "from_fn(authenticate)")]
pub async fn delete_user(
    state: web::Data<AppState>,
    actor: Identity,
    id: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    state
        .db
        .users
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::not_found("User"))?;
    info!(by = %actor.username, id = %id, "user deleted");
    Ok(ok(ApiResponse::message("User deleted successfully")))
}
