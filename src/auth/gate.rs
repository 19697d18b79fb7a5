//! Request gate: `authenticate` verifies the bearer token and attaches an
//! [`Identity`]; `require_role` checks that identity against a role.
//!
//! Both run as `middleware::from_fn` layers. A rejection is rendered as the
//! JSON envelope instead of reaching the handler.

use crate::error::ApiError;
use crate::models::{Identity, Role};
use crate::AppState;
use actix_web::{
    body::MessageBody,
    dev::{Payload, ServiceRequest, ServiceResponse},
    http::header,
    middleware::Next,
    web, Error, FromRequest, HttpMessage, HttpRequest,
};
use actix_web_httpauth::extractors::bearer::BearerAuth;
use std::future::{ready, Ready};
use tracing::debug;

pub const TOKEN_REQUIRED: &str = "Access token required";
pub const TOKEN_INVALID: &str = "Invalid or expired token";

/// Second space-separated part of the `Authorization` header. A missing
/// header, a bare scheme or an empty token all count as no token.
fn bearer_token(req: &ServiceRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
}

async fn identify(req: &mut ServiceRequest) -> Result<Identity, ApiError> {
    if bearer_token(req).is_none() {
        debug!(path = req.path(), "no token in authorization header");
        return Err(ApiError::Unauthenticated(TOKEN_REQUIRED.into()));
    }

    let credentials = req.extract::<BearerAuth>().await.map_err(|_| {
        debug!(path = req.path(), "authorization header is not a bearer token");
        ApiError::Forbidden(TOKEN_INVALID.into())
    })?;

    let state = req
        .app_data::<web::Data<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::Unexpected("application state is not configured".into()))?;

    let claims = state.tokens.verify(credentials.token()).map_err(|reason| {
        debug!(path = req.path(), %reason, "bearer token rejected");
        ApiError::Forbidden(TOKEN_INVALID.into())
    })?;
    Ok(Identity::from(claims))
}

pub async fn authenticate(
    mut req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    match identify(&mut req).await {
        Ok(identity) => {
            req.extensions_mut().insert(identity);
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Err(err) => Ok(req.error_response(err).map_into_right_body()),
    }
}

/// Compare the identity attached by [`authenticate`] with `role`. Fails
/// closed when no identity is present.
pub fn require_role(req: &ServiceRequest, role: Role) -> Result<Identity, ApiError> {
    let identity = req
        .extensions()
        .get::<Identity>()
        .cloned()
        .ok_or_else(|| ApiError::Unauthenticated(TOKEN_REQUIRED.into()))?;

    if identity.role != role {
        debug!(username = %identity.username, required = %role, "insufficient privilege");
        return Err(ApiError::Forbidden(match role {
            Role::Admin => "Admin access required".into(),
            Role::User => "User access required".into(),
        }));
    }
    Ok(identity)
}

pub async fn require_admin(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    match require_role(&req, Role::Admin) {
        Ok(_) => next.call(req).await.map(ServiceResponse::map_into_left_body),
        Err(err) => Ok(req.error_response(err).map_into_right_body()),
    }
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<Identity>()
                .cloned()
                .ok_or_else(|| ApiError::Unauthenticated(TOKEN_REQUIRED.into())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    fn identity(role: Role) -> Identity {
        Identity {
            subject_id: "u1".into(),
            username: "alice".into(),
            role,
        }
    }

    #[test]
    fn admin_passes_admin_check() {
        let req = TestRequest::default().to_srv_request();
        req.extensions_mut().insert(identity(Role::Admin));
        assert_eq!(require_role(&req, Role::Admin).unwrap().username, "alice");
    }

    #[test]
    fn user_is_forbidden_from_admin_check() {
        let req = TestRequest::default().to_srv_request();
        req.extensions_mut().insert(identity(Role::User));
        assert!(matches!(
            require_role(&req, Role::Admin),
            Err(ApiError::Forbidden(_))
        ));
    }

    #[test]
    fn token_is_the_second_header_part() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def"))
            .to_srv_request();
        assert_eq!(bearer_token(&req), Some("abc.def"));

        for value in ["Bearer", "Bearer ", ""] {
            let req = TestRequest::default()
                .insert_header((header::AUTHORIZATION, value))
                .to_srv_request();
            assert_eq!(bearer_token(&req), None, "header {value:?}");
        }
        assert_eq!(bearer_token(&TestRequest::default().to_srv_request()), None);
    }

    #[test]
    fn missing_identity_fails_closed() {
        let req = TestRequest::default().to_srv_request();
        assert!(matches!(
            require_role(&req, Role::User),
            Err(ApiError::Unauthenticated(_))
        ));
    }
}
