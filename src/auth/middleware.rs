//! Authentication Middleware
//! Mission: Single checkpoint that turns a bearer token into request identity

use crate::auth::{jwt::JwtHandler, models::Claims};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::debug;

/// Auth middleware that validates JWT tokens
pub async fn auth_middleware(
    State(jwt_handler): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, GuardError> {
    let token = bearer_token(req.headers()).ok_or(GuardError::MissingToken)?;

    let claims = jwt_handler.verify(token).map_err(|e| {
        debug!(path = %req.uri().path(), reason = %e, "Rejected bearer token");
        GuardError::InvalidToken
    })?;

    // Handlers read identity from here, never from the body
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Token from `Authorization: Bearer <token>`, if one is present
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

/// Verified identity of the caller, inserted by [`auth_middleware`]
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = GuardError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Missing claims means the route was mounted outside the guard
        parts
            .extensions
            .get::<Claims>()
            .cloned()
            .map(AuthUser)
            .ok_or(GuardError::MissingToken)
    }
}

/// Guard outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardError {
    MissingToken,
    InvalidToken,
}

impl IntoResponse for GuardError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            GuardError::MissingToken => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            GuardError::InvalidToken => (StatusCode::FORBIDDEN, "Forbidden"),
        };

        (status, message).into_response()
    }
}
