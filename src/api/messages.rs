//! Direct messages between users

use crate::api::{error::ApiError, routes::AppState};
use crate::auth::middleware::AuthUser;
use crate::marketplace::{InboxMessage, NewMessage};
use axum::{extract::State, http::StatusCode, Json};

/// Send a message as the authenticated caller - POST /api/messages
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<NewMessage>,
) -> Result<(StatusCode, &'static str), ApiError> {
    payload.validate().map_err(ApiError::BadRequest)?;

    let id = state.market.send_message(claims.id, &payload)?;
    tracing::debug!("User {} sent message {}", claims.id, id);

    Ok((StatusCode::CREATED, "Message sent"))
}

/// Messages received by the caller - GET /api/messages
pub async fn inbox(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<InboxMessage>>, ApiError> {
    Ok(Json(state.market.inbox(claims.id)?))
}
