//! Lost & found board

use crate::api::{error::ApiError, routes::AppState};
use crate::auth::middleware::AuthUser;
use crate::marketplace::{Created, LostFoundFilter, LostFoundListing, NewLostFound};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// POST /api/lost-found
pub async fn create_post(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<NewLostFound>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    payload.validate().map_err(ApiError::BadRequest)?;

    let id = state.market.create_lost_found(claims.id, &payload)?;
    info!("User {} posted {} report {}", claims.id, payload.kind.as_str(), id);

    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "Post created successfully".to_string(),
        }),
    ))
}

/// GET /api/lost-found?type=Lost|Found
pub async fn list_posts(
    State(state): State<AppState>,
    Query(filter): Query<LostFoundFilter>,
) -> Result<Json<Vec<LostFoundListing>>, ApiError> {
    Ok(Json(state.market.list_lost_found(filter.kind)?))
}
