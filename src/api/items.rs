//! Marketplace item endpoints

use crate::api::{error::ApiError, routes::AppState};
use crate::auth::middleware::AuthUser;
use crate::marketplace::{Created, Item, ItemDetail, ItemFilter, ItemListing, NewItem};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use tracing::info;

/// List an item for sale - POST /api/items
pub async fn create_item(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    Json(payload): Json<NewItem>,
) -> Result<(StatusCode, Json<Created>), ApiError> {
    payload.validate().map_err(ApiError::BadRequest)?;

    let id = state.market.create_item(claims.id, &payload)?;
    info!("User {} listed item {}", claims.id, id);

    Ok((
        StatusCode::CREATED,
        Json(Created {
            id,
            message: "Item listed successfully".to_string(),
        }),
    ))
}

/// Available items - GET /api/items?category=&search=&maxPrice=
pub async fn list_items(
    State(state): State<AppState>,
    Query(filter): Query<ItemFilter>,
) -> Result<Json<Vec<ItemListing>>, ApiError> {
    Ok(Json(state.market.list_items(&filter)?))
}

/// Single item with seller contact - GET /api/items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemDetail>, ApiError> {
    state
        .market
        .get_item(id)?
        .map(Json)
        .ok_or(ApiError::NotFound("Item not found".to_string()))
}

/// Caller's own listings, sold ones included - GET /api/my-items
pub async fn my_items(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
) -> Result<Json<Vec<Item>>, ApiError> {
    Ok(Json(state.market.items_for_user(claims.id)?))
}
