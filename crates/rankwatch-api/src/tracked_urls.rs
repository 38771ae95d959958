use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

use rankwatch_types::api::{
    Claims, CreateTrackedUrlRequest, CreateTrackedUrlResponse, DeleteTrackedUrlResponse,
};
use rankwatch_types::models::TrackedUrl;

use crate::auth::AppState;
use crate::error::ApiError;

pub async fn create_tracked_url(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTrackedUrlRequest>,
) -> Result<(StatusCode, Json<CreateTrackedUrlResponse>), ApiError> {
    let created = state.tracked_urls.create(&claims, req).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_tracked_urls(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<TrackedUrl>>, ApiError> {
    Ok(Json(state.tracked_urls.list(&claims).await?))
}

pub async fn delete_tracked_url(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<Json<DeleteTrackedUrlResponse>, ApiError> {
    state.tracked_urls.delete(&claims, id).await?;
    Ok(Json(DeleteTrackedUrlResponse { success: true }))
}
