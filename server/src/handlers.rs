use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use routesketch_shared::{CreatedMap, MapRecord, MapSummary, MapUpdate, NewMapRecord, RecordError};
use serde_json::json;
use thiserror::Error;

use crate::maps::{create_map, get_map, list_maps, map_exists, update_map};
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("map {0} not found")]
    NotFound(i64),
    #[error(transparent)]
    Invalid(#[from] RecordError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(%status, error = %self, "request rejected");
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub async fn ping_handler() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub async fn list_handler(State(state): State<AppState>) -> Json<Vec<MapSummary>> {
    Json(list_maps(&state).await)
}

pub async fn create_handler(
    State(state): State<AppState>,
    Json(input): Json<NewMapRecord>,
) -> Result<(StatusCode, Json<CreatedMap>), ApiError> {
    let id = create_map(&state, input).await?;
    Ok((StatusCode::CREATED, Json(CreatedMap { id })))
}

pub async fn get_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
) -> Result<Json<MapRecord>, ApiError> {
    get_map(&state, id)
        .await
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

pub async fn update_handler(
    Path(id): Path<i64>,
    State(state): State<AppState>,
    Json(update): Json<MapUpdate>,
) -> Result<Json<MapRecord>, ApiError> {
    update_map(&state, id, update)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound(id))
}

pub async fn map_page_handler(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Html<String>, StatusCode> {
    let id = id.parse::<i64>().map_err(|_| StatusCode::NOT_FOUND)?;
    if !map_exists(&state, id).await {
        return Err(StatusCode::NOT_FOUND);
    }
    match tokio::fs::read_to_string(&state.index_file).await {
        Ok(contents) => Ok(Html(contents)),
        Err(error) => {
            tracing::error!(%error, path = ?state.index_file, "failed to read the map page");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
