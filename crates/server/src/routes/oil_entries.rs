use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::oil_entry::OilEntry;
use deployment::Deployment;
use services::services::oil_entries::{CreateOilEntry, OilEntryService, UpdateOilEntry};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::CurrentUser};

/// List oil entries, newest first
pub async fn list_entries(
    State(deployment): State<DeploymentImpl>,
    _user: CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<OilEntry>>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let entries = OilEntryService::list(active.store.as_ref()).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

/// Record a sale or purchase
pub async fn create_entry(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Json(payload): Json<CreateOilEntry>,
) -> Result<ResponseJson<ApiResponse<OilEntry>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let entry = OilEntryService::create(active.store.as_ref(), &user, payload).await?;
    Ok(ResponseJson(ApiResponse::success(entry)))
}

/// Submit several entries at once; nothing is stored if any entry is invalid.
pub async fn create_entries_bulk(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Json(payload): Json<Vec<CreateOilEntry>>,
) -> Result<ResponseJson<ApiResponse<Vec<OilEntry>>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let entries = OilEntryService::create_bulk(active.store.as_ref(), &user, payload).await?;
    let message = format!("{} entries submitted", entries.len());
    Ok(ResponseJson(ApiResponse::success_with_message(entries, message)))
}

/// Get a single oil entry
pub async fn get_entry(
    State(deployment): State<DeploymentImpl>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<OilEntry>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let entry = OilEntryService::get(active.store.as_ref(), id).await?;
    Ok(ResponseJson(ApiResponse::success(entry)))
}

/// Edit an oil entry the caller may modify
pub async fn update_entry(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOilEntry>,
) -> Result<ResponseJson<ApiResponse<OilEntry>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let entry = OilEntryService::update(active.store.as_ref(), &user, id, payload).await?;
    Ok(ResponseJson(ApiResponse::success(entry)))
}

/// Delete an oil entry the caller may modify
pub async fn delete_entry(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    OilEntryService::delete(active.store.as_ref(), &user, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/oil-entries", get(list_entries).post(create_entry))
        .route("/oil-entries/bulk", post(create_entries_bulk))
        .route(
            "/oil-entries/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}
