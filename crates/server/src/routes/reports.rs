use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, post, put},
};
use db::models::report::Report;
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::reports::ReportService;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::CurrentUser};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct UpdateTrips {
    pub trip_after_oil_change: i64,
}

/// List the per-vehicle oil change reports
pub async fn list_reports(
    State(deployment): State<DeploymentImpl>,
    _user: CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<Report>>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let reports = ReportService::list(active.store.as_ref()).await?;
    Ok(ResponseJson(ApiResponse::success(reports)))
}

/// Rebuild reports from the latest sales
pub async fn generate_reports(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<Report>>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let reports = ReportService::generate(active.store.as_ref(), &user).await?;
    Ok(ResponseJson(ApiResponse::success(reports)))
}

/// Set the trip count since the last oil change
pub async fn update_trips(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateTrips>,
) -> Result<ResponseJson<ApiResponse<Report>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let report = ReportService::update_trips(
        active.store.as_ref(),
        &user,
        id,
        payload.trip_after_oil_change,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(report)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/reports", get(list_reports))
        .route("/reports/generate", post(generate_reports))
        .route("/reports/{id}/trips", put(update_trips))
}
