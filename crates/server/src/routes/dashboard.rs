use axum::{Router, extract::State, response::Json as ResponseJson, routing::get};
use deployment::Deployment;
use services::services::dashboard::{DashboardData, DashboardService};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::CurrentUser};

/// Get everything the dashboard shows in one response
pub async fn get_dashboard(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<ResponseJson<ApiResponse<DashboardData>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let data = DashboardService::load(&deployment.db().pool, &active, &user).await?;
    Ok(ResponseJson(ApiResponse::success(data)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/dashboard", get(get_dashboard))
}
