use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::setting::Setting;
use deployment::Deployment;
use services::services::settings::{
    SettingsService, SettingsView, SheetConnectionStatus, UpdateSetting,
};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::CurrentUser};

/// Get the active data source and stored settings
pub async fn get_settings(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<ResponseJson<ApiResponse<SettingsView>>, ApiError> {
    let view =
        SettingsService::view(&deployment.db().pool, deployment.data_sources(), &user).await?;
    Ok(ResponseJson(ApiResponse::success(view)))
}

/// Change a setting
pub async fn update_setting(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Json(payload): Json<UpdateSetting>,
) -> Result<ResponseJson<ApiResponse<Setting>>, ApiError> {
    let setting = SettingsService::set(
        &deployment.db().pool,
        deployment.data_sources(),
        &user,
        payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(setting)))
}

/// Check that the sheet endpoint answers
pub async fn test_connection(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<ResponseJson<ApiResponse<SheetConnectionStatus>>, ApiError> {
    let status = SettingsService::test_connection(deployment.data_sources(), &user).await?;
    Ok(ResponseJson(ApiResponse::success(status)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/settings", get(get_settings).post(update_setting))
        .route("/settings/test-connection", post(test_connection))
}
