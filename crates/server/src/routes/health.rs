use axum::{
    Router, extract::State, http::StatusCode, response::Json as ResponseJson, routing::get,
};
use deployment::Deployment;
use services::services::database_validator::{DatabaseValidator, ValidationResult};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

/// Liveness plus a schema check; 503 when the database is not usable.
pub async fn health_check(
    State(deployment): State<DeploymentImpl>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ValidationResult>>), ApiError> {
    let result = DatabaseValidator::new(deployment.db().pool.clone())
        .validate()
        .await?;

    let status = if result.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let message = result.summary();
    Ok((
        status,
        ResponseJson(ApiResponse::success_with_message(result, message)),
    ))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().route("/health", get(health_check))
}
