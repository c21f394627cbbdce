use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::user::UserInfo;
use deployment::Deployment;
use services::services::users::{CreateUserRequest, UpdateUserRequest, UserService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError, middleware::CurrentUser};

/// List user accounts
pub async fn list_users(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<UserInfo>>>, ApiError> {
    let users = UserService::list(&deployment.db().pool, &user).await?;
    Ok(ResponseJson(ApiResponse::success(users)))
}

/// Create a user account
pub async fn create_user(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Json(payload): Json<CreateUserRequest>,
) -> Result<ResponseJson<ApiResponse<UserInfo>>, ApiError> {
    let created = UserService::create(
        &deployment.db().pool,
        deployment.data_sources(),
        &user,
        payload,
        deployment.config().bcrypt_cost,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(created)))
}

/// Update a user account
pub async fn update_user(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<ResponseJson<ApiResponse<UserInfo>>, ApiError> {
    let updated = UserService::update(
        &deployment.db().pool,
        deployment.data_sources(),
        &user,
        id,
        payload,
        deployment.config().bcrypt_cost,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// Delete a user account and its sessions
pub async fn delete_user(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    UserService::delete(&deployment.db().pool, deployment.data_sources(), &user, id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/{id}", put(update_user).delete(delete_user))
}
