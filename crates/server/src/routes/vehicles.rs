use axum::{
    Json, Router,
    extract::{Path, State},
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::vehicle::Vehicle;
use deployment::Deployment;
use services::services::vehicles::{CreateVehicle, UpdateVehicle, VehicleService};
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::CurrentUser};

/// List vehicles
pub async fn list_vehicles(
    State(deployment): State<DeploymentImpl>,
    _user: CurrentUser,
) -> Result<ResponseJson<ApiResponse<Vec<Vehicle>>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let vehicles = VehicleService::list(active.store.as_ref()).await?;
    Ok(ResponseJson(ApiResponse::success(vehicles)))
}

/// Register a vehicle
pub async fn create_vehicle(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Json(payload): Json<CreateVehicle>,
) -> Result<ResponseJson<ApiResponse<Vehicle>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let vehicle = VehicleService::create(active.store.as_ref(), &user, payload).await?;
    Ok(ResponseJson(ApiResponse::success(vehicle)))
}

/// Update a vehicle
pub async fn update_vehicle(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Path(vehicle_no): Path<String>,
    Json(payload): Json<UpdateVehicle>,
) -> Result<ResponseJson<ApiResponse<Vehicle>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    let vehicle =
        VehicleService::update(active.store.as_ref(), &user, &vehicle_no, payload).await?;
    Ok(ResponseJson(ApiResponse::success(vehicle)))
}

/// Delete a vehicle
pub async fn delete_vehicle(
    State(deployment): State<DeploymentImpl>,
    CurrentUser { user, .. }: CurrentUser,
    Path(vehicle_no): Path<String>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    let active = deployment.data_sources().resolve().await?;
    VehicleService::delete(active.store.as_ref(), &user, &vehicle_no).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new()
        .route("/vehicles", get(list_vehicles).post(create_vehicle))
        .route(
            "/vehicles/{vehicle_no}",
            put(update_vehicle).delete(delete_vehicle),
        )
}
