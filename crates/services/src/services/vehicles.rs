//! Vehicle registry.

use db::models::{
    user::{Role, UserInfo},
    vehicle::Vehicle,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use ts_rs::TS;

use super::{
    access::{AccessDenied, require_role},
    data_source::{DataStore, StoreError},
};

#[derive(Debug, Error)]
pub enum VehicleError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("{0}")]
    Validation(String),
    #[error("vehicle {0} already exists")]
    Conflict(String),
    #[error("vehicle not found")]
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateVehicle {
    pub vehicle_no: String,
    pub oil_in_liters: Option<f64>,
    #[serde(default)]
    pub contractor: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateVehicle {
    pub oil_in_liters: Option<f64>,
    pub contractor: Option<String>,
}

pub struct VehicleService;

impl VehicleService {
    pub async fn list(store: &dyn DataStore) -> Result<Vec<Vehicle>, VehicleError> {
        Ok(store.list_vehicles().await?)
    }

    pub async fn create(
        store: &dyn DataStore,
        actor: &UserInfo,
        input: CreateVehicle,
    ) -> Result<Vehicle, VehicleError> {
        let vehicle_no = input.vehicle_no.trim().to_string();
        if vehicle_no.is_empty() {
            return Err(VehicleError::Validation(
                "vehicle number is required".to_string(),
            ));
        }
        validate_liters(input.oil_in_liters)?;
        if store.find_vehicle(&vehicle_no).await?.is_some() {
            return Err(VehicleError::Conflict(vehicle_no));
        }

        let vehicle = Vehicle {
            vehicle_no,
            oil_in_liters: input.oil_in_liters,
            contractor: input.contractor.trim().to_string(),
        };
        store.insert_vehicle(&vehicle).await?;
        info!(vehicle_no = %vehicle.vehicle_no, added_by = %actor.full_name, "Vehicle added");
        Ok(vehicle)
    }

    pub async fn update(
        store: &dyn DataStore,
        actor: &UserInfo,
        vehicle_no: &str,
        patch: UpdateVehicle,
    ) -> Result<Vehicle, VehicleError> {
        require_role(actor, Role::Admin)?;
        validate_liters(patch.oil_in_liters)?;
        let mut vehicle = store
            .find_vehicle(vehicle_no)
            .await?
            .ok_or(VehicleError::NotFound)?;

        if patch.oil_in_liters.is_some() {
            vehicle.oil_in_liters = patch.oil_in_liters;
        }
        if let Some(contractor) = patch.contractor {
            vehicle.contractor = contractor.trim().to_string();
        }

        if !store.update_vehicle(&vehicle).await? {
            return Err(VehicleError::NotFound);
        }
        info!(vehicle_no, updated_by = %actor.full_name, "Vehicle updated");
        Ok(vehicle)
    }

    pub async fn delete(
        store: &dyn DataStore,
        actor: &UserInfo,
        vehicle_no: &str,
    ) -> Result<(), VehicleError> {
        require_role(actor, Role::Admin)?;
        if store.find_vehicle(vehicle_no).await?.is_none() {
            return Err(VehicleError::NotFound);
        }
        if !store.delete_vehicle(vehicle_no).await? {
            return Err(VehicleError::NotFound);
        }
        info!(vehicle_no, deleted_by = %actor.full_name, "Vehicle deleted");
        Ok(())
    }
}

fn validate_liters(liters: Option<f64>) -> Result<(), VehicleError> {
    match liters {
        Some(l) if !l.is_finite() || l < 0.0 => Err(VehicleError::Validation(
            "oil in liters cannot be negative".to_string(),
        )),
        _ => Ok(()),
    }
}
