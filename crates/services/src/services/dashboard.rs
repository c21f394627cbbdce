//! Everything the main screen needs in one call.

use db::models::{
    oil_entry::OilEntry,
    report::Report,
    setting::DataSource,
    user::{Role, User, UserInfo},
    vehicle::Vehicle,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use ts_rs::TS;

use super::data_source::{ActiveStore, DataStore, StoreError};

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct DashboardData {
    pub current_user: UserInfo,
    pub data_source: DataSource,
    pub oil_entries: Vec<OilEntry>,
    pub vehicles: Vec<Vehicle>,
    pub reports: Vec<Report>,
    /// Empty unless the caller is a SuperAdmin.
    pub users: Vec<UserInfo>,
    pub vendors: Vec<String>,
}

pub struct DashboardService;

impl DashboardService {
    pub async fn load(
        pool: &SqlitePool,
        active: &ActiveStore,
        actor: &UserInfo,
    ) -> Result<DashboardData, DashboardError> {
        let snapshot = active.store.snapshot().await?;

        let users = if actor.role == Role::SuperAdmin {
            User::find_all(pool)
                .await?
                .into_iter()
                .map(UserInfo::from)
                .collect()
        } else {
            Vec::new()
        };

        Ok(DashboardData {
            current_user: actor.clone(),
            data_source: active.source,
            oil_entries: snapshot.entries,
            vehicles: snapshot.vehicles,
            reports: snapshot.reports,
            users,
            vendors: snapshot.vendors,
        })
    }
}
