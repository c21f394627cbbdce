use async_trait::async_trait;
use db::models::{oil_entry::OilEntry, report::Report, vehicle::Vehicle};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::{DataStore, StoreError};

/// The local SQLite database.
#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

impl SqlStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DataStore for SqlStore {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn list_entries(&self) -> Result<Vec<OilEntry>, StoreError> {
        Ok(OilEntry::find_all(&self.pool).await?)
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<OilEntry>, StoreError> {
        Ok(OilEntry::find_by_id(&self.pool, id).await?)
    }

    async fn insert_entries(&self, entries: &[OilEntry]) -> Result<(), StoreError> {
        match entries {
            [] => Ok(()),
            [single] => Ok(OilEntry::create(&self.pool, single).await?),
            many => Ok(OilEntry::create_many(&self.pool, many).await?),
        }
    }

    async fn update_entry(&self, entry: &OilEntry) -> Result<bool, StoreError> {
        Ok(OilEntry::update(&self.pool, entry).await?)
    }

    async fn delete_entry(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(OilEntry::delete(&self.pool, id).await? > 0)
    }

    async fn list_vendors(&self) -> Result<Vec<String>, StoreError> {
        Ok(OilEntry::find_vendors(&self.pool).await?)
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        Ok(Vehicle::find_all(&self.pool).await?)
    }

    async fn find_vehicle(&self, vehicle_no: &str) -> Result<Option<Vehicle>, StoreError> {
        Ok(Vehicle::find_by_vehicle_no(&self.pool, vehicle_no).await?)
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        Ok(Vehicle::create(&self.pool, vehicle).await?)
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool, StoreError> {
        Ok(Vehicle::update(&self.pool, vehicle).await?)
    }

    async fn delete_vehicle(&self, vehicle_no: &str) -> Result<bool, StoreError> {
        Ok(Vehicle::delete(&self.pool, vehicle_no).await? > 0)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(Report::find_all(&self.pool).await?)
    }

    async fn replace_reports(&self, reports: &[Report]) -> Result<(), StoreError> {
        Ok(Report::replace_all(&self.pool, reports).await?)
    }
}
