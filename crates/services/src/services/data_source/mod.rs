//! Storage abstraction over the SQL database and the remote spreadsheet.
//!
//! [`DataSourceRouter`] picks the active [`DataStore`] on every request from the
//! `data_source` setting, so switching sources takes effect without a restart.

use async_trait::async_trait;
use db::models::{oil_entry::OilEntry, report::Report, vehicle::Vehicle};
use thiserror::Error;
use uuid::Uuid;

use super::sheets_api::SheetsApiError;

pub mod mirror;
pub mod router;
pub mod sheet;
pub mod sql;

pub use mirror::{MirrorQueue, MirroredStore};
pub use router::{ActiveStore, DataSourceRouter, UserChange};
pub use sheet::SheetStore;
pub use sql::SqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Sheet(#[from] SheetsApiError),
    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait DataStore: Send + Sync {
    fn name(&self) -> &'static str;

    /// Newest first.
    async fn list_entries(&self) -> Result<Vec<OilEntry>, StoreError>;
    async fn find_entry(&self, id: Uuid) -> Result<Option<OilEntry>, StoreError>;
    /// Insert a batch; the SQL store applies it atomically.
    async fn insert_entries(&self, entries: &[OilEntry]) -> Result<(), StoreError>;
    async fn update_entry(&self, entry: &OilEntry) -> Result<bool, StoreError>;
    async fn delete_entry(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list_vendors(&self) -> Result<Vec<String>, StoreError>;

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError>;
    async fn find_vehicle(&self, vehicle_no: &str) -> Result<Option<Vehicle>, StoreError>;
    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError>;
    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool, StoreError>;
    async fn delete_vehicle(&self, vehicle_no: &str) -> Result<bool, StoreError>;

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError>;
    async fn replace_reports(&self, reports: &[Report]) -> Result<(), StoreError>;

    /// Everything the dashboard shows, read together.
    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let (entries, vehicles, reports, vendors) = tokio::try_join!(
            self.list_entries(),
            self.list_vehicles(),
            self.list_reports(),
            self.list_vendors(),
        )?;
        Ok(Snapshot {
            entries,
            vehicles,
            reports,
            vendors,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub entries: Vec<OilEntry>,
    pub vehicles: Vec<Vehicle>,
    pub reports: Vec<Report>,
    pub vendors: Vec<String>,
}

#[cfg(test)]
pub(crate) mod test_support {
    //! In-memory store used to observe what a wrapper forwards.

    use std::{
        sync::{
            Mutex,
            atomic::{AtomicBool, AtomicU64, Ordering},
        },
        time::Duration,
    };

    use super::*;

    #[derive(Default)]
    pub struct RecordingStore {
        pub entries: Mutex<Vec<OilEntry>>,
        pub vehicles: Mutex<Vec<Vehicle>>,
        pub reports: Mutex<Vec<Report>>,
        pub calls: Mutex<Vec<String>>,
        pub fail_writes: AtomicBool,
        pub insert_delay_ms: AtomicU64,
    }

    impl RecordingStore {
        pub fn failing() -> Self {
            let store = Self::default();
            store.fail_writes.store(true, Ordering::SeqCst);
            store
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn record(&self, call: &str) -> Result<(), StoreError> {
            self.calls.lock().unwrap().push(call.to_string());
            if self.fail_writes.load(Ordering::SeqCst) {
                Err(StoreError::Unavailable("recording store set to fail".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DataStore for RecordingStore {
        fn name(&self) -> &'static str {
            "recording"
        }

        async fn list_entries(&self) -> Result<Vec<OilEntry>, StoreError> {
            Ok(self.entries.lock().unwrap().clone())
        }

        async fn find_entry(&self, id: Uuid) -> Result<Option<OilEntry>, StoreError> {
            Ok(self.entries.lock().unwrap().iter().find(|e| e.id == id).cloned())
        }

        async fn insert_entries(&self, entries: &[OilEntry]) -> Result<(), StoreError> {
            let delay = self.insert_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            self.record("insert_entries")?;
            self.entries.lock().unwrap().extend_from_slice(entries);
            Ok(())
        }

        async fn update_entry(&self, entry: &OilEntry) -> Result<bool, StoreError> {
            self.record("update_entry")?;
            let mut entries = self.entries.lock().unwrap();
            match entries.iter_mut().find(|e| e.id == entry.id) {
                Some(slot) => {
                    *slot = entry.clone();
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn delete_entry(&self, id: Uuid) -> Result<bool, StoreError> {
            self.record("delete_entry")?;
            let mut entries = self.entries.lock().unwrap();
            let before = entries.len();
            entries.retain(|e| e.id != id);
            Ok(entries.len() < before)
        }

        async fn list_vendors(&self) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }

        async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
            Ok(self.vehicles.lock().unwrap().clone())
        }

        async fn find_vehicle(&self, vehicle_no: &str) -> Result<Option<Vehicle>, StoreError> {
            Ok(self
                .vehicles
                .lock()
                .unwrap()
                .iter()
                .find(|v| v.vehicle_no == vehicle_no)
                .cloned())
        }

        async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
            self.record("insert_vehicle")?;
            self.vehicles.lock().unwrap().push(vehicle.clone());
            Ok(())
        }

        async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool, StoreError> {
            self.record("update_vehicle")?;
            Ok(true)
        }

        async fn delete_vehicle(&self, vehicle_no: &str) -> Result<bool, StoreError> {
            self.record("delete_vehicle")?;
            let mut vehicles = self.vehicles.lock().unwrap();
            let before = vehicles.len();
            vehicles.retain(|v| v.vehicle_no != vehicle_no);
            Ok(vehicles.len() < before)
        }

        async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
            Ok(self.reports.lock().unwrap().clone())
        }

        async fn replace_reports(&self, reports: &[Report]) -> Result<(), StoreError> {
            self.record("replace_reports")?;
            *self.reports.lock().unwrap() = reports.to_vec();
            Ok(())
        }
    }
}
