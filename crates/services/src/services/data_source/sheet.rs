use async_trait::async_trait;
use db::models::{oil_entry::OilEntry, report::Report, vehicle::Vehicle};
use tracing::debug;
use uuid::Uuid;

use super::{DataStore, Snapshot, StoreError};
use crate::services::sheets_api::SheetsClient;

/// The remote spreadsheet. Every read pulls the full dashboard payload.
///
/// Updates and deletes look the row up first so the sheet's own `SheetID` is
/// sent back, and report `false` when the row is not on the sheet.
#[derive(Clone)]
pub struct SheetStore {
    client: SheetsClient,
}

impl SheetStore {
    pub fn new(client: SheetsClient) -> Self {
        Self { client }
    }

    async fn entry_key(&self, id: Uuid) -> Result<Option<String>, StoreError> {
        let key = self.client.fetch_dashboard().await?.entry_keys.remove(&id);
        if key.is_none() {
            debug!(entry_id = %id, "Oil entry not on sheet");
        }
        Ok(key)
    }

    async fn has_vehicle(&self, vehicle_no: &str) -> Result<bool, StoreError> {
        Ok(self.find_vehicle(vehicle_no).await?.is_some())
    }
}

fn sort_entries(entries: &mut [OilEntry]) {
    entries.sort_by(|a, b| {
        b.entry_date
            .cmp(&a.entry_date)
            .then(b.created_on.cmp(&a.created_on))
    });
}

#[async_trait]
impl DataStore for SheetStore {
    fn name(&self) -> &'static str {
        "sheet"
    }

    async fn list_entries(&self) -> Result<Vec<OilEntry>, StoreError> {
        let mut entries = self.client.fetch_dashboard().await?.oil_entries;
        sort_entries(&mut entries);
        Ok(entries)
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<OilEntry>, StoreError> {
        Ok(self
            .client
            .fetch_dashboard()
            .await?
            .oil_entries
            .into_iter()
            .find(|e| e.id == id))
    }

    async fn insert_entries(&self, entries: &[OilEntry]) -> Result<(), StoreError> {
        if entries.is_empty() {
            return Ok(());
        }
        Ok(self.client.add_oil_entries(entries).await?)
    }

    async fn update_entry(&self, entry: &OilEntry) -> Result<bool, StoreError> {
        let Some(key) = self.entry_key(entry.id).await? else {
            return Ok(false);
        };
        self.client.update_oil_entry(&key, entry).await?;
        Ok(true)
    }

    async fn delete_entry(&self, id: Uuid) -> Result<bool, StoreError> {
        let Some(key) = self.entry_key(id).await? else {
            return Ok(false);
        };
        self.client.delete_oil_entry(&key).await?;
        Ok(true)
    }

    async fn list_vendors(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.client.fetch_dashboard().await?.vendors)
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        let mut vehicles = self.client.fetch_dashboard().await?.vehicles;
        vehicles.sort_by(|a, b| a.vehicle_no.cmp(&b.vehicle_no));
        Ok(vehicles)
    }

    async fn find_vehicle(&self, vehicle_no: &str) -> Result<Option<Vehicle>, StoreError> {
        Ok(self
            .client
            .fetch_dashboard()
            .await?
            .vehicles
            .into_iter()
            .find(|v| v.vehicle_no == vehicle_no))
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        Ok(self.client.add_vehicle(vehicle).await?)
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool, StoreError> {
        if !self.has_vehicle(&vehicle.vehicle_no).await? {
            return Ok(false);
        }
        self.client.update_vehicle(vehicle).await?;
        Ok(true)
    }

    async fn delete_vehicle(&self, vehicle_no: &str) -> Result<bool, StoreError> {
        if !self.has_vehicle(vehicle_no).await? {
            return Ok(false);
        }
        self.client.delete_vehicle(vehicle_no).await?;
        Ok(true)
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        let mut reports = self.client.fetch_dashboard().await?.reports;
        reports.sort_by_key(|r| r.sr_no);
        Ok(reports)
    }

    async fn replace_reports(&self, reports: &[Report]) -> Result<(), StoreError> {
        Ok(self.client.replace_reports(reports).await?)
    }

    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        let dashboard = self.client.fetch_dashboard().await?;
        let mut entries = dashboard.oil_entries;
        sort_entries(&mut entries);
        let mut vehicles = dashboard.vehicles;
        vehicles.sort_by(|a, b| a.vehicle_no.cmp(&b.vehicle_no));
        let mut reports = dashboard.reports;
        reports.sort_by_key(|r| r.sr_no);
        Ok(Snapshot {
            entries,
            vehicles,
            reports,
            vendors: dashboard.vendors,
        })
    }
}
