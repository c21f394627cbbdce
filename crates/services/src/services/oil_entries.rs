//! Oil sale and purchase entries.

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};
use db::models::{
    oil_entry::{EntryStatus, EntryType, OilEntry},
    user::UserInfo,
    vehicle::Vehicle,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};
use ts_rs::TS;
use uuid::Uuid;

use super::{
    access::{AccessDenied, ensure_can_modify_entry},
    data_source::{DataStore, StoreError},
};

#[derive(Debug, Error)]
pub enum OilEntryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("{0}")]
    Validation(String),
    #[error("oil entry not found")]
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateOilEntry {
    pub entry_type: EntryType,
    pub entry_date: NaiveDate,
    pub vehicle_no: Option<String>,
    pub oil_liters: Option<f64>,
    pub purchased_stock: Option<f64>,
    pub invoice_amount: Option<f64>,
    pub vendor: Option<String>,
    pub remarks: Option<String>,
    pub status: Option<EntryStatus>,
}

/// Partial update; absent fields keep their stored value, blank strings clear them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateOilEntry {
    pub entry_type: Option<EntryType>,
    pub entry_date: Option<NaiveDate>,
    pub vehicle_no: Option<String>,
    pub oil_liters: Option<f64>,
    pub purchased_stock: Option<f64>,
    pub invoice_amount: Option<f64>,
    pub vendor: Option<String>,
    pub remarks: Option<String>,
    pub status: Option<EntryStatus>,
}

pub struct OilEntryService;

impl OilEntryService {
    pub async fn list(store: &dyn DataStore) -> Result<Vec<OilEntry>, OilEntryError> {
        Ok(store.list_entries().await?)
    }

    pub async fn get(store: &dyn DataStore, id: Uuid) -> Result<OilEntry, OilEntryError> {
        store.find_entry(id).await?.ok_or(OilEntryError::NotFound)
    }

    pub async fn create(
        store: &dyn DataStore,
        actor: &UserInfo,
        input: CreateOilEntry,
    ) -> Result<OilEntry, OilEntryError> {
        let entry = build_entry(actor, input).map_err(OilEntryError::Validation)?;
        store.insert_entries(std::slice::from_ref(&entry)).await?;
        info!(entry_id = %entry.id, entry_type = %entry.entry_type, entered_by = %entry.entered_by, "Oil entry created");

        register_unknown_vehicles(store, std::slice::from_ref(&entry)).await;
        Ok(entry)
    }

    /// Validate every entry first, then insert the batch in one go.
    pub async fn create_bulk(
        store: &dyn DataStore,
        actor: &UserInfo,
        inputs: Vec<CreateOilEntry>,
    ) -> Result<Vec<OilEntry>, OilEntryError> {
        if inputs.is_empty() {
            return Err(OilEntryError::Validation("no entries to submit".to_string()));
        }

        let entries = inputs
            .into_iter()
            .enumerate()
            .map(|(index, input)| {
                build_entry(actor, input)
                    .map_err(|msg| OilEntryError::Validation(format!("entry {}: {msg}", index + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        store.insert_entries(&entries).await?;
        info!(count = entries.len(), entered_by = %actor.full_name, "Oil entries submitted");

        register_unknown_vehicles(store, &entries).await;
        Ok(entries)
    }

    pub async fn update(
        store: &dyn DataStore,
        actor: &UserInfo,
        id: Uuid,
        patch: UpdateOilEntry,
    ) -> Result<OilEntry, OilEntryError> {
        let mut entry = store.find_entry(id).await?.ok_or(OilEntryError::NotFound)?;
        ensure_can_modify_entry(actor, &entry)?;

        apply_patch(&mut entry, patch);
        normalize(&mut entry);
        validate(&entry).map_err(OilEntryError::Validation)?;
        entry.edited_on = Some(Utc::now());
        entry.edited_by = Some(actor.full_name.clone());

        if !store.update_entry(&entry).await? {
            return Err(OilEntryError::NotFound);
        }
        info!(entry_id = %id, edited_by = %actor.full_name, "Oil entry updated");
        Ok(entry)
    }

    pub async fn delete(
        store: &dyn DataStore,
        actor: &UserInfo,
        id: Uuid,
    ) -> Result<(), OilEntryError> {
        let entry = store.find_entry(id).await?.ok_or(OilEntryError::NotFound)?;
        ensure_can_modify_entry(actor, &entry)?;

        if !store.delete_entry(id).await? {
            return Err(OilEntryError::NotFound);
        }
        info!(entry_id = %id, deleted_by = %actor.full_name, "Oil entry deleted");
        Ok(())
    }
}

fn build_entry(actor: &UserInfo, input: CreateOilEntry) -> Result<OilEntry, String> {
    let mut entry = OilEntry {
        id: Uuid::new_v4(),
        entry_type: input.entry_type,
        entry_date: input.entry_date,
        vehicle_no: input.vehicle_no,
        oil_liters: input.oil_liters,
        purchased_stock: input.purchased_stock,
        invoice_amount: input.invoice_amount,
        vendor: input.vendor,
        remarks: input.remarks,
        created_on: Utc::now(),
        entered_by: actor.full_name.clone(),
        edited_on: None,
        edited_by: None,
        status: input.status.unwrap_or_default(),
    };
    normalize(&mut entry);
    validate(&entry)?;
    Ok(entry)
}

fn apply_patch(entry: &mut OilEntry, patch: UpdateOilEntry) {
    if let Some(entry_type) = patch.entry_type {
        entry.entry_type = entry_type;
    }
    if let Some(date) = patch.entry_date {
        entry.entry_date = date;
    }
    if let Some(status) = patch.status {
        entry.status = status;
    }
    if patch.vehicle_no.is_some() {
        entry.vehicle_no = patch.vehicle_no;
    }
    if patch.oil_liters.is_some() {
        entry.oil_liters = patch.oil_liters;
    }
    if patch.purchased_stock.is_some() {
        entry.purchased_stock = patch.purchased_stock;
    }
    if patch.invoice_amount.is_some() {
        entry.invoice_amount = patch.invoice_amount;
    }
    if patch.vendor.is_some() {
        entry.vendor = patch.vendor;
    }
    if patch.remarks.is_some() {
        entry.remarks = patch.remarks;
    }
}

/// Trim text, turn blanks into `None` and drop fields that belong to the other entry type.
fn normalize(entry: &mut OilEntry) {
    for field in [&mut entry.vehicle_no, &mut entry.vendor, &mut entry.remarks] {
        *field = field
            .take()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
    }

    match entry.entry_type {
        EntryType::Sales => {
            entry.purchased_stock = None;
            entry.invoice_amount = None;
            entry.vendor = None;
        }
        EntryType::Purchase => {
            entry.vehicle_no = None;
            entry.oil_liters = None;
        }
    }
}

fn validate(entry: &OilEntry) -> Result<(), String> {
    match entry.entry_type {
        EntryType::Sales => {
            if entry.vehicle_no.is_none() {
                return Err("vehicle number is required for sales entries".to_string());
            }
            match entry.oil_liters {
                Some(liters) if liters.is_finite() && liters > 0.0 => Ok(()),
                Some(_) => Err("oil liters must be greater than zero".to_string()),
                None => Err("oil liters are required for sales entries".to_string()),
            }
        }
        EntryType::Purchase => {
            match entry.purchased_stock {
                Some(stock) if stock.is_finite() && stock > 0.0 => {}
                Some(_) => return Err("purchased stock must be greater than zero".to_string()),
                None => return Err("purchased stock is required for purchase entries".to_string()),
            }
            match entry.invoice_amount {
                Some(amount) if amount.is_finite() && amount >= 0.0 => {}
                Some(_) => return Err("invoice amount cannot be negative".to_string()),
                None => return Err("invoice amount is required for purchase entries".to_string()),
            }
            if entry.vendor.is_none() {
                return Err("vendor is required for purchase entries".to_string());
            }
            Ok(())
        }
    }
}

/// Sales for a vehicle the store has never seen register it, seeded with the sale's liters.
async fn register_unknown_vehicles(store: &dyn DataStore, entries: &[OilEntry]) {
    let mut candidates: BTreeMap<&str, Option<f64>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.entry_type == EntryType::Sales) {
        if let Some(vehicle_no) = entry.vehicle_no.as_deref() {
            candidates.entry(vehicle_no).or_insert(entry.oil_liters);
        }
    }

    for (vehicle_no, oil_in_liters) in candidates {
        match store.find_vehicle(vehicle_no).await {
            Ok(Some(_)) => continue,
            Ok(None) => {}
            Err(e) => {
                warn!(vehicle_no, error = %e, "Could not look up vehicle for new sale");
                continue;
            }
        }

        let vehicle = Vehicle {
            vehicle_no: vehicle_no.to_string(),
            oil_in_liters,
            contractor: String::new(),
        };
        match store.insert_vehicle(&vehicle).await {
            Ok(()) => info!(vehicle_no, "Registered vehicle from sale"),
            Err(e) => warn!(vehicle_no, error = %e, "Could not register vehicle from sale"),
        }
    }
}
