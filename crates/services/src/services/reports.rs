//! Per-vehicle oil change reports.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use db::models::{
    oil_entry::{EntryType, OilEntry},
    report::Report,
    user::{Role, UserInfo},
};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use super::{
    access::{AccessDenied, require_role},
    data_source::{DataStore, StoreError},
};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error("{0}")]
    Validation(String),
    #[error("report not found")]
    NotFound,
}

pub struct ReportService;

impl ReportService {
    pub async fn list(store: &dyn DataStore) -> Result<Vec<Report>, ReportError> {
        Ok(store.list_reports().await?)
    }

    /// Rebuild the report table from the latest sale per vehicle.
    pub async fn generate(
        store: &dyn DataStore,
        actor: &UserInfo,
    ) -> Result<Vec<Report>, ReportError> {
        require_role(actor, Role::Admin)?;

        let existing = store.list_reports().await?;
        let entries = store.list_entries().await?;
        let reports = build_reports(&existing, &entries);

        store.replace_reports(&reports).await?;
        info!(count = reports.len(), generated_by = %actor.full_name, "Reports regenerated");
        Ok(reports)
    }

    pub async fn update_trips(
        store: &dyn DataStore,
        actor: &UserInfo,
        id: Uuid,
        trips: i64,
    ) -> Result<Report, ReportError> {
        require_role(actor, Role::Admin)?;
        if trips < 0 {
            return Err(ReportError::Validation(
                "trip count cannot be negative".to_string(),
            ));
        }

        let mut reports = store.list_reports().await?;
        let report = reports
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ReportError::NotFound)?;
        report.trip_after_oil_change = trips;
        let updated = report.clone();

        store.replace_reports(&reports).await?;
        Ok(updated)
    }
}

/// Merge the latest sale date per vehicle into the existing reports.
///
/// A report whose date is unchanged keeps its trip count; a newer oil change
/// resets it to zero. Vehicles with no sales keep their old report. Serial
/// numbers follow vehicle number order.
pub fn build_reports(existing: &[Report], entries: &[OilEntry]) -> Vec<Report> {
    let mut latest: BTreeMap<&str, NaiveDate> = BTreeMap::new();
    for entry in entries.iter().filter(|e| e.entry_type == EntryType::Sales) {
        let Some(vehicle_no) = entry.vehicle_no.as_deref() else {
            continue;
        };
        latest
            .entry(vehicle_no)
            .and_modify(|date| *date = (*date).max(entry.entry_date))
            .or_insert(entry.entry_date);
    }

    let mut by_vehicle: BTreeMap<&str, Report> = existing
        .iter()
        .map(|r| (r.vehicle_no.as_str(), r.clone()))
        .collect();

    for (vehicle_no, date) in latest {
        let report = match by_vehicle.remove(vehicle_no) {
            Some(previous) if previous.last_date_of_oil_change == Some(date) => previous,
            Some(previous) => Report {
                last_date_of_oil_change: Some(date),
                trip_after_oil_change: 0,
                ..previous
            },
            None => Report {
                id: Uuid::new_v4(),
                sr_no: 0,
                vehicle_no: vehicle_no.to_string(),
                last_date_of_oil_change: Some(date),
                trip_after_oil_change: 0,
            },
        };
        by_vehicle.insert(vehicle_no, report);
    }

    by_vehicle
        .into_values()
        .enumerate()
        .map(|(index, report)| Report {
            sr_no: index as i64 + 1,
            ..report
        })
        .collect()
}

/// Parse the date formats found in reports and sheet rows.
///
/// Two-digit years above 50 are read as 19xx, the rest as 20xx.
pub fn parse_report_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.date_naive());
    }
    let parts: Vec<&str> = raw.split(['-', '/', '.']).collect();
    let [first, month, last] = parts.as_slice() else {
        return None;
    };
    let month: u32 = month.parse().ok()?;
    let (year, day) = if first.len() == 4 {
        (first.parse::<i32>().ok()?, last.parse::<u32>().ok()?)
    } else {
        let day: u32 = first.parse().ok()?;
        let year: i32 = match last.len() {
            2 => {
                let yy: i32 = last.parse().ok()?;
                if yy > 50 { 1900 + yy } else { 2000 + yy }
            }
            4 => last.parse().ok()?,
            _ => return None,
        };
        (year, day)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use db::{DBService, models::oil_entry::EntryStatus};

    use super::*;
    use crate::services::{access::test_support::actor, data_source::SqlStore};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sale(vehicle: &str, date: NaiveDate) -> OilEntry {
        OilEntry {
            id: Uuid::new_v4(),
            entry_type: EntryType::Sales,
            entry_date: date,
            vehicle_no: Some(vehicle.to_string()),
            oil_liters: Some(5.0),
            purchased_stock: None,
            invoice_amount: None,
            vendor: None,
            remarks: None,
            created_on: Utc::now(),
            entered_by: "Clerk".to_string(),
            edited_on: None,
            edited_by: None,
            status: EntryStatus::Pending,
        }
    }

    fn report(sr_no: i64, vehicle: &str, date: NaiveDate, trips: i64) -> Report {
        Report {
            id: Uuid::new_v4(),
            sr_no,
            vehicle_no: vehicle.to_string(),
            last_date_of_oil_change: Some(date),
            trip_after_oil_change: trips,
        }
    }

    #[test]
    fn parses_report_date_formats() {
        assert_eq!(parse_report_date("05-03-25"), Some(ymd(2025, 3, 5)));
        assert_eq!(parse_report_date("05-03-75"), Some(ymd(1975, 3, 5)));
        assert_eq!(parse_report_date("31-12-50"), Some(ymd(2050, 12, 31)));
        assert_eq!(parse_report_date("05/03/2024"), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_report_date("2024-03-05"), Some(ymd(2024, 3, 5)));
        assert_eq!(
            parse_report_date("2024-03-05T18:30:00.000Z"),
            Some(ymd(2024, 3, 5))
        );
        assert_eq!(parse_report_date("31-02-24"), None);
        assert_eq!(parse_report_date(""), None);
        assert_eq!(parse_report_date("yesterday"), None);
    }

    #[test]
    fn latest_sale_wins_and_resets_trips() {
        let existing = vec![report(1, "KA-02", ymd(2025, 1, 1), 14)];
        let entries = vec![
            sale("KA-02", ymd(2025, 1, 1)),
            sale("KA-02", ymd(2025, 2, 10)),
            sale("KA-01", ymd(2025, 1, 20)),
        ];

        let reports = build_reports(&existing, &entries);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].vehicle_no, "KA-01");
        assert_eq!(reports[0].sr_no, 1);
        assert_eq!(reports[0].trip_after_oil_change, 0);
        assert_eq!(reports[1].vehicle_no, "KA-02");
        assert_eq!(reports[1].sr_no, 2);
        assert_eq!(reports[1].id, existing[0].id);
        assert_eq!(reports[1].last_date_of_oil_change, Some(ymd(2025, 2, 10)));
        assert_eq!(reports[1].trip_after_oil_change, 0);
    }

    #[test]
    fn unchanged_dates_keep_trip_counts() {
        let existing = vec![
            report(1, "KA-01", ymd(2025, 3, 3), 9),
            report(2, "KA-09", ymd(2024, 12, 1), 40),
        ];
        let mut purchase = sale("KA-01", ymd(2025, 4, 4));
        purchase.entry_type = EntryType::Purchase;
        let entries = vec![sale("KA-01", ymd(2025, 3, 3)), purchase];

        let reports = build_reports(&existing, &entries);

        assert_eq!(reports, existing);
    }

    #[tokio::test]
    async fn generation_and_trip_edits_need_admin() {
        let db = DBService::new_in_memory().await.unwrap();
        let store = SqlStore::new(db.pool.clone());
        let clerk = actor("Clerk", Role::User);
        let admin = actor("Admin", Role::Admin);
        store
            .insert_entries(&[sale("KA-01", ymd(2025, 5, 5))])
            .await
            .unwrap();

        assert!(matches!(
            ReportService::generate(&store, &clerk).await,
            Err(ReportError::Forbidden(_))
        ));
        let reports = ReportService::generate(&store, &admin).await.unwrap();
        assert_eq!(reports.len(), 1);

        assert!(matches!(
            ReportService::update_trips(&store, &clerk, reports[0].id, 3).await,
            Err(ReportError::Forbidden(_))
        ));
        assert!(matches!(
            ReportService::update_trips(&store, &admin, reports[0].id, -1).await,
            Err(ReportError::Validation(_))
        ));
        let updated = ReportService::update_trips(&store, &admin, reports[0].id, 3)
            .await
            .unwrap();
        assert_eq!(updated.trip_after_oil_change, 3);

        let regenerated = ReportService::generate(&store, &admin).await.unwrap();
        assert_eq!(regenerated[0].trip_after_oil_change, 3);
        assert_eq!(ReportService::list(&store).await.unwrap(), regenerated);
    }
}
