//! Dual-write store: SQL is authoritative, the sheet receives a best-effort copy.

use std::{future::Future, pin::Pin, sync::Arc};

use async_trait::async_trait;
use db::models::{oil_entry::OilEntry, report::Report, vehicle::Vehicle};
use tokio::sync::mpsc;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{DataStore, Snapshot, StoreError};

type MirrorJob = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Mirror writes waiting to be replayed, applied one at a time in the order
/// they were queued. The worker runs on the given tracker and exits once every
/// handle is dropped and the backlog is empty.
#[derive(Clone)]
pub struct MirrorQueue {
    tx: mpsc::UnboundedSender<MirrorJob>,
}

impl MirrorQueue {
    pub fn spawn(tracker: &TaskTracker) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<MirrorJob>();
        tracker.spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
            debug!("Mirror queue closed");
        });
        Self { tx }
    }

    /// Queue `write`; its outcome is logged, never returned.
    pub fn push<Fut>(&self, operation: &'static str, target: &'static str, write: Fut)
    where
        Fut: Future<Output = Result<(), StoreError>> + Send + 'static,
    {
        let job: MirrorJob = Box::pin(async move {
            match write.await {
                Ok(()) => debug!(operation, mirror = target, "Mirror write applied"),
                Err(e) => warn!(operation, mirror = target, error = %e, "Mirror write failed"),
            }
        });
        if self.tx.send(job).is_err() {
            warn!(operation, mirror = target, "Mirror queue stopped, dropping write");
        }
    }
}

/// Reads hit the primary only. A write is queued for the mirror once the
/// primary accepted it; mirror failures are logged and never reach the caller.
#[derive(Clone)]
pub struct MirroredStore {
    primary: Arc<dyn DataStore>,
    mirror: Arc<dyn DataStore>,
    queue: MirrorQueue,
}

impl MirroredStore {
    pub fn new(primary: Arc<dyn DataStore>, mirror: Arc<dyn DataStore>, queue: MirrorQueue) -> Self {
        Self {
            primary,
            mirror,
            queue,
        }
    }

    fn replicate<F, Fut>(&self, operation: &'static str, write: F)
    where
        F: FnOnce(Arc<dyn DataStore>) -> Fut,
        Fut: Future<Output = Result<(), StoreError>> + Send + 'static,
    {
        let mirror = self.mirror.clone();
        let target = mirror.name();
        self.queue.push(operation, target, write(mirror));
    }
}

#[async_trait]
impl DataStore for MirroredStore {
    fn name(&self) -> &'static str {
        "both"
    }

    async fn list_entries(&self) -> Result<Vec<OilEntry>, StoreError> {
        self.primary.list_entries().await
    }

    async fn find_entry(&self, id: Uuid) -> Result<Option<OilEntry>, StoreError> {
        self.primary.find_entry(id).await
    }

    async fn insert_entries(&self, entries: &[OilEntry]) -> Result<(), StoreError> {
        self.primary.insert_entries(entries).await?;
        let entries = entries.to_vec();
        self.replicate("insert_entries", move |mirror| async move {
            mirror.insert_entries(&entries).await
        });
        Ok(())
    }

    async fn update_entry(&self, entry: &OilEntry) -> Result<bool, StoreError> {
        let updated = self.primary.update_entry(entry).await?;
        if updated {
            let entry = entry.clone();
            self.replicate("update_entry", move |mirror| async move {
                mirror.update_entry(&entry).await.map(|_| ())
            });
        }
        Ok(updated)
    }

    async fn delete_entry(&self, id: Uuid) -> Result<bool, StoreError> {
        let deleted = self.primary.delete_entry(id).await?;
        if deleted {
            self.replicate("delete_entry", move |mirror| async move {
                mirror.delete_entry(id).await.map(|_| ())
            });
        }
        Ok(deleted)
    }

    async fn list_vendors(&self) -> Result<Vec<String>, StoreError> {
        self.primary.list_vendors().await
    }

    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, StoreError> {
        self.primary.list_vehicles().await
    }

    async fn find_vehicle(&self, vehicle_no: &str) -> Result<Option<Vehicle>, StoreError> {
        self.primary.find_vehicle(vehicle_no).await
    }

    async fn insert_vehicle(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        self.primary.insert_vehicle(vehicle).await?;
        let vehicle = vehicle.clone();
        self.replicate("insert_vehicle", move |mirror| async move {
            mirror.insert_vehicle(&vehicle).await
        });
        Ok(())
    }

    async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<bool, StoreError> {
        let updated = self.primary.update_vehicle(vehicle).await?;
        if updated {
            let vehicle = vehicle.clone();
            self.replicate("update_vehicle", move |mirror| async move {
                mirror.update_vehicle(&vehicle).await.map(|_| ())
            });
        }
        Ok(updated)
    }

    async fn delete_vehicle(&self, vehicle_no: &str) -> Result<bool, StoreError> {
        let deleted = self.primary.delete_vehicle(vehicle_no).await?;
        if deleted {
            let vehicle_no = vehicle_no.to_string();
            self.replicate("delete_vehicle", move |mirror| async move {
                mirror.delete_vehicle(&vehicle_no).await.map(|_| ())
            });
        }
        Ok(deleted)
    }

    async fn snapshot(&self) -> Result<Snapshot, StoreError> {
        self.primary.snapshot().await
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        self.primary.list_reports().await
    }

    async fn replace_reports(&self, reports: &[Report]) -> Result<(), StoreError> {
        self.primary.replace_reports(reports).await?;
        let reports = reports.to_vec();
        self.replicate("replace_reports", move |mirror| async move {
            mirror.replace_reports(&reports).await
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use chrono::{NaiveDate, Utc};
    use db::models::oil_entry::{EntryStatus, EntryType};

    use super::*;
    use crate::services::data_source::test_support::RecordingStore;

    fn entry() -> OilEntry {
        OilEntry {
            id: Uuid::new_v4(),
            entry_type: EntryType::Sales,
            entry_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            vehicle_no: Some("KA-01".to_string()),
            oil_liters: Some(3.0),
            purchased_stock: None,
            invoice_amount: None,
            vendor: None,
            remarks: None,
            created_on: Utc::now(),
            entered_by: "Asha".to_string(),
            edited_on: None,
            edited_by: None,
            status: EntryStatus::Pending,
        }
    }

    fn mirrored(
        primary: &Arc<RecordingStore>,
        mirror: &Arc<RecordingStore>,
    ) -> (MirroredStore, TaskTracker) {
        let tracker = TaskTracker::new();
        let store = MirroredStore::new(
            primary.clone(),
            mirror.clone(),
            MirrorQueue::spawn(&tracker),
        );
        (store, tracker)
    }

    async fn drain(store: MirroredStore, tracker: TaskTracker) {
        drop(store);
        tracker.close();
        tracker.wait().await;
    }

    #[tokio::test]
    async fn writes_reach_both_sides() {
        let primary = Arc::new(RecordingStore::default());
        let mirror = Arc::new(RecordingStore::default());
        let (store, tracker) = mirrored(&primary, &mirror);

        let e = entry();
        store.insert_entries(std::slice::from_ref(&e)).await.unwrap();
        assert!(store.delete_entry(e.id).await.unwrap());
        drain(store, tracker).await;

        assert_eq!(primary.calls(), vec!["insert_entries", "delete_entry"]);
        assert_eq!(mirror.calls(), vec!["insert_entries", "delete_entry"]);
        assert!(mirror.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_mirror_writes_keep_commit_order() {
        let primary = Arc::new(RecordingStore::default());
        let mirror = Arc::new(RecordingStore::default());
        mirror.insert_delay_ms.store(50, Ordering::SeqCst);
        let (store, tracker) = mirrored(&primary, &mirror);

        let mut e = entry();
        store.insert_entries(std::slice::from_ref(&e)).await.unwrap();
        e.remarks = Some("first".to_string());
        assert!(store.update_entry(&e).await.unwrap());
        e.remarks = Some("second".to_string());
        assert!(store.update_entry(&e).await.unwrap());
        assert!(store.delete_entry(e.id).await.unwrap());
        drain(store, tracker).await;

        assert_eq!(
            mirror.calls(),
            vec!["insert_entries", "update_entry", "update_entry", "delete_entry"]
        );
        assert!(mirror.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mirror_failure_does_not_fail_the_write() {
        let primary = Arc::new(RecordingStore::default());
        let mirror = Arc::new(RecordingStore::failing());
        let (store, tracker) = mirrored(&primary, &mirror);

        store.insert_entries(&[entry()]).await.unwrap();
        drain(store, tracker).await;

        assert_eq!(primary.entries.lock().unwrap().len(), 1);
        assert_eq!(mirror.calls(), vec!["insert_entries"]);
        assert!(mirror.entries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn primary_failure_skips_the_mirror() {
        let primary = Arc::new(RecordingStore::failing());
        let mirror = Arc::new(RecordingStore::default());
        let (store, tracker) = mirrored(&primary, &mirror);

        assert!(store.insert_entries(&[entry()]).await.is_err());
        drain(store, tracker).await;

        assert!(mirror.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_rows_are_not_mirrored() {
        let primary = Arc::new(RecordingStore::default());
        let mirror = Arc::new(RecordingStore::default());
        let (store, tracker) = mirrored(&primary, &mirror);

        assert!(!store.update_entry(&entry()).await.unwrap());
        drain(store, tracker).await;

        assert!(mirror.calls().is_empty());
    }

    #[tokio::test]
    async fn reads_only_touch_the_primary() {
        let primary = Arc::new(RecordingStore::default());
        let mirror = Arc::new(RecordingStore::default());
        mirror.entries.lock().unwrap().push(entry());
        let (store, tracker) = mirrored(&primary, &mirror);

        assert!(store.list_entries().await.unwrap().is_empty());
        drain(store, tracker).await;
    }
}
