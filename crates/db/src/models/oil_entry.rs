use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqliteConnection, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display)]
#[sqlx(type_name = "entry_type", rename_all = "PascalCase")]
#[strum(ascii_case_insensitive)]
pub enum EntryType {
    Sales,
    Purchase,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "entry_status", rename_all = "PascalCase")]
#[strum(ascii_case_insensitive)]
pub enum EntryStatus {
    #[default]
    Pending,
    Updated,
    Rejected,
}

/// A single oil sale or purchase.
///
/// Sales carry `vehicle_no` and `oil_liters`; purchases carry
/// `purchased_stock`, `invoice_amount` and `vendor`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct OilEntry {
    pub id: Uuid,
    pub entry_type: EntryType,
    pub entry_date: NaiveDate,
    pub vehicle_no: Option<String>,
    pub oil_liters: Option<f64>,
    pub purchased_stock: Option<f64>,
    pub invoice_amount: Option<f64>,
    pub vendor: Option<String>,
    pub remarks: Option<String>,
    pub created_on: DateTime<Utc>,
    pub entered_by: String,
    pub edited_on: Option<DateTime<Utc>>,
    pub edited_by: Option<String>,
    pub status: EntryStatus,
}

const SELECT_COLUMNS: &str = r#"SELECT id, entry_type, entry_date, vehicle_no, oil_liters,
        purchased_stock, invoice_amount, vendor, remarks, created_on, entered_by,
        edited_on, edited_by, status
    FROM oil_entries"#;

impl OilEntry {
    /// Newest first.
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, OilEntry>(&format!(
            "{SELECT_COLUMNS} ORDER BY entry_date DESC, created_on DESC"
        ))
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, OilEntry>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, entry: &OilEntry) -> Result<(), sqlx::Error> {
        let mut conn = pool.acquire().await?;
        Self::insert_row(&mut *conn, entry).await
    }

    /// Insert every entry or none of them.
    pub async fn create_many(pool: &SqlitePool, entries: &[OilEntry]) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        for entry in entries {
            Self::insert_row(&mut *tx, entry).await?;
        }
        tx.commit().await
    }

    async fn insert_row(conn: &mut SqliteConnection, entry: &OilEntry) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"INSERT INTO oil_entries (
                id, entry_type, entry_date, vehicle_no, oil_liters, purchased_stock,
                invoice_amount, vendor, remarks, created_on, entered_by, edited_on,
                edited_by, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"#,
        )
        .bind(entry.id)
        .bind(entry.entry_type)
        .bind(entry.entry_date)
        .bind(&entry.vehicle_no)
        .bind(entry.oil_liters)
        .bind(entry.purchased_stock)
        .bind(entry.invoice_amount)
        .bind(&entry.vendor)
        .bind(&entry.remarks)
        .bind(entry.created_on)
        .bind(&entry.entered_by)
        .bind(entry.edited_on)
        .bind(&entry.edited_by)
        .bind(entry.status)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Overwrite the stored row with `entry`. Returns false when no row matched.
    pub async fn update(pool: &SqlitePool, entry: &OilEntry) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE oil_entries SET
                entry_type = $2, entry_date = $3, vehicle_no = $4, oil_liters = $5,
                purchased_stock = $6, invoice_amount = $7, vendor = $8, remarks = $9,
                edited_on = $10, edited_by = $11, status = $12
            WHERE id = $1"#,
        )
        .bind(entry.id)
        .bind(entry.entry_type)
        .bind(entry.entry_date)
        .bind(&entry.vehicle_no)
        .bind(entry.oil_liters)
        .bind(entry.purchased_stock)
        .bind(entry.invoice_amount)
        .bind(&entry.vendor)
        .bind(&entry.remarks)
        .bind(entry.edited_on)
        .bind(&entry.edited_by)
        .bind(entry.status)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM oil_entries WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Distinct, non-blank vendor names in alphabetical order.
    pub async fn find_vendors(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar::<_, String>(
            r#"SELECT DISTINCT vendor FROM oil_entries
               WHERE vendor IS NOT NULL AND TRIM(vendor) <> ''
               ORDER BY vendor"#,
        )
        .fetch_all(pool)
        .await
    }
}
