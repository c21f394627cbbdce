use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;
use uuid::Uuid;

/// Per-vehicle oil change summary.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct Report {
    pub id: Uuid,
    pub sr_no: i64,
    pub vehicle_no: String,
    pub last_date_of_oil_change: Option<NaiveDate>,
    pub trip_after_oil_change: i64,
}

impl Report {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Report>(
            r#"SELECT id, sr_no, vehicle_no, last_date_of_oil_change, trip_after_oil_change
               FROM reports
               ORDER BY sr_no ASC"#,
        )
        .fetch_all(pool)
        .await
    }

    /// Swap the whole report table for `reports` in one transaction.
    pub async fn replace_all(pool: &SqlitePool, reports: &[Report]) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM reports").execute(&mut *tx).await?;
        for report in reports {
            sqlx::query(
                r#"INSERT INTO reports (id, sr_no, vehicle_no, last_date_of_oil_change, trip_after_oil_change)
                   VALUES ($1, $2, $3, $4, $5)"#,
            )
            .bind(report.id)
            .bind(report.sr_no)
            .bind(&report.vehicle_no)
            .bind(report.last_date_of_oil_change)
            .bind(report.trip_after_oil_change)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DBService;

    fn report(sr_no: i64, vehicle_no: &str) -> Report {
        Report {
            id: Uuid::new_v4(),
            sr_no,
            vehicle_no: vehicle_no.to_string(),
            last_date_of_oil_change: NaiveDate::from_ymd_opt(2025, 4, 2),
            trip_after_oil_change: 3,
        }
    }

    #[tokio::test]
    async fn replace_all_swaps_the_table() {
        let db = DBService::new_in_memory().await.unwrap();
        Report::replace_all(&db.pool, &[report(1, "A"), report(2, "B")])
            .await
            .unwrap();
        let next = vec![report(1, "C")];
        Report::replace_all(&db.pool, &next).await.unwrap();

        assert_eq!(Report::find_all(&db.pool).await.unwrap(), next);
    }

    #[tokio::test]
    async fn failed_replace_keeps_previous_rows() {
        let db = DBService::new_in_memory().await.unwrap();
        let original = vec![report(1, "A")];
        Report::replace_all(&db.pool, &original).await.unwrap();

        let result = Report::replace_all(&db.pool, &[report(1, "B"), report(2, "B")]).await;
        assert!(result.is_err());
        assert_eq!(Report::find_all(&db.pool).await.unwrap(), original);
    }
}
