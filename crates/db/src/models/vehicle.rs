use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};
use ts_rs::TS;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, TS)]
pub struct Vehicle {
    pub vehicle_no: String,
    pub oil_in_liters: Option<f64>,
    pub contractor: String,
}

impl Vehicle {
    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT vehicle_no, oil_in_liters, contractor FROM vehicles ORDER BY vehicle_no ASC",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn find_by_vehicle_no(
        pool: &SqlitePool,
        vehicle_no: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Vehicle>(
            "SELECT vehicle_no, oil_in_liters, contractor FROM vehicles WHERE vehicle_no = $1",
        )
        .bind(vehicle_no)
        .fetch_optional(pool)
        .await
    }

    pub async fn create(pool: &SqlitePool, vehicle: &Vehicle) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO vehicles (vehicle_no, oil_in_liters, contractor) VALUES ($1, $2, $3)")
            .bind(&vehicle.vehicle_no)
            .bind(vehicle.oil_in_liters)
            .bind(&vehicle.contractor)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn update(pool: &SqlitePool, vehicle: &Vehicle) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE vehicles SET oil_in_liters = $2, contractor = $3 WHERE vehicle_no = $1",
        )
        .bind(&vehicle.vehicle_no)
        .bind(vehicle.oil_in_liters)
        .bind(&vehicle.contractor)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, vehicle_no: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM vehicles WHERE vehicle_no = $1")
            .bind(vehicle_no)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
