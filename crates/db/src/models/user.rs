use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool, Type};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

/// Role tiers, ordered from least to most privileged.
#[derive(
    Debug,
    Clone,
    Copy,
    Type,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    TS,
    EnumString,
    Display,
    Default,
)]
#[sqlx(type_name = "role", rename_all = "PascalCase")]
pub enum Role {
    #[default]
    User,
    Admin,
    SuperAdmin,
}

#[derive(
    Debug, Clone, Copy, Type, Serialize, Deserialize, PartialEq, Eq, TS, EnumString, Display, Default,
)]
#[sqlx(type_name = "user_status", rename_all = "PascalCase")]
pub enum UserStatus {
    #[default]
    Active,
    Disabled,
}

/// Stored account, including the bcrypt hash. Never serialised to clients.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub timeout_minutes: i64,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
pub struct UserInfo {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub role: Role,
    pub timeout_minutes: i64,
    pub status: UserStatus,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            role: user.role,
            timeout_minutes: user.timeout_minutes,
            status: user.status,
        }
    }
}

impl From<User> for UserInfo {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub full_name: String,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
    pub timeout_minutes: i64,
    pub status: UserStatus,
}

const SELECT_COLUMNS: &str = r#"SELECT id, full_name, username, password_hash, role,
        timeout_minutes, status, created_at, updated_at
    FROM users"#;

impl User {
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub async fn find_all(pool: &SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{SELECT_COLUMNS} ORDER BY full_name ASC"))
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_username(
        pool: &SqlitePool,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("{SELECT_COLUMNS} WHERE username = $1"))
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    pub async fn count(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await
    }

    pub async fn create(pool: &SqlitePool, data: &CreateUser) -> Result<Self, sqlx::Error> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"INSERT INTO users (id, full_name, username, password_hash, role,
                timeout_minutes, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)"#,
        )
        .bind(id)
        .bind(&data.full_name)
        .bind(&data.username)
        .bind(&data.password_hash)
        .bind(data.role)
        .bind(data.timeout_minutes)
        .bind(data.status)
        .bind(now)
        .execute(pool)
        .await?;

        Ok(User {
            id,
            full_name: data.full_name.clone(),
            username: data.username.clone(),
            password_hash: data.password_hash.clone(),
            role: data.role,
            timeout_minutes: data.timeout_minutes,
            status: data.status,
            created_at: now,
            updated_at: now,
        })
    }

    /// Persist every mutable column of `user` and bump `updated_at`.
    pub async fn update(pool: &SqlitePool, user: &User) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"UPDATE users SET
                full_name = $2, username = $3, password_hash = $4, role = $5,
                timeout_minutes = $6, status = $7, updated_at = $8
            WHERE id = $1"#,
        )
        .bind(user.id)
        .bind(&user.full_name)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.timeout_minutes)
        .bind(user.status)
        .bind(Utc::now())
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
