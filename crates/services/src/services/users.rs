//! User account management. Accounts always live in SQL since they back login.

use db::models::{
    session::Session,
    user::{CreateUser, Role, User, UserInfo, UserStatus},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;
use ts_rs::TS;
use uuid::Uuid;

use super::{
    access::{AccessDenied, require_role},
    auth::{AuthError, hash_password},
    config::BootstrapAdmin,
    data_source::{DataSourceRouter, UserChange},
};

const MIN_PASSWORD_LEN: usize = 8;
const DEFAULT_TIMEOUT_MINUTES: i64 = 60;

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error("{0}")]
    Validation(String),
    #[error("username {0} is already taken")]
    Conflict(String),
    #[error("user not found")]
    NotFound,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct CreateUserRequest {
    pub full_name: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub timeout_minutes: Option<i64>,
    pub status: Option<UserStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub username: Option<String>,
    /// Left unchanged when absent or blank.
    pub password: Option<String>,
    pub role: Option<Role>,
    pub timeout_minutes: Option<i64>,
    pub status: Option<UserStatus>,
}

pub struct UserService;

impl UserService {
    pub async fn list(pool: &SqlitePool, actor: &UserInfo) -> Result<Vec<UserInfo>, UserError> {
        require_role(actor, Role::SuperAdmin)?;
        Ok(User::find_all(pool)
            .await?
            .into_iter()
            .map(UserInfo::from)
            .collect())
    }

    pub async fn create(
        pool: &SqlitePool,
        router: &DataSourceRouter,
        actor: &UserInfo,
        request: CreateUserRequest,
        bcrypt_cost: u32,
    ) -> Result<UserInfo, UserError> {
        require_role(actor, Role::SuperAdmin)?;

        let full_name = required("full name", &request.full_name)?;
        let username = required("username", &request.username)?;
        validate_password(&request.password)?;
        let timeout_minutes = validate_timeout(request.timeout_minutes.unwrap_or(DEFAULT_TIMEOUT_MINUTES))?;
        if User::find_by_username(pool, &username).await?.is_some() {
            return Err(UserError::Conflict(username));
        }

        let data = CreateUser {
            full_name,
            username: username.clone(),
            password_hash: hash_password(&request.password, bcrypt_cost).await?,
            role: request.role,
            timeout_minutes,
            status: request.status.unwrap_or_default(),
        };
        let user = User::create(pool, &data)
            .await
            .map_err(|e| conflict_or(e, &username))?;
        let info = UserInfo::from(user);
        info!(user_id = %info.id, role = %info.role, created_by = %actor.full_name, "User created");

        router.mirror_user(UserChange::Added(info.clone())).await;
        Ok(info)
    }

    pub async fn update(
        pool: &SqlitePool,
        router: &DataSourceRouter,
        actor: &UserInfo,
        id: Uuid,
        request: UpdateUserRequest,
        bcrypt_cost: u32,
    ) -> Result<UserInfo, UserError> {
        require_role(actor, Role::SuperAdmin)?;
        let mut user = User::find_by_id(pool, id).await?.ok_or(UserError::NotFound)?;

        if id == actor.id {
            let demoted = request.role.is_some_and(|role| role != Role::SuperAdmin);
            let disabled = request.status == Some(UserStatus::Disabled);
            if demoted || disabled {
                return Err(UserError::Validation(
                    "you cannot demote or disable your own account".to_string(),
                ));
            }
        }

        if let Some(full_name) = request.full_name {
            user.full_name = required("full name", &full_name)?;
        }
        if let Some(username) = request.username {
            let username = required("username", &username)?;
            if username != user.username {
                if User::find_by_username(pool, &username).await?.is_some() {
                    return Err(UserError::Conflict(username));
                }
                user.username = username;
            }
        }
        if let Some(password) = request.password.filter(|p| !p.is_empty()) {
            validate_password(&password)?;
            user.password_hash = hash_password(&password, bcrypt_cost).await?;
        }
        if let Some(role) = request.role {
            user.role = role;
        }
        if let Some(timeout) = request.timeout_minutes {
            user.timeout_minutes = validate_timeout(timeout)?;
        }
        let newly_disabled = request.status == Some(UserStatus::Disabled) && user.is_active();
        if let Some(status) = request.status {
            user.status = status;
        }

        if !User::update(pool, &user)
            .await
            .map_err(|e| conflict_or(e, &user.username))?
        {
            return Err(UserError::NotFound);
        }
        if newly_disabled {
            let revoked = Session::delete_by_user(pool, user.id).await?;
            info!(user_id = %user.id, revoked, "Disabled user, sessions revoked");
        }

        let info = UserInfo::from(user);
        info!(user_id = %info.id, updated_by = %actor.full_name, "User updated");
        router.mirror_user(UserChange::Updated(info.clone())).await;
        Ok(info)
    }

    pub async fn delete(
        pool: &SqlitePool,
        router: &DataSourceRouter,
        actor: &UserInfo,
        id: Uuid,
    ) -> Result<(), UserError> {
        require_role(actor, Role::SuperAdmin)?;
        if id == actor.id {
            return Err(UserError::Validation(
                "you cannot delete your own account".to_string(),
            ));
        }

        let user = User::find_by_id(pool, id).await?.ok_or(UserError::NotFound)?;
        Session::delete_by_user(pool, id).await?;
        if User::delete(pool, id).await? == 0 {
            return Err(UserError::NotFound);
        }
        info!(user_id = %id, deleted_by = %actor.full_name, "User deleted");
        router
            .mirror_user(UserChange::Deleted(UserInfo::from(user)))
            .await;
        Ok(())
    }

    /// Create the first SuperAdmin when no accounts exist yet.
    pub async fn ensure_bootstrap_admin(
        pool: &SqlitePool,
        admin: &BootstrapAdmin,
        bcrypt_cost: u32,
    ) -> Result<Option<UserInfo>, UserError> {
        if User::count(pool).await? > 0 {
            return Ok(None);
        }
        let username = required("username", &admin.username)?;
        validate_password(&admin.password)?;

        let user = User::create(
            pool,
            &CreateUser {
                full_name: required("full name", &admin.full_name)?,
                username,
                password_hash: hash_password(&admin.password, bcrypt_cost).await?,
                role: Role::SuperAdmin,
                timeout_minutes: DEFAULT_TIMEOUT_MINUTES,
                status: UserStatus::Active,
            },
        )
        .await?;
        info!(user_id = %user.id, username = %user.username, "Bootstrap SuperAdmin created");
        Ok(Some(UserInfo::from(user)))
    }
}

fn required(field: &str, value: &str) -> Result<String, UserError> {
    let value = value.trim();
    if value.is_empty() {
        Err(UserError::Validation(format!("{field} is required")))
    } else {
        Ok(value.to_string())
    }
}

fn validate_password(password: &str) -> Result<(), UserError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(UserError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn validate_timeout(minutes: i64) -> Result<i64, UserError> {
    if minutes < 1 {
        return Err(UserError::Validation(
            "session timeout must be at least 1 minute".to_string(),
        ));
    }
    Ok(minutes)
}

fn conflict_or(e: sqlx::Error, username: &str) -> UserError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => UserError::Conflict(username.to_string()),
        _ => UserError::Database(e),
    }
}
