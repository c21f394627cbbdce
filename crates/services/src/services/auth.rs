//! Username/password login backed by server-side sessions.

use chrono::{DateTime, Duration, Utc};
use db::models::{
    session::Session,
    user::{User, UserInfo},
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Validation(String),
    #[error("invalid credentials or inactive account")]
    InvalidCredentials,
    #[error("not authenticated")]
    Unauthenticated,
    #[error("password hashing failed: {0}")]
    Hash(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct LoginResponse {
    pub user: UserInfo,
    pub expires_at: DateTime<Utc>,
}

pub struct AuthService;

impl AuthService {
    /// Check credentials and open a session lasting the user's timeout.
    pub async fn login(
        pool: &SqlitePool,
        username: &str,
        password: &str,
    ) -> Result<(Session, UserInfo), AuthError> {
        let username = username.trim();
        if username.is_empty() || password.is_empty() {
            return Err(AuthError::Validation(
                "username and password are required".to_string(),
            ));
        }

        let Some(user) = User::find_by_username(pool, username).await? else {
            debug!(username, "Login for unknown user");
            return Err(AuthError::InvalidCredentials);
        };
        if !user.is_active() {
            warn!(user_id = %user.id, "Login attempt on disabled account");
            return Err(AuthError::InvalidCredentials);
        }
        if !verify_password(password, &user.password_hash).await? {
            debug!(user_id = %user.id, "Login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        let lifetime = Duration::minutes(user.timeout_minutes.max(1));
        let session = Session::create(pool, user.id, lifetime).await?;
        info!(user_id = %user.id, expires_at = %session.expires_at, "User logged in");
        Ok((session, UserInfo::from(user)))
    }

    pub async fn logout(pool: &SqlitePool, session_id: Uuid) -> Result<(), AuthError> {
        if Session::delete(pool, session_id).await? > 0 {
            info!(session_id = %session_id, "User logged out");
        }
        Ok(())
    }

    /// Resolve a session cookie to its user. Expired sessions are removed on sight.
    pub async fn current_user(
        pool: &SqlitePool,
        session_id: Option<Uuid>,
    ) -> Result<(Session, UserInfo), AuthError> {
        let session_id = session_id.ok_or(AuthError::Unauthenticated)?;
        let session = Session::find_by_id(pool, session_id)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        if session.is_expired() {
            Session::delete(pool, session.id).await?;
            debug!(session_id = %session.id, "Session expired");
            return Err(AuthError::Unauthenticated);
        }

        match User::find_by_id(pool, session.user_id).await? {
            Some(user) if user.is_active() => Ok((session, UserInfo::from(user))),
            _ => {
                Session::delete(pool, session.id).await?;
                Err(AuthError::Unauthenticated)
            }
        }
    }
}

pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}
