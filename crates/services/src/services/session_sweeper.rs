//! Background service that purges expired login sessions.

use std::time::Duration;

use db::{DBService, models::session::Session};
use thiserror::Error;
use tokio::time::interval;
use tracing::{debug, error, info};

#[derive(Debug, Error)]
pub enum SessionSweepError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Background service for removing sessions past their expiry
pub struct SessionSweeperService {
    db: DBService,
    poll_interval: Duration,
}

impl SessionSweeperService {
    /// Spawn the background sweeper
    pub async fn spawn(db: DBService, poll_interval: Duration) -> tokio::task::JoinHandle<()> {
        let service = Self { db, poll_interval };
        tokio::spawn(async move {
            service.start().await;
        })
    }

    async fn start(&self) {
        info!(
            "Starting session sweeper with interval {:?}",
            self.poll_interval
        );

        let mut interval = interval(self.poll_interval);

        loop {
            interval.tick().await;
            if let Err(e) = self.sweep().await {
                error!("Error sweeping expired sessions: {}", e);
            }
        }
    }

    /// Delete expired sessions, returning how many were removed
    pub async fn sweep(&self) -> Result<u64, SessionSweepError> {
        let removed = Session::delete_expired(&self.db.pool).await?;
        if removed > 0 {
            info!(removed, "Session sweeper: removed expired sessions");
        } else {
            debug!("Session sweeper: nothing to remove");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration as ChronoDuration;
    use db::models::user::{CreateUser, Role, User, UserStatus};

    use super::*;

    #[tokio::test]
    async fn sweep_removes_only_expired_sessions() {
        let db = DBService::new_in_memory().await.unwrap();
        let user = User::create(
            &db.pool,
            &CreateUser {
                full_name: "Sweep Target".to_string(),
                username: "sweep".to_string(),
                password_hash: "hash".to_string(),
                role: Role::User,
                timeout_minutes: 5,
                status: UserStatus::Active,
            },
        )
        .await
        .unwrap();
        Session::create(&db.pool, user.id, ChronoDuration::hours(-1)).await.unwrap();
        let live = Session::create(&db.pool, user.id, ChronoDuration::hours(1)).await.unwrap();

        let sweeper = SessionSweeperService {
            db: db.clone(),
            poll_interval: Duration::from_secs(60),
        };
        assert_eq!(sweeper.sweep().await.unwrap(), 1);
        assert_eq!(sweeper.sweep().await.unwrap(), 0);
        assert!(Session::find_by_id(&db.pool, live.id).await.unwrap().is_some());
    }
}
