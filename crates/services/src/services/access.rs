//! Role checks shared by every service.

use db::models::{
    oil_entry::OilEntry,
    user::{Role, UserInfo},
};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct AccessDenied(pub String);

pub fn require_role(actor: &UserInfo, minimum: Role) -> Result<(), AccessDenied> {
    if actor.role >= minimum {
        Ok(())
    } else {
        Err(AccessDenied(format!("{minimum} role required")))
    }
}

/// Admins edit anything; plain users only what they entered themselves.
pub fn can_modify_entry(actor: &UserInfo, entry: &OilEntry) -> bool {
    match actor.role {
        Role::SuperAdmin | Role::Admin => true,
        Role::User => entry.entered_by == actor.full_name,
    }
}

pub fn ensure_can_modify_entry(actor: &UserInfo, entry: &OilEntry) -> Result<(), AccessDenied> {
    if can_modify_entry(actor, entry) {
        Ok(())
    } else {
        Err(AccessDenied(
            "you can only modify entries you entered".to_string(),
        ))
    }
}
