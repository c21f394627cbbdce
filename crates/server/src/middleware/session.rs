//! Session cookie extractor for authenticated routes.

use axum::{extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;
use db::models::{session::Session, user::UserInfo};
use deployment::Deployment;
use services::services::auth::{AuthService, SESSION_COOKIE};
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// The logged-in user behind the request's `session_id` cookie.
///
/// Rejects with 401 when the cookie is missing, unknown, expired, or belongs
/// to a disabled account.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub session: Session,
    pub user: UserInfo,
}

pub fn session_id_from(jar: &CookieJar) -> Option<Uuid> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

impl FromRequestParts<DeploymentImpl> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        deployment: &DeploymentImpl,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let (session, user) =
            AuthService::current_user(&deployment.db().pool, session_id_from(&jar)).await?;
        Ok(Self { session, user })
    }
}
