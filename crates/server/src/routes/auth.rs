use axum::{
    Json, Router,
    extract::State,
    response::Json as ResponseJson,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use db::models::{session::Session, user::UserInfo};
use deployment::Deployment;
use services::services::auth::{AuthService, LoginRequest, LoginResponse, SESSION_COOKIE};
use time::OffsetDateTime;
use utils::response::ApiResponse;

use crate::{
    DeploymentImpl,
    error::ApiError,
    middleware::{CurrentUser, session::session_id_from},
};

fn session_cookie(session: &Session, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .expires(OffsetDateTime::from_unix_timestamp(session.expires_at.timestamp()).ok())
        .build()
}

/// Check credentials and start a session cookie
pub async fn login(
    State(deployment): State<DeploymentImpl>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, ResponseJson<ApiResponse<LoginResponse>>), ApiError> {
    let (session, user) =
        AuthService::login(&deployment.db().pool, &payload.username, &payload.password).await?;

    let jar = jar.add(session_cookie(&session, deployment.config().cookie_secure));
    let response = LoginResponse {
        user,
        expires_at: session.expires_at,
    };
    Ok((jar, ResponseJson(ApiResponse::success(response))))
}

/// End the current session and clear its cookie
pub async fn logout(
    State(deployment): State<DeploymentImpl>,
    jar: CookieJar,
) -> Result<(CookieJar, ResponseJson<ApiResponse<()>>), ApiError> {
    if let Some(session_id) = session_id_from(&jar) {
        AuthService::logout(&deployment.db().pool, session_id).await?;
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    Ok((jar, ResponseJson(ApiResponse::success(()))))
}

/// Get the signed-in user
pub async fn me(
    CurrentUser { user, .. }: CurrentUser,
) -> Result<ResponseJson<ApiResponse<UserInfo>>, ApiError> {
    Ok(ResponseJson(ApiResponse::success(user)))
}

pub fn router(_deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    Router::new().nest(
        "/auth",
        Router::new()
            .route("/login", post(login))
            .route("/logout", post(logout))
            .route("/me", get(me)),
    )
}
