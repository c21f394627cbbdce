use axum::Router;
use tower_http::trace::TraceLayer;

use crate::DeploymentImpl;

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod oil_entries;
pub mod reports;
pub mod settings;
pub mod users;
pub mod vehicles;

pub fn router(deployment: DeploymentImpl) -> Router {
    let api_routes = Router::new()
        .merge(auth::router(&deployment))
        .merge(dashboard::router(&deployment))
        .merge(oil_entries::router(&deployment))
        .merge(vehicles::router(&deployment))
        .merge(reports::router(&deployment))
        .merge(users::router(&deployment))
        .merge(settings::router(&deployment))
        .merge(health::router(&deployment));

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}
