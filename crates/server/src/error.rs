use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{
    auth::AuthError,
    dashboard::DashboardError,
    data_source::StoreError,
    database_validator::DatabaseValidationError,
    oil_entries::OilEntryError,
    reports::ReportError,
    settings::SettingsError,
    users::UserError,
    vehicles::VehicleError,
};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    OilEntry(#[from] OilEntryError),
    #[error(transparent)]
    User(#[from] UserError),
    #[error(transparent)]
    Vehicle(#[from] VehicleError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Dashboard(#[from] DashboardError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    DatabaseValidation(#[from] DatabaseValidationError),
}

fn store_status(err: &StoreError) -> (StatusCode, &'static str) {
    match err {
        StoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError"),
        StoreError::Sheet(_) => (StatusCode::BAD_GATEWAY, "SheetError"),
        StoreError::Unavailable(_) => (StatusCode::SERVICE_UNAVAILABLE, "DataSourceUnavailable"),
    }
}

fn auth_status(err: &AuthError) -> (StatusCode, &'static str) {
    match err {
        AuthError::Validation(_) => (StatusCode::BAD_REQUEST, "ValidationError"),
        AuthError::InvalidCredentials | AuthError::Unauthenticated => {
            (StatusCode::UNAUTHORIZED, "Unauthorized")
        }
        AuthError::Database(_) | AuthError::Hash(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "AuthError")
        }
    }
}

impl ApiError {
    fn status(&self) -> (StatusCode, &'static str) {
        const FORBIDDEN: (StatusCode, &str) = (StatusCode::FORBIDDEN, "Forbidden");
        const INVALID: (StatusCode, &str) = (StatusCode::BAD_REQUEST, "ValidationError");
        const MISSING: (StatusCode, &str) = (StatusCode::NOT_FOUND, "NotFound");
        const DATABASE: (StatusCode, &str) = (StatusCode::INTERNAL_SERVER_ERROR, "DatabaseError");

        match self {
            ApiError::Auth(e) => auth_status(e),
            ApiError::OilEntry(e) => match e {
                OilEntryError::Store(e) => store_status(e),
                OilEntryError::Forbidden(_) => FORBIDDEN,
                OilEntryError::Validation(_) => INVALID,
                OilEntryError::NotFound => MISSING,
            },
            ApiError::User(e) => match e {
                UserError::Database(_) => DATABASE,
                UserError::Forbidden(_) => FORBIDDEN,
                UserError::Auth(e) => auth_status(e),
                UserError::Validation(_) => INVALID,
                UserError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
                UserError::NotFound => MISSING,
            },
            ApiError::Vehicle(e) => match e {
                VehicleError::Store(e) => store_status(e),
                VehicleError::Forbidden(_) => FORBIDDEN,
                VehicleError::Validation(_) => INVALID,
                VehicleError::Conflict(_) => (StatusCode::CONFLICT, "Conflict"),
                VehicleError::NotFound => MISSING,
            },
            ApiError::Report(e) => match e {
                ReportError::Store(e) => store_status(e),
                ReportError::Forbidden(_) => FORBIDDEN,
                ReportError::Validation(_) => INVALID,
                ReportError::NotFound => MISSING,
            },
            ApiError::Settings(e) => match e {
                SettingsError::Database(_) => DATABASE,
                SettingsError::Store(e) => store_status(e),
                SettingsError::Forbidden(_) => FORBIDDEN,
                SettingsError::Validation(_) => INVALID,
            },
            ApiError::Dashboard(e) => match e {
                DashboardError::Store(e) => store_status(e),
                DashboardError::Database(_) => DATABASE,
            },
            ApiError::Store(e) => store_status(e),
            ApiError::Database(_) => DATABASE,
            ApiError::DatabaseValidation(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "DatabaseUnavailable")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status_code, error_type) = self.status();

        if status_code.is_server_error() {
            tracing::error!(error_type, error = %self, "Request failed");
        } else {
            tracing::debug!(error_type, error = %self, "Request rejected");
        }

        let message = if status_code == StatusCode::INTERNAL_SERVER_ERROR {
            "An internal error occurred. Check the server logs.".to_string()
        } else {
            self.to_string()
        };
        let response = ApiResponse::<()>::error(&message);
        (status_code, Json(response)).into_response()
    }
}
