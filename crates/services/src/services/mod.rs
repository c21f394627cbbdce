pub mod access;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod data_source;
pub mod database_validator;
pub mod oil_entries;
pub mod reports;
pub mod session_sweeper;
pub mod settings;
pub mod sheets_api;
pub mod users;
pub mod vehicles;
