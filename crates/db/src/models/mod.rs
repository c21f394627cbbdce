pub mod oil_entry;
pub mod report;
pub mod session;
pub mod setting;
pub mod user;
pub mod vehicle;
