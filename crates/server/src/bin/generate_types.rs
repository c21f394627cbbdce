use std::{fs, path::PathBuf};

use anyhow::{Context, bail};
use ts_rs::TS;

const HEADER: &str =
    "// This file was generated by `cargo run --bin generate_types`. Do not edit it by hand.\n\n";

fn generate_types_content() -> String {
    let decls = [
        utils::response::ApiResponse::<()>::decl(),
        db::models::user::Role::decl(),
        db::models::user::UserStatus::decl(),
        db::models::user::UserInfo::decl(),
        db::models::session::Session::decl(),
        db::models::oil_entry::EntryType::decl(),
        db::models::oil_entry::EntryStatus::decl(),
        db::models::oil_entry::OilEntry::decl(),
        db::models::vehicle::Vehicle::decl(),
        db::models::report::Report::decl(),
        db::models::setting::DataSource::decl(),
        db::models::setting::Setting::decl(),
        services::services::auth::LoginRequest::decl(),
        services::services::auth::LoginResponse::decl(),
        services::services::oil_entries::CreateOilEntry::decl(),
        services::services::oil_entries::UpdateOilEntry::decl(),
        services::services::vehicles::CreateVehicle::decl(),
        services::services::vehicles::UpdateVehicle::decl(),
        services::services::users::CreateUserRequest::decl(),
        services::services::users::UpdateUserRequest::decl(),
        services::services::settings::SettingsView::decl(),
        services::services::settings::UpdateSetting::decl(),
        services::services::settings::SheetConnectionStatus::decl(),
        services::services::dashboard::DashboardData::decl(),
        services::services::database_validator::ValidationResult::decl(),
        server::routes::reports::UpdateTrips::decl(),
    ];

    let body = decls
        .into_iter()
        .map(|decl| {
            let decl = decl.trim_start();
            if decl.starts_with("export") {
                decl.to_string()
            } else {
                format!("export {decl}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!("{HEADER}{body}\n")
}

fn main() -> anyhow::Result<()> {
    let check = std::env::args().any(|arg| arg == "--check");
    let shared = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../shared");
    let target = shared.join("types.ts");
    let content = generate_types_content();

    if check {
        let current = fs::read_to_string(&target)
            .with_context(|| format!("reading {}", target.display()))?;
        if current != content {
            bail!("{} is out of date, run generate_types", target.display());
        }
        println!("✅ shared/types.ts is up to date");
        return Ok(());
    }

    fs::create_dir_all(&shared).with_context(|| format!("creating {}", shared.display()))?;
    fs::write(&target, content).with_context(|| format!("writing {}", target.display()))?;
    println!("✅ TypeScript types written to {}", target.display());
    Ok(())
}
