//! Client for the spreadsheet-backed web app that mirrors the ledger.
//!
//! The remote side speaks a small JSON protocol: reads are `GET ?action=...`,
//! writes are `POST {"action": ..., "data": ...}`, and every reply is wrapped
//! in `{"success": bool, "data": ..., "error": ...}`. Rows use the sheet's
//! column headers as keys.

use std::{collections::HashMap, hash::Hash, time::Duration};

use chrono::{DateTime, NaiveDate, Utc};
use db::models::{
    oil_entry::{EntryStatus, EntryType, OilEntry},
    report::Report,
    user::{Role, UserInfo, UserStatus},
    vehicle::Vehicle,
};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;
use serde_with::skip_serializing_none;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use super::reports::parse_report_date;

#[derive(Debug, Clone, Error)]
pub enum SheetsApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("sheet api error: {0}")]
    Remote(String),
    #[error("json error: {0}")]
    Serde(String),
}

/// Everything the remote dashboard call returns, already converted to ledger types.
#[derive(Debug, Clone, Default)]
pub struct SheetDashboard {
    pub oil_entries: Vec<OilEntry>,
    pub vehicles: Vec<Vehicle>,
    pub reports: Vec<Report>,
    pub vendors: Vec<String>,
    /// Raw `SheetID` of each oil row, by the entry id it was read as.
    pub entry_keys: HashMap<Uuid, String>,
    /// Raw `SheetID` of each account row, by username.
    pub user_keys: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

#[derive(Debug, Serialize)]
struct SheetRequest<'a, T: Serialize> {
    action: &'a str,
    data: T,
}

#[derive(Debug, Deserialize, Default)]
struct DashboardPayload {
    #[serde(rename = "OilData", default)]
    oil_data: Vec<Value>,
    #[serde(rename = "VehicleData", default)]
    vehicle_data: Vec<Value>,
    #[serde(rename = "Reports", default)]
    reports: Vec<Value>,
    #[serde(rename = "UsersInfo", default)]
    users_info: Vec<Value>,
    #[serde(rename = "Vendors", default)]
    vendors: Vec<Value>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SheetOilRow {
    #[serde(rename = "SheetID", deserialize_with = "required_string")]
    sheet_id: String,
    #[serde(rename = "EntryType")]
    entry_type: String,
    #[serde(rename = "Date", deserialize_with = "required_string")]
    date: String,
    #[serde(rename = "VehicleNo", default, deserialize_with = "lenient_string")]
    vehicle_no: Option<String>,
    #[serde(rename = "OilinLiters", default, deserialize_with = "lenient_f64")]
    oil_liters: Option<f64>,
    #[serde(rename = "PurchasedStock", default, deserialize_with = "lenient_f64")]
    purchased_stock: Option<f64>,
    #[serde(rename = "InvoiceAmount", default, deserialize_with = "lenient_f64")]
    invoice_amount: Option<f64>,
    #[serde(rename = "Vendor", default, deserialize_with = "lenient_string")]
    vendor: Option<String>,
    #[serde(rename = "Remarks", default, deserialize_with = "lenient_string")]
    remarks: Option<String>,
    #[serde(rename = "CreatedOn", default, deserialize_with = "lenient_string")]
    created_on: Option<String>,
    #[serde(rename = "EnteredBy", default, deserialize_with = "lenient_string")]
    entered_by: Option<String>,
    #[serde(rename = "EditedOn", default, deserialize_with = "lenient_string")]
    edited_on: Option<String>,
    #[serde(rename = "EditedBy", default, deserialize_with = "lenient_string")]
    edited_by: Option<String>,
    #[serde(rename = "Status", default, deserialize_with = "lenient_string")]
    status: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SheetVehicleRow {
    #[serde(rename = "VehicleNo", deserialize_with = "required_string")]
    vehicle_no: String,
    #[serde(rename = "OilInLiters", default, deserialize_with = "lenient_f64")]
    oil_in_liters: Option<f64>,
    #[serde(rename = "Contractor", default, deserialize_with = "lenient_string")]
    contractor: Option<String>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SheetReportRow {
    #[serde(rename = "SheetID", default, deserialize_with = "lenient_string")]
    sheet_id: Option<String>,
    #[serde(rename = "SrNo", default, deserialize_with = "lenient_f64")]
    sr_no: Option<f64>,
    #[serde(rename = "VehicleNo", deserialize_with = "required_string")]
    vehicle_no: String,
    #[serde(rename = "LastDateOfOilChange", default, deserialize_with = "lenient_string")]
    last_date_of_oil_change: Option<String>,
    #[serde(rename = "TripAfterOilChange", default, deserialize_with = "lenient_f64")]
    trip_after_oil_change: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct SheetUserRow {
    #[serde(rename = "SheetID", deserialize_with = "required_string")]
    sheet_id: String,
    #[serde(rename = "FullName", deserialize_with = "required_string")]
    full_name: String,
    #[serde(rename = "userName", deserialize_with = "required_string")]
    username: String,
    #[serde(rename = "UserType")]
    user_type: String,
    #[serde(rename = "TimeOutMinute", default, deserialize_with = "lenient_f64")]
    timeout_minutes: Option<f64>,
    #[serde(rename = "Status")]
    status: String,
}

/// Spreadsheet web-app client
#[derive(Debug, Clone)]
pub struct SheetsClient {
    http: Client,
    base_url: Url,
}

impl SheetsClient {
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, SheetsApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("oil-ledger/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SheetsApiError::Transport(e.to_string()))?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Round-trip a no-op request to check the endpoint answers.
    pub async fn ping(&self) -> Result<(), SheetsApiError> {
        self.get::<Value>("ping").await.map(|_| ())
    }

    pub async fn fetch_dashboard(&self) -> Result<SheetDashboard, SheetsApiError> {
        let payload = self
            .get::<DashboardPayload>("getDashboard")
            .await?
            .unwrap_or_default();
        Ok(payload.into_dashboard())
    }

    pub async fn add_oil_entries(&self, entries: &[OilEntry]) -> Result<(), SheetsApiError> {
        let rows: Vec<SheetOilRow> = entries.iter().map(SheetOilRow::from).collect();
        self.post("addOilEntries", rows).await
    }

    /// Rewrite the row stored under `sheet_key`.
    pub async fn update_oil_entry(
        &self,
        sheet_key: &str,
        entry: &OilEntry,
    ) -> Result<(), SheetsApiError> {
        let row = SheetOilRow {
            sheet_id: sheet_key.to_string(),
            ..SheetOilRow::from(entry)
        };
        self.post("updateOilEntry", row).await
    }

    pub async fn delete_oil_entry(&self, sheet_key: &str) -> Result<(), SheetsApiError> {
        self.post("deleteOilEntry", serde_json::json!({ "SheetID": sheet_key }))
            .await
    }

    pub async fn add_vehicle(&self, vehicle: &Vehicle) -> Result<(), SheetsApiError> {
        self.post("addVehicle", SheetVehicleRow::from(vehicle)).await
    }

    pub async fn update_vehicle(&self, vehicle: &Vehicle) -> Result<(), SheetsApiError> {
        self.post("updateVehicle", SheetVehicleRow::from(vehicle)).await
    }

    pub async fn delete_vehicle(&self, vehicle_no: &str) -> Result<(), SheetsApiError> {
        self.post("deleteVehicle", serde_json::json!({ "VehicleNo": vehicle_no }))
            .await
    }

    pub async fn replace_reports(&self, reports: &[Report]) -> Result<(), SheetsApiError> {
        let rows: Vec<SheetReportRow> = reports.iter().map(SheetReportRow::from).collect();
        self.post("replaceReports", rows).await
    }

    pub async fn add_user(&self, user: &UserInfo) -> Result<(), SheetsApiError> {
        self.post("addUser", SheetUserRow::from(user)).await
    }

    pub async fn update_user(&self, sheet_key: &str, user: &UserInfo) -> Result<(), SheetsApiError> {
        let row = SheetUserRow {
            sheet_id: sheet_key.to_string(),
            ..SheetUserRow::from(user)
        };
        self.post("updateUser", row).await
    }

    pub async fn delete_user(&self, sheet_key: &str) -> Result<(), SheetsApiError> {
        self.post("deleteUser", serde_json::json!({ "SheetID": sheet_key }))
            .await
    }

    async fn get<T: DeserializeOwned>(&self, action: &str) -> Result<Option<T>, SheetsApiError> {
        debug!(action, "Sheet API read");
        let res = self
            .http
            .get(self.base_url.clone())
            .query(&[("action", action)])
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode(res).await
    }

    async fn post<T: Serialize>(&self, action: &str, data: T) -> Result<(), SheetsApiError> {
        debug!(action, "Sheet API write");
        let res = self
            .http
            .post(self.base_url.clone())
            .json(&SheetRequest { action, data })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        Self::decode::<Value>(res).await.map(|_| ())
    }

    async fn decode<T: DeserializeOwned>(
        res: reqwest::Response,
    ) -> Result<Option<T>, SheetsApiError> {
        match res.status() {
            s if s.is_success() => {
                let envelope = res
                    .json::<Envelope<T>>()
                    .await
                    .map_err(|e| SheetsApiError::Serde(e.to_string()))?;
                if envelope.success {
                    Ok(envelope.data)
                } else {
                    Err(SheetsApiError::Remote(
                        envelope
                            .error
                            .unwrap_or_else(|| "request rejected".to_string()),
                    ))
                }
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Err(SheetsApiError::Timeout),
            s => {
                let status = s.as_u16();
                let body = res.text().await.unwrap_or_default();
                Err(SheetsApiError::Http { status, body })
            }
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> SheetsApiError {
    if e.is_timeout() {
        SheetsApiError::Timeout
    } else {
        SheetsApiError::Transport(e.to_string())
    }
}

/// Sheet rows may carry ids from before the ledger used UUIDs; those map to a stable v5 id.
pub fn sheet_id_to_uuid(raw: &str) -> Uuid {
    let raw = raw.trim();
    Uuid::parse_str(raw).unwrap_or_else(|_| Uuid::new_v5(&Uuid::NAMESPACE_OID, raw.as_bytes()))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw.trim()) {
        return Some(ts.with_timezone(&Utc));
    }
    parse_report_date(raw)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

impl DashboardPayload {
    fn into_dashboard(self) -> SheetDashboard {
        let (oil_entries, entry_keys) =
            convert_keyed_rows::<SheetOilRow, OilEntry, _>(self.oil_data, "oil entry", |e| e.id);
        let (_, user_keys) = convert_keyed_rows::<SheetUserRow, UserInfo, _>(
            self.users_info,
            "user",
            |u| u.username.clone(),
        );
        SheetDashboard {
            oil_entries,
            vehicles: convert_rows::<SheetVehicleRow, _>(self.vehicle_data, "vehicle"),
            reports: convert_rows::<SheetReportRow, _>(self.reports, "report"),
            vendors: collect_vendors(self.vendors),
            entry_keys,
            user_keys,
        }
    }
}

/// Rows whose `SheetID` must be sent back verbatim on update and delete.
trait SheetKeyed {
    fn sheet_key(&self) -> &str;
}

impl SheetKeyed for SheetOilRow {
    fn sheet_key(&self) -> &str {
        self.sheet_id.trim()
    }
}

impl SheetKeyed for SheetUserRow {
    fn sheet_key(&self) -> &str {
        self.sheet_id.trim()
    }
}

/// Malformed rows are logged and dropped rather than failing the whole read.
fn convert_rows<R, T>(rows: Vec<Value>, kind: &str) -> Vec<T>
where
    R: DeserializeOwned,
    T: TryFrom<R, Error = String>,
{
    rows.into_iter()
        .filter_map(|raw| {
            serde_json::from_value::<R>(raw)
                .map_err(|e| e.to_string())
                .and_then(T::try_from)
                .map_err(|reason| warn!(kind, reason = %reason, "Skipping malformed sheet row"))
                .ok()
        })
        .collect()
}

/// Like [`convert_rows`], also indexing each accepted row's raw `SheetID` by `index`.
fn convert_keyed_rows<R, T, K>(
    rows: Vec<Value>,
    kind: &str,
    index: impl Fn(&T) -> K,
) -> (Vec<T>, HashMap<K, String>)
where
    R: DeserializeOwned + SheetKeyed,
    T: TryFrom<R, Error = String>,
    K: Eq + Hash,
{
    let mut keys = HashMap::new();
    let items = rows
        .into_iter()
        .filter_map(|raw| {
            let row = serde_json::from_value::<R>(raw)
                .map_err(|e| warn!(kind, reason = %e, "Skipping malformed sheet row"))
                .ok()?;
            let key = row.sheet_key().to_string();
            let item = T::try_from(row)
                .map_err(|reason| warn!(kind, reason = %reason, "Skipping malformed sheet row"))
                .ok()?;
            keys.insert(index(&item), key);
            Some(item)
        })
        .collect();
    (items, keys)
}

fn collect_vendors(raw: Vec<Value>) -> Vec<String> {
    let mut vendors: Vec<String> = raw
        .into_iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    vendors.sort();
    vendors.dedup();
    vendors
}

impl From<&OilEntry> for SheetOilRow {
    fn from(entry: &OilEntry) -> Self {
        Self {
            sheet_id: entry.id.to_string(),
            entry_type: entry.entry_type.to_string(),
            date: entry.entry_date.format("%Y-%m-%d").to_string(),
            vehicle_no: entry.vehicle_no.clone(),
            oil_liters: entry.oil_liters,
            purchased_stock: entry.purchased_stock,
            invoice_amount: entry.invoice_amount,
            vendor: entry.vendor.clone(),
            remarks: entry.remarks.clone(),
            created_on: Some(entry.created_on.to_rfc3339()),
            entered_by: Some(entry.entered_by.clone()),
            edited_on: entry.edited_on.map(|ts| ts.to_rfc3339()),
            edited_by: entry.edited_by.clone(),
            status: Some(entry.status.to_string()),
        }
    }
}

impl TryFrom<SheetOilRow> for OilEntry {
    type Error = String;

    fn try_from(row: SheetOilRow) -> Result<Self, Self::Error> {
        let entry_type = row
            .entry_type
            .trim()
            .parse::<EntryType>()
            .map_err(|_| format!("unknown entry type '{}'", row.entry_type))?;
        let entry_date: NaiveDate =
            parse_report_date(&row.date).ok_or_else(|| format!("bad date '{}'", row.date))?;
        let status = match row.status.as_deref() {
            Some(raw) => raw
                .trim()
                .parse::<EntryStatus>()
                .map_err(|_| format!("unknown status '{raw}'"))?,
            None => EntryStatus::Pending,
        };

        Ok(OilEntry {
            id: sheet_id_to_uuid(&row.sheet_id),
            entry_type,
            entry_date,
            vehicle_no: row.vehicle_no,
            oil_liters: row.oil_liters,
            purchased_stock: row.purchased_stock,
            invoice_amount: row.invoice_amount,
            vendor: row.vendor,
            remarks: row.remarks,
            created_on: row
                .created_on
                .as_deref()
                .and_then(parse_timestamp)
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            entered_by: row.entered_by.unwrap_or_default(),
            edited_on: row.edited_on.as_deref().and_then(parse_timestamp),
            edited_by: row.edited_by,
            status,
        })
    }
}

impl From<&Vehicle> for SheetVehicleRow {
    fn from(vehicle: &Vehicle) -> Self {
        Self {
            vehicle_no: vehicle.vehicle_no.clone(),
            oil_in_liters: vehicle.oil_in_liters,
            contractor: Some(vehicle.contractor.clone()),
        }
    }
}

impl TryFrom<SheetVehicleRow> for Vehicle {
    type Error = String;

    fn try_from(row: SheetVehicleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            vehicle_no: row.vehicle_no,
            oil_in_liters: row.oil_in_liters,
            contractor: row.contractor.unwrap_or_default(),
        })
    }
}

impl From<&Report> for SheetReportRow {
    fn from(report: &Report) -> Self {
        Self {
            sheet_id: Some(report.id.to_string()),
            sr_no: Some(report.sr_no as f64),
            vehicle_no: report.vehicle_no.clone(),
            last_date_of_oil_change: report
                .last_date_of_oil_change
                .map(|d| d.format("%Y-%m-%d").to_string()),
            trip_after_oil_change: Some(report.trip_after_oil_change as f64),
        }
    }
}

impl TryFrom<SheetReportRow> for Report {
    type Error = String;

    fn try_from(row: SheetReportRow) -> Result<Self, Self::Error> {
        let last_date_of_oil_change = match row.last_date_of_oil_change.as_deref() {
            Some(raw) => Some(parse_report_date(raw).ok_or_else(|| format!("bad date '{raw}'"))?),
            None => None,
        };
        let id = match row.sheet_id.as_deref() {
            Some(raw) => sheet_id_to_uuid(raw),
            None => sheet_id_to_uuid(&format!("report:{}", row.vehicle_no)),
        };
        Ok(Report {
            id,
            sr_no: row.sr_no.unwrap_or(0.0) as i64,
            vehicle_no: row.vehicle_no,
            last_date_of_oil_change,
            trip_after_oil_change: row.trip_after_oil_change.unwrap_or(0.0).max(0.0) as i64,
        })
    }
}

impl From<&UserInfo> for SheetUserRow {
    fn from(user: &UserInfo) -> Self {
        Self {
            sheet_id: user.id.to_string(),
            full_name: user.full_name.clone(),
            username: user.username.clone(),
            user_type: user.role.to_string(),
            timeout_minutes: Some(user.timeout_minutes as f64),
            status: user.status.to_string(),
        }
    }
}

impl TryFrom<SheetUserRow> for UserInfo {
    type Error = String;

    fn try_from(row: SheetUserRow) -> Result<Self, Self::Error> {
        Ok(UserInfo {
            id: sheet_id_to_uuid(&row.sheet_id),
            full_name: row.full_name,
            username: row.username,
            role: row
                .user_type
                .trim()
                .parse::<Role>()
                .map_err(|_| format!("unknown user type '{}'", row.user_type))?,
            timeout_minutes: row.timeout_minutes.unwrap_or(60.0).max(1.0) as i64,
            status: row
                .status
                .trim()
                .parse::<UserStatus>()
                .map_err(|_| format!("unknown status '{}'", row.status))?,
        })
    }
}

/// Accepts a number, a numeric string, a blank string or null.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => Ok(n.as_f64()),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("expected a number, got '{s}'"))),
        Some(other) => Err(D::Error::custom(format!("expected a number, got {other}"))),
    }
}

/// Accepts a string or a bare number; blanks become `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

fn required_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    lenient_string(deserializer)?.ok_or_else(|| D::Error::custom("missing required value"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, body_partial_json, method, query_param},
    };

    use super::*;

    async fn client_for(server: &MockServer) -> SheetsClient {
        SheetsClient::new(
            Url::parse(&format!("{}/exec", server.uri())).unwrap(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn dashboard_rows_are_converted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("action", "getDashboard"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {
                    "OilData": [
                        {
                            "SheetID": 17,
                            "EntryType": "Sales",
                            "Date": "05-03-25",
                            "VehicleNo": "KA-01",
                            "OilinLiters": "12.5",
                            "PurchasedStock": "",
                            "EnteredBy": "Asha",
                            "Status": "Pending"
                        },
                        { "SheetID": "x", "EntryType": "Gift", "Date": "2025-01-01" }
                    ],
                    "VehicleData": [{ "VehicleNo": "KA-01", "OilInLiters": 20, "Contractor": "" }],
                    "Reports": [{ "SrNo": "1", "VehicleNo": "KA-01", "LastDateOfOilChange": "05-03-25", "TripAfterOilChange": "" }],
                    "UsersInfo": [{ "SheetID": "u1", "FullName": "Asha", "userName": "asha", "UserType": "Admin", "TimeOutMinute": "30", "Status": "Active" }],
                    "Vendors": ["Shell", "", "Castrol", "Shell"]
                }
            })))
            .mount(&server)
            .await;

        let dashboard = client_for(&server).await.fetch_dashboard().await.unwrap();

        assert_eq!(dashboard.oil_entries.len(), 1);
        let entry = &dashboard.oil_entries[0];
        assert_eq!(entry.id, sheet_id_to_uuid("17"));
        assert_eq!(entry.entry_date, NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        assert_eq!(entry.oil_liters, Some(12.5));
        assert_eq!(entry.purchased_stock, None);
        assert_eq!(dashboard.vehicles[0].oil_in_liters, Some(20.0));
        assert_eq!(dashboard.reports[0].sr_no, 1);
        assert_eq!(dashboard.reports[0].trip_after_oil_change, 0);
        assert_eq!(dashboard.entry_keys.get(&entry.id).map(String::as_str), Some("17"));
        assert_eq!(dashboard.user_keys.get("asha").map(String::as_str), Some("u1"));
        assert_eq!(dashboard.vendors, vec!["Castrol".to_string(), "Shell".to_string()]);
    }

    #[tokio::test]
    async fn writes_post_action_and_sheet_columns() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "action": "addVehicle",
                "data": { "VehicleNo": "KA-09", "OilInLiters": 7.5, "Contractor": "Rao" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let vehicle = Vehicle {
            vehicle_no: "KA-09".to_string(),
            oil_in_liters: Some(7.5),
            contractor: "Rao".to_string(),
        };
        client_for(&server).await.add_vehicle(&vehicle).await.unwrap();
    }

    #[tokio::test]
    async fn keyed_writes_send_the_raw_sheet_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "action": "updateOilEntry",
                "data": { "SheetID": "17", "EntryType": "Sales", "Status": "Updated" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_json(json!({ "action": "deleteUser", "data": { "SheetID": "u1" } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let entry = OilEntry {
            id: sheet_id_to_uuid("17"),
            entry_type: EntryType::Sales,
            entry_date: NaiveDate::from_ymd_opt(2025, 3, 5).unwrap(),
            vehicle_no: Some("KA-01".to_string()),
            oil_liters: Some(12.5),
            purchased_stock: None,
            invoice_amount: None,
            vendor: None,
            remarks: None,
            created_on: Utc::now(),
            entered_by: "Asha".to_string(),
            edited_on: None,
            edited_by: None,
            status: EntryStatus::Updated,
        };
        client.update_oil_entry("17", &entry).await.unwrap();
        client.delete_user("u1").await.unwrap();
    }

    #[tokio::test]
    async fn remote_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "success": false, "error": "sheet locked" })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server)
            .await
            .delete_vehicle("KA-01")
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsApiError::Remote(msg) if msg == "sheet locked"));
    }

    #[tokio::test]
    async fn http_failures_carry_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client_for(&server).await.ping().await.unwrap_err();
        assert!(matches!(err, SheetsApiError::Http { status: 500, ref body } if body == "boom"));
    }

    #[test]
    fn sheet_ids_map_to_stable_uuids() {
        let id = Uuid::new_v4();
        assert_eq!(sheet_id_to_uuid(&id.to_string()), id);
        assert_eq!(sheet_id_to_uuid("42"), sheet_id_to_uuid(" 42 "));
        assert_ne!(sheet_id_to_uuid("42"), sheet_id_to_uuid("43"));
    }

    #[test]
    fn oil_rows_omit_empty_columns() {
        let entry = OilEntry {
            id: Uuid::new_v4(),
            entry_type: EntryType::Purchase,
            entry_date: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
            vehicle_no: None,
            oil_liters: None,
            purchased_stock: Some(100.0),
            invoice_amount: Some(2500.0),
            vendor: Some("Shell".to_string()),
            remarks: None,
            created_on: Utc::now(),
            entered_by: "Asha".to_string(),
            edited_on: None,
            edited_by: None,
            status: EntryStatus::Pending,
        };
        let row = serde_json::to_value(SheetOilRow::from(&entry)).unwrap();
        assert_eq!(row["EntryType"], "Purchase");
        assert_eq!(row["Date"], "2025-06-30");
        assert_eq!(row["PurchasedStock"], 100.0);
        assert!(row.get("VehicleNo").is_none());
        assert!(row.get("OilinLiters").is_none());
    }
}
