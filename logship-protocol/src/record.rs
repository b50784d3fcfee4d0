use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One structured access-log entry.
///
/// Decoded from either a JSON object line or a Common Log Format line.
/// Every field is defaulted so both formats produce the same shape; fields
/// the source format does not carry stay at zero/empty. Durations are in
/// nanoseconds. Serde names match the upstream JSON keys exactly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
pub struct AccessLogRecord {
    pub client_addr: String,
    pub client_host: String,
    pub client_port: String,
    pub client_username: String,
    pub downstream_content_size: i64,
    pub downstream_status: u16,
    pub duration: i64,
    pub origin_content_size: i64,
    pub origin_duration: i64,
    pub origin_status: u16,
    pub overhead: i64,
    pub request_addr: String,
    pub request_content_size: i64,
    pub request_count: u32,
    pub request_host: String,
    pub request_method: String,
    pub request_path: String,
    pub request_port: String,
    pub request_protocol: String,
    pub request_scheme: String,
    pub retry_attempts: u32,
    pub router_name: String,
    pub service_addr: String,
    pub service_name: String,
    #[serde(rename = "ServiceURL")]
    pub service_url: String,
    pub start_local: Option<DateTime<Utc>>,
    #[serde(rename = "StartUTC")]
    pub start_utc: Option<DateTime<Utc>>,
    #[serde(rename = "entryPointName")]
    pub entry_point_name: String,
    pub request_referer: String,
    pub request_user_agent: String,
}
