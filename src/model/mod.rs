use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// A log line as produced by an edge module and uploaded by the device runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLogRecord {
    #[serde(rename = "iothub", default, deserialize_with = "null_as_default")]
    pub source_hub: String,

    #[serde(rename = "device", default, deserialize_with = "null_as_default")]
    pub device_id: String,

    #[serde(rename = "id", default, deserialize_with = "null_as_default")]
    pub module_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub stream: String,

    #[serde(rename = "loglevel", default, deserialize_with = "null_as_default")]
    pub log_level: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub text: String,

    pub timestamp: DateTime<Utc>,
}

/// A log record in the shape the ingestion endpoint expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionLogRecord {
    pub iot_hub: String,
    pub device_id: String,
    pub module_id: String,
    pub stream: String,
    pub log_level: i64,
    pub message: String,
    pub timestamp: DateTime<Utc>,

    /// Owning resource, only set for resource-scoped ingestion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl IngestionLogRecord {
    pub fn from_raw(raw: RawLogRecord, resource_id: Option<&str>) -> Self {
        Self {
            iot_hub: raw.source_hub,
            device_id: raw.device_id,
            module_id: raw.module_id,
            stream: raw.stream,
            log_level: raw.log_level,
            message: raw.text,
            timestamp: raw.timestamp,
            resource_id: resource_id.map(str::to_string),
        }
    }

    /// Back-fill the owning resource after transformation
    pub fn with_resource_id(mut self, resource_id: impl Into<String>) -> Self {
        self.resource_id = Some(resource_id.into());
        self
    }
}

/// Decode an uploaded batch. The document must be a JSON array of records.
pub fn parse_raw_batch(input: &[u8]) -> Result<Vec<RawLogRecord>, serde_json::Error> {
    serde_json::from_slice(input)
}

/// Map every raw record to the ingestion schema, preserving order.
pub fn transform_batch(
    records: Vec<RawLogRecord>,
    resource_id: Option<&str>,
) -> Vec<IngestionLogRecord> {
    records
        .into_iter()
        .map(|raw| IngestionLogRecord::from_raw(raw, resource_id))
        .collect()
}

// Edge runtimes emit `null` for fields they could not fill
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
