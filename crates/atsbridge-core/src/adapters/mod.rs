//! Provider adapter implementations.

pub mod greenhouse;
pub mod workable;
pub mod zoho_recruit;

use std::fmt::{Display, Formatter};

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::ProviderId;

pub use greenhouse::GreenhouseAdapter;
pub use workable::WorkableAdapter;
pub use zoho_recruit::ZohoRecruitAdapter;

/// Vendor record id, numeric or string depending on the API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum RecordId {
    Number(u64),
    Text(String),
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

/// Decodes vendor records, skipping those that do not match the expected shape.
pub(crate) fn decode_records<T: DeserializeOwned>(
    provider: ProviderId,
    kind: &'static str,
    records: Vec<Value>,
) -> Vec<T> {
    let total = records.len();
    let decoded = records
        .into_iter()
        .filter_map(|record| serde_json::from_value::<T>(record).ok())
        .collect::<Vec<_>>();

    if decoded.len() < total {
        warn!(
            provider = %provider,
            kind,
            skipped = total - decoded.len(),
            "skipping vendor records with unexpected shape"
        );
    }
    decoded
}

/// Case-insensitive lookup in a fixed vendor status table.
pub(crate) fn lookup_status<S: Copy>(table: &[(&str, S)], value: &str) -> Option<S> {
    let value = value.trim();
    table
        .iter()
        .find(|(vendor, _)| vendor.eq_ignore_ascii_case(value))
        .map(|(_, status)| *status)
}

/// Trimmed, non-empty string.
pub(crate) fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Record id at `pointer` rendered as a string; numbers and non-empty strings only.
pub(crate) fn id_at(body: &Value, pointer: &str) -> Option<String> {
    match body.pointer(pointer)? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) => non_empty(Some(text)).map(str::to_owned),
        _ => None,
    }
}

/// Array payload at `pointer`, or an empty list when absent.
pub(crate) fn array_at(body: &Value, pointer: &str) -> Vec<Value> {
    body.pointer(pointer)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Record {
        id: RecordId,
    }

    #[test]
    fn record_ids_accept_numbers_and_strings() {
        let records: Vec<Record> = decode_records(
            ProviderId::Greenhouse,
            "job",
            vec![json!({"id": 42}), json!({"id": "3ab"}), json!({"name": "no id"})],
        );

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id.to_string(), "42");
        assert_eq!(records[1].id.to_string(), "3ab");
    }

    #[test]
    fn status_lookup_ignores_case() {
        let table = [("In-progress", 1), ("Filled", 2)];

        assert_eq!(lookup_status(&table, "in-PROGRESS"), Some(1));
        assert_eq!(lookup_status(&table, "Unknown"), None);
    }
}
