// src/fetch/envelope.rs
//
// Every API call returns the same outer envelope: a success flag plus a
// nested result payload. Anything that is not a successful, well-formed
// envelope is an error for the caller to log and degrade on.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::meta::ResourceMetadata;

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    result: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct DataResult {
    records: Vec<Map<String, Value>>,
}

fn open(raw: &Value) -> Result<Value> {
    let envelope: Envelope =
        serde_json::from_value(raw.clone()).context("malformed API envelope")?;
    if !envelope.success {
        bail!("API reported success=false");
    }
    envelope.result.context("envelope missing result payload")
}

/// Extract the `resource_show` result payload.
pub fn meta_result(raw: &Value) -> Result<ResourceMetadata> {
    serde_json::from_value(open(raw)?).context("malformed resource metadata")
}

/// Extract the `datastore_search` result records.
pub fn data_records(raw: &Value) -> Result<Vec<Map<String, Value>>> {
    let result: DataResult =
        serde_json::from_value(open(raw)?).context("malformed datastore result")?;
    Ok(result.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn meta_envelope_roundtrip() {
        let raw = json!({
            "success": true,
            "result": {
                "name": "Median Resale Prices",
                "fields": [{"name": "month", "type": "datetime", "format": "YYYY-MM"}]
            }
        });
        let meta = meta_result(&raw).unwrap();
        assert_eq!(meta.name, "Median Resale Prices");
        assert_eq!(meta.fields.len(), 1);
    }

    #[test]
    fn unsuccessful_envelope_is_an_error() {
        let raw = json!({"success": false, "result": {"records": []}});
        assert!(meta_result(&raw).is_err());
        assert!(data_records(&raw).is_err());
    }

    #[test]
    fn records_extracted_from_data_result() {
        let raw = json!({
            "success": true,
            "result": {"records": [{"_id": 1, "value": "3.5"}], "total": 1}
        });
        let records = data_records(&raw).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("value"), Some(&json!("3.5")));
    }

    #[test]
    fn missing_result_is_an_error() {
        assert!(data_records(&json!({"success": true})).is_err());
        assert!(meta_result(&json!({"not": "an envelope"})).is_err());
    }

    #[test]
    fn result_without_records_key_is_an_error() {
        // a successful envelope whose result lacks `records` is not data
        let raw = json!({"success": true, "result": {"total": 0}});
        assert!(data_records(&raw).is_err());
    }
}
