//! Free-form metadata attached to documents and jobs.
//!
//! The backend only ever stores flat scalar values or string lists here, so
//! the payload is a closed sum type: nested objects and nulls fail to
//! deserialize instead of travelling through the dashboard untyped.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Flag(bool),
    Number(f64),
    Text(String),
    Tags(Vec<String>),
}

pub type Metadata = BTreeMap<String, MetadataValue>;

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Flag(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Number(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_flat_scalars_and_tag_lists() {
        let metadata: Metadata = serde_json::from_value(json!({
            "pages": 12,
            "source": "scanner",
            "ocr": true,
            "tags": ["invoice", "2024"]
        }))
        .unwrap();

        assert_eq!(metadata["pages"], MetadataValue::Number(12.0));
        assert_eq!(metadata["source"], MetadataValue::Text("scanner".into()));
        assert_eq!(metadata["ocr"], MetadataValue::Flag(true));
        assert_eq!(
            metadata["tags"],
            MetadataValue::Tags(vec!["invoice".into(), "2024".into()])
        );
    }

    #[test]
    fn rejects_nested_objects() {
        let result: Result<Metadata, _> =
            serde_json::from_value(json!({ "layout": { "columns": 2 } }));
        assert!(result.is_err());
    }

    #[test]
    fn rejects_null_values() {
        let result: Result<Metadata, _> = serde_json::from_value(json!({ "owner": null }));
        assert!(result.is_err());
    }
}
