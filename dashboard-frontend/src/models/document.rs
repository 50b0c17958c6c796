use super::{Identified, Metadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

wire_enum!(DocumentStatus, "document status", {
    Uploading => "uploading",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size: i64,
    pub storage_key: String,
    pub status: DocumentStatus,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for Document {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Partial update; absent fields are left untouched by the backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DocumentUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Import a remote file by URL instead of uploading bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    #[validate(url)]
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(rename = "mime_type", skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

/// Multipart upload. The bytes are sent as the `file` part.
#[derive(Debug, Clone, Validate)]
pub struct UploadRequest {
    #[validate(length(min = 1, max = 255))]
    pub file_name: String,
    #[validate(length(min = 1))]
    pub content_type: String,
    #[validate(length(min = 1))]
    pub bytes: Vec<u8>,
    pub name: Option<String>,
    pub project_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub download_url: String,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_round_trips_through_str() {
        for status in DocumentStatus::ALL {
            assert_eq!(status.as_str().parse::<DocumentStatus>(), Ok(*status));
        }
        assert!("archived".parse::<DocumentStatus>().is_err());
    }

    #[test]
    fn document_deserializes_from_camel_case() {
        let document: Document = serde_json::from_value(json!({
            "id": "doc-1",
            "userId": "user-1",
            "name": "Q3 report",
            "originalName": "q3.pdf",
            "mimeType": "application/pdf",
            "size": 1024,
            "storageKey": "docs/doc-1",
            "status": "completed",
            "metadata": { "pages": 3 },
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:05:00Z"
        }))
        .unwrap();

        assert_eq!(document.status, DocumentStatus::Completed);
        assert_eq!(document.mime_type, "application/pdf");
        assert!(document.project_id.is_none());
    }

    #[test]
    fn ingest_requires_a_valid_url() {
        let request = IngestRequest {
            url: "not a url".into(),
            name: None,
            project_id: None,
            mime_type: None,
            metadata: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn empty_update_serializes_to_empty_object() {
        let body = serde_json::to_value(DocumentUpdate::default()).unwrap();
        assert_eq!(body, json!({}));
    }
}
