use super::{Identified, Metadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

wire_enum!(JobStatus, "job status", {
    Pending => "pending",
    Processing => "processing",
    Completed => "completed",
    Failed => "failed",
    Cancelled => "cancelled",
});

wire_enum!(JobType, "job type", {
    AnalyzeStructure => "analyze_structure",
    ExtractText => "extract_text",
    ParseDocument => "parse_document",
});

wire_enum!(JobSource, "job source", {
    Upload => "upload",
    Url => "url",
    S3 => "s3",
});

impl JobStatus {
    /// Pending and processing jobs are still moving through the pipeline.
    pub fn is_active(&self) -> bool {
        matches!(self, JobStatus::Pending | JobStatus::Processing)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(rename = "type")]
    pub job_type: JobType,
    pub status: JobStatus,
    pub source: JobSource,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub options: Metadata,
    #[serde(default)]
    pub error: Option<String>,
    pub attempts: u32,
    pub max_attempts: u32,
    /// Completion percentage. The backend may send fractions.
    pub progress: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Identified for Job {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobCreate {
    #[validate(length(min = 1))]
    pub document_id: String,
    #[serde(rename = "type")]
    pub job_type: JobType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub options: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Metadata>,
}

/// Queue a parse of an already-uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ParseJobRequest {
    #[validate(length(min = 1))]
    pub document_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default)]
    pub options: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_type_uses_snake_case_wire_names() {
        assert_eq!(JobType::AnalyzeStructure.to_string(), "analyze_structure");
        assert_eq!("extract_text".parse::<JobType>(), Ok(JobType::ExtractText));
        assert!("transcode".parse::<JobType>().is_err());
    }

    #[test]
    fn only_pending_and_processing_are_active() {
        let active: Vec<_> = JobStatus::ALL.iter().filter(|s| s.is_active()).collect();
        assert_eq!(active, vec![&JobStatus::Pending, &JobStatus::Processing]);
    }

    #[test]
    fn job_deserializes_type_field() {
        let job: Job = serde_json::from_value(json!({
            "id": "job-1",
            "userId": "user-1",
            "documentId": "doc-1",
            "type": "parse_document",
            "status": "processing",
            "source": "upload",
            "attempts": 1,
            "maxAttempts": 3,
            "progress": 40,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:01:00Z",
            "startedAt": "2024-05-01T10:00:30Z"
        }))
        .unwrap();

        assert_eq!(job.job_type, JobType::ParseDocument);
        assert!(job.status.is_active());
        assert!(job.completed_at.is_none());
        assert_eq!(job.progress, 40.0);
    }

    #[test]
    fn fractional_progress_is_accepted() {
        let job: Job = serde_json::from_value(json!({
            "id": "job-2",
            "userId": "user-1",
            "type": "extract_text",
            "status": "processing",
            "source": "url",
            "attempts": 1,
            "maxAttempts": 3,
            "progress": 42.5,
            "createdAt": "2024-05-01T10:00:00Z",
            "updatedAt": "2024-05-01T10:01:00Z"
        }))
        .unwrap();

        assert_eq!(job.progress, 42.5);
        assert_eq!(job.source, JobSource::Url);
    }
}
