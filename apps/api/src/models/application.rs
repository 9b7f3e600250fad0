use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Lifecycle of an application. Transitions only move forward:
/// PENDING → QUEUED → PROCESSING → COMPLETED | FAILED. The sole backward
/// move permitted is any in-flight state → FAILED; a COMPLETED row is never
/// reprocessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "application_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ApplicationStatus {
    Pending,
    Queued,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Queued => "QUEUED",
            ApplicationStatus::Processing => "PROCESSING",
            ApplicationStatus::Completed => "COMPLETED",
            ApplicationStatus::Failed => "FAILED",
        };
        f.write_str(s)
    }
}

/// One uploaded resume scored against one job post. Mutated exclusively by
/// the processing pipeline after upload; never deleted by it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationRow {
    pub id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_post_id: Uuid,
    pub original_filename: String,
    /// S3 object key; set once the document is durably stored.
    pub s3_path: Option<String>,
    pub status: ApplicationStatus,
    pub seniority_level: Option<String>,
    /// Structured profile produced by LLM normalization.
    pub extracted_data: Option<Value>,
    /// Resume embedding; always EMBEDDING_DIM floats when present.
    pub embedded_value: Option<Value>,
    /// Similarity sub-scores + qualitative evaluation + overall score.
    pub analysis: Option<Value>,
    /// Append-only log of failure causes across retries and stages.
    pub failed_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}
