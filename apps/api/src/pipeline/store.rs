//! Persistence seams for the pipeline. The state machine only ever talks to
//! these traits; Postgres implementations live alongside so tests can swap
//! in in-memory doubles.

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::models::job_post::JobPostRow;

/// How the worker claims an application before processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimMode {
    /// Set PROCESSING unconditionally. Two duplicate queue deliveries can
    /// both claim the same row; the COMPLETED short-circuit is the only
    /// defense. This is the reference behavior.
    Unconditional,
    /// Compare-and-swap: only QUEUED or FAILED rows can move to PROCESSING,
    /// giving an at-most-once guarantee per delivery at the storage layer.
    CasQueuedOrFailed,
}

#[async_trait]
pub trait ApplicationStore: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Option<ApplicationRow>>;

    /// Attempts the transition to PROCESSING; returns false when the claim
    /// loses (CAS mode) or the row does not exist.
    async fn claim_processing(&self, id: Uuid, mode: ClaimMode) -> Result<bool>;

    /// Sets FAILED and appends `reason` to failed_reason. Appending, never
    /// overwriting, preserves the failure history across retries.
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()>;

    async fn save_extracted_data(&self, id: Uuid, data: &Value) -> Result<()>;

    async fn save_embedding(&self, id: Uuid, embedding: &Value) -> Result<()>;

    /// Persists the analysis document and marks COMPLETED.
    async fn complete(&self, id: Uuid, analysis: &Value) -> Result<()>;
}

#[async_trait]
pub trait JobPostStore: Send + Sync {
    async fn fetch(&self, id: Uuid) -> Result<Option<JobPostRow>>;

    /// Single atomic increment, guarded at the storage layer. Returns false
    /// when the post no longer exists.
    async fn increment_applicant_count(&self, id: Uuid) -> Result<bool>;
}

pub struct PgApplicationStore {
    pool: PgPool,
}

impl PgApplicationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const APPLICATION_COLUMNS: &str = "id, candidate_name, candidate_email, job_post_id, \
     original_filename, s3_path, status, seniority_level, extracted_data, \
     embedded_value, analysis, failed_reason, created_at, updated_at";

#[async_trait]
impl ApplicationStore for PgApplicationStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<ApplicationRow>> {
        let row = sqlx::query_as::<_, ApplicationRow>(&format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn claim_processing(&self, id: Uuid, mode: ClaimMode) -> Result<bool> {
        let query = match mode {
            ClaimMode::Unconditional => {
                "UPDATE applications SET status = $2, updated_at = now() WHERE id = $1"
            }
            ClaimMode::CasQueuedOrFailed => {
                "UPDATE applications SET status = $2, updated_at = now() \
                 WHERE id = $1 AND status IN ('QUEUED', 'FAILED')"
            }
        };
        let result = sqlx::query(query)
            .bind(id)
            .bind(ApplicationStatus::Processing)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
        sqlx::query(
            "UPDATE applications SET status = $3, updated_at = now(), \
             failed_reason = CASE \
                 WHEN failed_reason IS NULL OR failed_reason = '' THEN $2 \
                 ELSE failed_reason || chr(10) || $2 \
             END \
             WHERE id = $1",
        )
        .bind(id)
        .bind(reason)
        .bind(ApplicationStatus::Failed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn save_extracted_data(&self, id: Uuid, data: &Value) -> Result<()> {
        sqlx::query("UPDATE applications SET extracted_data = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(data)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn save_embedding(&self, id: Uuid, embedding: &Value) -> Result<()> {
        sqlx::query("UPDATE applications SET embedded_value = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(embedding)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete(&self, id: Uuid, analysis: &Value) -> Result<()> {
        sqlx::query(
            "UPDATE applications SET analysis = $2, status = $3, updated_at = now() WHERE id = $1",
        )
        .bind(id)
        .bind(analysis)
        .bind(ApplicationStatus::Completed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

pub struct PgJobPostStore {
    pool: PgPool,
}

impl PgJobPostStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobPostStore for PgJobPostStore {
    async fn fetch(&self, id: Uuid) -> Result<Option<JobPostRow>> {
        let row = sqlx::query_as::<_, JobPostRow>(
            "SELECT id, title, description, requirements, responsibilities, \
             description_embedding, requirements_embedding, responsibilities_embedding, \
             applicant_count \
             FROM job_posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn increment_applicant_count(&self, id: Uuid) -> Result<bool> {
        let result =
            sqlx::query("UPDATE job_posts SET applicant_count = applicant_count + 1 WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
