//! Resume API: upload a resume against a job post, and check processing
//! status. The upload handler only stores and enqueues; all heavy work
//! happens in the background pipeline.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, ApplicationStatus};
use crate::pipeline::queue::{self, QueuedJob};
use crate::services::storage;
use crate::state::AppState;

/// Uploads above this size are rejected before touching storage.
pub(crate) const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
pub struct ResumeCreateResponse {
    pub application_id: Uuid,
    pub job_post_id: Uuid,
    pub status: ApplicationStatus,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ResumeStatusResponse {
    pub application_id: Uuid,
    pub candidate_name: String,
    pub candidate_email: String,
    pub job_post_id: Uuid,
    pub status: ApplicationStatus,
    pub extracted_data: Option<Value>,
    pub analysis: Option<Value>,
    pub failed_reason: Option<String>,
}

#[derive(Debug, Default)]
struct UploadForm {
    file: Option<(String, Bytes)>,
    candidate_name: Option<String>,
    candidate_email: Option<String>,
    job_post_id: Option<Uuid>,
    seniority_level: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        match field.name().unwrap_or_default() {
            "file" => {
                let filename = field
                    .file_name()
                    .map(str::to_string)
                    .ok_or_else(|| AppError::Validation("file field needs a filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("failed to read file: {e}")))?;
                form.file = Some((filename, bytes));
            }
            "candidate_name" => form.candidate_name = Some(read_text(field).await?),
            "candidate_email" => form.candidate_email = Some(read_text(field).await?),
            "job_post_id" => {
                let raw = read_text(field).await?;
                let id = raw
                    .parse::<Uuid>()
                    .map_err(|_| AppError::Validation("job_post_id must be a UUID".into()))?;
                form.job_post_id = Some(id);
            }
            "seniority_level" => form.seniority_level = Some(read_text(field).await?),
            other => {
                warn!("Ignoring unexpected multipart field '{other}'");
            }
        }
    }
    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("failed to read field: {e}")))
}

/// Rejects anything that is not plausibly a PDF before it reaches storage.
fn validate_upload(filename: &str, bytes: &Bytes) -> Result<(), AppError> {
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(AppError::Validation(
            "only PDF resumes are accepted".to_string(),
        ));
    }
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(format!(
            "file exceeds the {MAX_UPLOAD_BYTES} byte limit"
        )));
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(AppError::Validation(
            "file does not look like a PDF".to_string(),
        ));
    }
    Ok(())
}

/// POST /api/v1/resumes
///
/// Accepts the resume, stores it, enqueues processing, and returns 202.
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ResumeCreateResponse>), AppError> {
    let form = read_form(multipart).await?;

    let (filename, bytes) = form
        .file
        .ok_or_else(|| AppError::Validation("missing 'file' field".into()))?;
    let candidate_name = form
        .candidate_name
        .ok_or_else(|| AppError::Validation("missing 'candidate_name' field".into()))?;
    let candidate_email = form
        .candidate_email
        .ok_or_else(|| AppError::Validation("missing 'candidate_email' field".into()))?;
    let job_post_id = form
        .job_post_id
        .ok_or_else(|| AppError::Validation("missing 'job_post_id' field".into()))?;

    validate_upload(&filename, &bytes)?;

    info!("Resume upload requested for candidate {candidate_email}");

    let application_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO applications \
         (id, candidate_name, candidate_email, job_post_id, original_filename, \
          status, seniority_level, created_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, now())",
    )
    .bind(application_id)
    .bind(&candidate_name)
    .bind(&candidate_email)
    .bind(job_post_id)
    .bind(&filename)
    .bind(ApplicationStatus::Pending)
    .bind(&form.seniority_level)
    .execute(&state.db)
    .await?;

    let key = storage::resume_key(&filename);
    storage::put_resume(&state.s3, &state.config.s3_bucket, &key, bytes)
        .await
        .map_err(|e| AppError::Storage(e.to_string()))?;

    // Durably stored: record the locator and mark QUEUED before enqueueing.
    sqlx::query("UPDATE applications SET s3_path = $2, status = $3, updated_at = now() WHERE id = $1")
        .bind(application_id)
        .bind(&key)
        .bind(ApplicationStatus::Queued)
        .execute(&state.db)
        .await?;

    let job = QueuedJob::process_resume(application_id);
    queue::enqueue(&state.redis, &job)
        .await
        .map_err(|e| AppError::Queue(e.to_string()))?;

    info!("Resume upload job created with application id {application_id}");

    Ok((
        StatusCode::ACCEPTED,
        Json(ResumeCreateResponse {
            application_id,
            job_post_id,
            status: ApplicationStatus::Queued,
            message: "Resume accepted and is being processed in the background.".to_string(),
        }),
    ))
}

/// GET /api/v1/resumes/:id
pub async fn handle_status(
    State(state): State<AppState>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<ResumeStatusResponse>, AppError> {
    let row = sqlx::query_as::<_, ApplicationRow>(
        "SELECT id, candidate_name, candidate_email, job_post_id, original_filename, \
         s3_path, status, seniority_level, extracted_data, embedded_value, analysis, \
         failed_reason, created_at, updated_at \
         FROM applications WHERE id = $1",
    )
    .bind(application_id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("application {application_id} not found")))?;

    Ok(Json(ResumeStatusResponse {
        application_id: row.id,
        candidate_name: row.candidate_name,
        candidate_email: row.candidate_email,
        job_post_id: row.job_post_id,
        status: row.status,
        extracted_data: row.extracted_data,
        analysis: row.analysis,
        failed_reason: row.failed_reason,
    }))
}
