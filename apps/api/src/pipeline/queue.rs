//! Redis-backed job queue: JSON payloads LPUSHed by the upload handler,
//! BRPOPped by the worker. At-least-once delivery is the queue's contract;
//! idempotency lives in the pipeline's COMPLETED short-circuit.

use anyhow::{Context, Result};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

pub const QUEUE_NAME: &str = "resume_processing";
pub const JOB_PROCESS_RESUME: &str = "process_resume";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedJob {
    /// Opaque job id, for log correlation only.
    pub id: String,
    /// Job name; unknown names are logged and dropped by the worker.
    pub name: String,
    pub application_id: Uuid,
}

impl QueuedJob {
    pub fn process_resume(application_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: JOB_PROCESS_RESUME.to_string(),
            application_id,
        }
    }
}

/// Enqueues a job and returns its id.
pub async fn enqueue(redis: &redis::Client, job: &QueuedJob) -> Result<String> {
    let payload = serde_json::to_string(job).context("serializing queue payload")?;
    let mut conn = redis
        .get_multiplexed_async_connection()
        .await
        .context("connecting to Redis")?;
    conn.lpush::<_, _, ()>(QUEUE_NAME, payload)
        .await
        .context("enqueueing job")?;

    info!(
        "Enqueued {} job {} for application {}",
        job.name, job.id, job.application_id
    );
    Ok(job.id.clone())
}
