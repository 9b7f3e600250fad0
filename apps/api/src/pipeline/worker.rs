//! Background worker: dequeues processing jobs and drives the pipeline.
//!
//! One job is processed at a time per worker; the queue sequences
//! applications, and the pipeline's claim + COMPLETED short-circuit absorb
//! duplicate deliveries.

use std::sync::Arc;

use redis::AsyncCommands;
use tracing::{error, info, warn};

use super::queue::{QueuedJob, JOB_PROCESS_RESUME, QUEUE_NAME};
use super::Pipeline;

/// Seconds BRPOP blocks before returning empty; keeps the loop responsive
/// to shutdown without busy-waiting.
const DEQUEUE_TIMEOUT_SECS: f64 = 5.0;

/// Runs the dequeue loop forever. Connection and per-job failures are
/// logged and the loop continues; only caller cancellation stops it.
pub async fn run(redis: redis::Client, pipeline: Arc<Pipeline>) {
    info!("Worker started, listening on queue '{QUEUE_NAME}'");

    loop {
        let mut conn = match redis.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(e) => {
                error!("Worker failed to connect to Redis: {e}");
                tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                continue;
            }
        };

        loop {
            let popped: Result<Option<(String, String)>, redis::RedisError> =
                conn.brpop(QUEUE_NAME, DEQUEUE_TIMEOUT_SECS).await;

            match popped {
                Ok(Some((_queue, payload))) => handle_payload(&pipeline, &payload).await,
                Ok(None) => {} // timeout, poll again
                Err(e) => {
                    error!("Worker dequeue error: {e}; reconnecting");
                    break;
                }
            }
        }
    }
}

async fn handle_payload(pipeline: &Pipeline, payload: &str) {
    let job: QueuedJob = match serde_json::from_str(payload) {
        Ok(job) => job,
        Err(e) => {
            warn!("Dropping malformed queue payload: {e}");
            return;
        }
    };

    if job.name != JOB_PROCESS_RESUME {
        warn!("Unknown job type '{}', dropping job {}", job.name, job.id);
        return;
    }

    info!("Processing job {} (application {})", job.id, job.application_id);
    pipeline.process(job.application_id).await;
    info!("Finished job {}", job.id);
}
