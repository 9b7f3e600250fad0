//! OCR collaborator: Textract document analysis with a single polling loop.
//!
//! The engine seam is a trait so the pipeline (and its tests) never touch
//! the SDK directly; `collect_blocks` is the one place the polling knobs
//! from `PollConfig` are consumed.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use aws_sdk_textract::types::{DocumentLocation, FeatureType, JobStatus, S3Object};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::PollConfig;
use crate::layout::geometry::{BoundingBox, Geometry, PolygonPoint, RawTextFragment};

/// Delay between paginated result fetches once a job has succeeded.
const PAGE_FETCH_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("failed to start OCR job: {0}")]
    Start(String),

    #[error("transient OCR poll failure: {0}")]
    Poll(String),

    #[error("OCR job failed: {0}")]
    JobFailed(String),

    #[error("timed out waiting for OCR job to complete")]
    Timeout,
}

/// Terminal-or-not status of an OCR job at one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrJobStatus {
    InProgress,
    Succeeded,
    Failed(String),
}

/// One poll response: current status, any blocks carried on this page, and
/// the pagination token for the next page (absent on the last page).
#[derive(Debug)]
pub struct OcrPoll {
    pub status: OcrJobStatus,
    pub blocks: Vec<RawTextFragment>,
    pub next_token: Option<String>,
}

/// OCR engine seam. `start` returns an opaque job handle; `poll` reports
/// status and, once succeeded, pages of raw blocks.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn start(&self, bucket: &str, key: &str) -> Result<String, OcrError>;
    async fn poll(&self, job_handle: &str, next_token: Option<String>)
        -> Result<OcrPoll, OcrError>;
}

/// Polls until the job reaches a terminal status, then drains all result
/// pages. Transient poll failures are retried up to
/// `poll.max_transient_retries` with a short backoff before propagating; a
/// FAILED job status and the `poll.max_wait` wall clock are fatal. A
/// pagination failure after success returns the blocks collected so far.
pub async fn collect_blocks(
    engine: &dyn OcrEngine,
    job_handle: &str,
    poll: &PollConfig,
) -> Result<Vec<RawTextFragment>, OcrError> {
    let started = Instant::now();
    let transient_backoff = poll.poll_interval.min(Duration::from_secs(2));
    let mut transient_failures: u32 = 0;

    let first_page = loop {
        let response = match engine.poll(job_handle, None).await {
            Ok(r) => r,
            Err(OcrError::Poll(message)) => {
                transient_failures += 1;
                warn!(
                    "Temporary error polling OCR job (attempt {transient_failures}): {message}"
                );
                if transient_failures >= poll.max_transient_retries {
                    return Err(OcrError::Poll(message));
                }
                tokio::time::sleep(transient_backoff).await;
                continue;
            }
            Err(other) => return Err(other),
        };

        match response.status {
            OcrJobStatus::Succeeded => break response,
            OcrJobStatus::Failed(message) => return Err(OcrError::JobFailed(message)),
            OcrJobStatus::InProgress => {
                if started.elapsed() >= poll.max_wait {
                    return Err(OcrError::Timeout);
                }
                tokio::time::sleep(poll.poll_interval).await;
            }
        }
    };

    let mut blocks = first_page.blocks;
    let mut next_token = first_page.next_token;
    while let Some(token) = next_token {
        tokio::time::sleep(PAGE_FETCH_DELAY).await;
        match engine.poll(job_handle, Some(token)).await {
            Ok(page) => {
                blocks.extend(page.blocks);
                next_token = page.next_token;
            }
            Err(e) => {
                warn!("Failed to fetch additional OCR result pages: {e}");
                break;
            }
        }
    }

    info!("OCR job succeeded with {} blocks", blocks.len());
    Ok(blocks)
}

/// Production engine backed by Textract LAYOUT+FORMS analysis.
#[derive(Clone)]
pub struct TextractOcr {
    client: aws_sdk_textract::Client,
}

impl TextractOcr {
    pub fn new(client: aws_sdk_textract::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OcrEngine for TextractOcr {
    async fn start(&self, bucket: &str, key: &str) -> Result<String, OcrError> {
        let location = DocumentLocation::builder()
            .s3_object(S3Object::builder().bucket(bucket).name(key).build())
            .build();

        let response = self
            .client
            .start_document_analysis()
            .document_location(location)
            .feature_types(FeatureType::Layout)
            .feature_types(FeatureType::Forms)
            .send()
            .await
            .map_err(|e| OcrError::Start(e.to_string()))?;

        response
            .job_id()
            .map(str::to_string)
            .ok_or_else(|| OcrError::Start("Textract did not return a job id".to_string()))
    }

    async fn poll(
        &self,
        job_handle: &str,
        next_token: Option<String>,
    ) -> Result<OcrPoll, OcrError> {
        let response = self
            .client
            .get_document_analysis()
            .job_id(job_handle)
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| OcrError::Poll(e.to_string()))?;

        let status = match response.job_status() {
            Some(JobStatus::Succeeded) => OcrJobStatus::Succeeded,
            Some(JobStatus::Failed) => OcrJobStatus::Failed(
                response
                    .status_message()
                    .unwrap_or("no status message")
                    .to_string(),
            ),
            _ => OcrJobStatus::InProgress,
        };

        let blocks = response
            .blocks()
            .iter()
            .map(convert_block)
            .collect::<Vec<_>>();

        Ok(OcrPoll {
            status,
            blocks,
            next_token: response.next_token().map(str::to_string),
        })
    }
}

fn convert_block(block: &aws_sdk_textract::types::Block) -> RawTextFragment {
    let geometry = block.geometry().map(|g| Geometry {
        bounding_box: g.bounding_box().map(|b| BoundingBox {
            top: Some(b.top() as f64),
            left: Some(b.left() as f64),
            width: Some(b.width() as f64),
            height: Some(b.height() as f64),
        }),
        polygon: {
            let points = g.polygon();
            if points.is_empty() {
                None
            } else {
                Some(
                    points
                        .iter()
                        .map(|p| PolygonPoint {
                            x: Some(p.x() as f64),
                            y: Some(p.y() as f64),
                        })
                        .collect(),
                )
            }
        },
    });

    RawTextFragment {
        block_type: block
            .block_type()
            .map(|t| t.as_str().to_string())
            .unwrap_or_default(),
        text: block.text().map(str::to_string),
        geometry,
        page: block.page().map(|p| p.max(1) as u32),
        confidence: block.confidence().map(|c| c as f64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Scripted engine: pops one canned poll outcome per call.
    struct ScriptedEngine {
        script: Mutex<Vec<Result<OcrPoll, OcrError>>>,
    }

    impl ScriptedEngine {
        fn new(mut script: Vec<Result<OcrPoll, OcrError>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for ScriptedEngine {
        async fn start(&self, _bucket: &str, _key: &str) -> Result<String, OcrError> {
            Ok("job-1".to_string())
        }

        async fn poll(
            &self,
            _job_handle: &str,
            _next_token: Option<String>,
        ) -> Result<OcrPoll, OcrError> {
            self.script
                .lock()
                .expect("script lock")
                .pop()
                .unwrap_or(Err(OcrError::Poll("script exhausted".to_string())))
        }
    }

    fn fast_poll() -> PollConfig {
        PollConfig {
            poll_interval: Duration::from_millis(1),
            max_wait: Duration::from_millis(50),
            max_transient_retries: 3,
        }
    }

    fn line(text: &str) -> RawTextFragment {
        RawTextFragment {
            block_type: "LINE".to_string(),
            text: Some(text.to_string()),
            ..Default::default()
        }
    }

    fn page(status: OcrJobStatus, texts: &[&str], next: Option<&str>) -> OcrPoll {
        OcrPoll {
            status,
            blocks: texts.iter().map(|t| line(t)).collect(),
            next_token: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn test_polls_until_succeeded_then_paginates() {
        let engine = ScriptedEngine::new(vec![
            Ok(page(OcrJobStatus::InProgress, &[], None)),
            Ok(page(OcrJobStatus::Succeeded, &["a"], Some("t1"))),
            Ok(page(OcrJobStatus::Succeeded, &["b"], None)),
        ]);
        let blocks = collect_blocks(&engine, "job-1", &fast_poll())
            .await
            .expect("blocks");
        let texts: Vec<_> = blocks.iter().filter_map(|b| b.text.as_deref()).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_transient_errors_retried_then_recovered() {
        let engine = ScriptedEngine::new(vec![
            Err(OcrError::Poll("hiccup 1".to_string())),
            Err(OcrError::Poll("hiccup 2".to_string())),
            Ok(page(OcrJobStatus::Succeeded, &["a"], None)),
        ]);
        let blocks = collect_blocks(&engine, "job-1", &fast_poll())
            .await
            .expect("blocks");
        assert_eq!(blocks.len(), 1);
    }

    #[tokio::test]
    async fn test_transient_errors_exhaust_retry_budget() {
        let engine = ScriptedEngine::new(vec![
            Err(OcrError::Poll("down".to_string())),
            Err(OcrError::Poll("down".to_string())),
            Err(OcrError::Poll("down".to_string())),
        ]);
        let result = collect_blocks(&engine, "job-1", &fast_poll()).await;
        assert!(matches!(result, Err(OcrError::Poll(_))));
    }

    #[tokio::test]
    async fn test_failed_job_is_fatal() {
        let engine = ScriptedEngine::new(vec![Ok(page(
            OcrJobStatus::Failed("bad document".to_string()),
            &[],
            None,
        ))]);
        let result = collect_blocks(&engine, "job-1", &fast_poll()).await;
        match result {
            Err(OcrError::JobFailed(message)) => assert_eq!(message, "bad document"),
            other => panic!("expected JobFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wall_clock_timeout() {
        // Script never terminates; the deadline must.
        let engine = ScriptedEngine::new(
            (0..1000)
                .map(|_| Ok(page(OcrJobStatus::InProgress, &[], None)))
                .collect(),
        );
        let poll = PollConfig {
            poll_interval: Duration::from_millis(2),
            max_wait: Duration::from_millis(10),
            max_transient_retries: 3,
        };
        let result = collect_blocks(&engine, "job-1", &poll).await;
        assert!(matches!(result, Err(OcrError::Timeout)));
    }

    #[tokio::test]
    async fn test_pagination_failure_keeps_partial_blocks() {
        let engine = ScriptedEngine::new(vec![
            Ok(page(OcrJobStatus::Succeeded, &["a"], Some("t1"))),
            Err(OcrError::Poll("page fetch failed".to_string())),
        ]);
        let blocks = collect_blocks(&engine, "job-1", &fast_poll())
            .await
            .expect("blocks");
        assert_eq!(blocks.len(), 1);
    }
}
