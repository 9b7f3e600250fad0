//! Per-application processing state machine.
//!
//! One invocation drives one application through OCR, layout
//! reconstruction, normalization, embedding, and scoring. Every stage is
//! bounded by its own failure handling: a fatal stage failure appends a
//! structured reason to failed_reason, marks FAILED, and aborts; nothing
//! after a failed stage runs. The pipeline never raises past its own
//! boundary — the application row is the only externally observable
//! failure signal.

pub mod queue;
pub mod store;
pub mod worker;

use std::fmt::Display;
use std::sync::Arc;

use anyhow::Result;
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::PollConfig;
use crate::layout;
use crate::models::application::ApplicationStatus;
use crate::services::embedding::{Embedder, EmbeddingTaskType, EmbeddingTitle};
use crate::services::evaluation::Evaluator;
use crate::services::normalizer::{NormalizeOutcome, Normalizer};
use crate::services::ocr::{self, OcrEngine};
use crate::services::scoring;

use store::{ApplicationStore, ClaimMode, JobPostStore};

/// All collaborators injected at construction; lifecycle is the caller's
/// responsibility. No module-level fallback clients.
pub struct Pipeline {
    applications: Arc<dyn ApplicationStore>,
    job_posts: Arc<dyn JobPostStore>,
    ocr: Arc<dyn OcrEngine>,
    embedder: Arc<dyn Embedder>,
    normalizer: Arc<dyn Normalizer>,
    evaluator: Arc<dyn Evaluator>,
    s3_bucket: String,
    poll: PollConfig,
    claim_mode: ClaimMode,
}

/// Outcome of the inner run: either the pipeline handled the application
/// (including recording a stage failure) or it deliberately did nothing.
enum RunEnd {
    Done,
    Skipped,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        job_posts: Arc<dyn JobPostStore>,
        ocr: Arc<dyn OcrEngine>,
        embedder: Arc<dyn Embedder>,
        normalizer: Arc<dyn Normalizer>,
        evaluator: Arc<dyn Evaluator>,
        s3_bucket: String,
        poll: PollConfig,
        claim_mode: ClaimMode,
    ) -> Self {
        Self {
            applications,
            job_posts,
            ocr,
            embedder,
            normalizer,
            evaluator,
            s3_bucket,
            poll,
            claim_mode,
        }
    }

    /// Entry point for the worker. Never returns an error: any failure the
    /// stages did not capture is recorded on the application row by the
    /// catch-all handler.
    pub async fn process(&self, application_id: Uuid) {
        if let Err(e) = self.run(application_id).await {
            error!("Unexpected error processing application {application_id}: {e:#}");
            self.record_uncaught(application_id, &e).await;
        }
    }

    async fn run(&self, application_id: Uuid) -> Result<RunEnd> {
        let Some(app) = self.applications.fetch(application_id).await? else {
            warn!("No application found with id {application_id}");
            return Ok(RunEnd::Skipped);
        };

        // Duplicate queue deliveries must not clobber a finished row.
        if app.status == ApplicationStatus::Completed {
            info!("Application {application_id} already completed; skipping");
            return Ok(RunEnd::Skipped);
        }

        if !self
            .applications
            .claim_processing(application_id, self.claim_mode)
            .await?
        {
            info!("Application {application_id} claim lost; skipping");
            return Ok(RunEnd::Skipped);
        }

        info!(
            "Processing application {application_id} for job post {}",
            app.job_post_id
        );

        // Stage 1: job post with all three embeddings.
        let job_post = match self.job_posts.fetch(app.job_post_id).await {
            Ok(Some(post)) => post,
            Ok(None) => {
                return self
                    .abort(
                        application_id,
                        "Failed to fetch job post",
                        format!("job post {} not found", app.job_post_id),
                    )
                    .await;
            }
            Err(e) => {
                return self
                    .abort(application_id, "Failed to fetch job post", e)
                    .await;
            }
        };
        let Some(job_embeddings) = job_post.embeddings() else {
            return self
                .abort(
                    application_id,
                    "Failed to fetch job post",
                    "job post embeddings not found",
                )
                .await;
        };

        // Stage 2: start the OCR job against the stored document.
        let Some(s3_path) = app.s3_path.as_deref() else {
            return self
                .abort(
                    application_id,
                    "Failed to start OCR job",
                    "S3 path is missing for this application",
                )
                .await;
        };
        let job_handle = match self.ocr.start(&self.s3_bucket, s3_path).await {
            Ok(handle) => handle,
            Err(e) => return self.abort(application_id, "Failed to start OCR job", e).await,
        };
        info!("OCR job started: handle={job_handle} for s3_path={s3_path}");

        // Stage 3: poll to terminal status and drain result pages.
        let raw_blocks = match ocr::collect_blocks(self.ocr.as_ref(), &job_handle, &self.poll).await
        {
            Ok(blocks) => blocks,
            Err(e) => return self.abort(application_id, "Failed OCR processing", e).await,
        };

        // Stage 4: layout reconstruction, off the async scheduler.
        let grouped = match layout::group_blocking(raw_blocks).await {
            Ok(grouped) => grouped,
            Err(e) => return self.abort(application_id, "Grouping failed", e).await,
        };
        info!("Grouping complete: {} sections", grouped.len());

        // Stage 5: LLM normalization. The normalizer takes the string-keyed
        // rendering of the section mapping; a refusal document is fatal and
        // is captured verbatim, never treated as partial data.
        let sections = layout::string_keyed(&grouped);
        let profile = match self.normalizer.normalize(&sections).await {
            Ok(NormalizeOutcome::Structured(profile)) => profile,
            Ok(refused @ NormalizeOutcome::Refused { .. }) => {
                let document = serde_json::to_string(&refused)
                    .unwrap_or_else(|_| "unserializable error document".to_string());
                return self
                    .abort(application_id, "Profile normalization failed", document)
                    .await;
            }
            Err(e) => {
                return self
                    .abort(application_id, "Profile normalization failed", e)
                    .await;
            }
        };
        let profile_value = serde_json::to_value(&profile)?;
        self.applications
            .save_extracted_data(application_id, &profile_value)
            .await?;

        // Stage 6: embed the structured profile.
        let embedding = match self
            .embedder
            .embed(
                &profile.embedding_lines(),
                EmbeddingTaskType::SemanticSimilarity,
                EmbeddingTitle::ApplicantResume,
            )
            .await
        {
            Ok(Some(embedding)) => embedding,
            Ok(None) => {
                return self
                    .abort(
                        application_id,
                        "Embedding creation failed",
                        "no embedding returned",
                    )
                    .await;
            }
            Err(e) => {
                return self
                    .abort(application_id, "Embedding creation failed", e)
                    .await;
            }
        };
        self.applications
            .save_embedding(application_id, &serde_json::to_value(&embedding)?)
            .await?;

        // Stage 7: three similarity axes plus the qualitative evaluation,
        // combined into one weighted overall score.
        let analysis = match self
            .score(&embedding, &job_embeddings, &profile, &job_post)
            .await
        {
            Ok(analysis) => analysis,
            Err(e) => {
                return self
                    .abort(application_id, "Similarity scoring failed", e)
                    .await;
            }
        };

        // Stage 8: best-effort side effect; never fails the application.
        match self.job_posts.increment_applicant_count(app.job_post_id).await {
            Ok(true) => {}
            Ok(false) => warn!("Applicant count not incremented: job post {} gone", app.job_post_id),
            Err(e) => warn!("Failed to increment applicant count: {e:#}"),
        }

        // Stage 9: persist the analysis and finish.
        self.applications.complete(application_id, &analysis).await?;
        info!("Application {application_id} fully completed");
        Ok(RunEnd::Done)
    }

    async fn score(
        &self,
        embedding: &[f32],
        job: &crate::models::job_post::JobPostEmbeddings,
        profile: &crate::models::profile::ResumeProfile,
        job_post: &crate::models::job_post::JobPostRow,
    ) -> Result<serde_json::Value> {
        let description = scoring::calculate_score(embedding, &job.description)?;
        let requirements = scoring::calculate_score(embedding, &job.requirements)?;
        let responsibilities = scoring::calculate_score(embedding, &job.responsibilities)?;

        let evaluation = self.evaluator.evaluate(profile, job_post).await?;
        let overall = scoring::overall_score(
            description,
            requirements,
            responsibilities,
            evaluation.score,
            0.0,
        );

        info!("Scoring complete: overall={overall:.2}");

        Ok(json!({
            "similarity_scores": {
                "description": description,
                "requirements": requirements,
                "responsibilities": responsibilities,
            },
            "evaluation": evaluation,
            "overall_score": overall,
        }))
    }

    /// Records a fatal stage failure and stops the pipeline for this
    /// application.
    async fn abort(
        &self,
        application_id: Uuid,
        stage: &str,
        detail: impl Display,
    ) -> Result<RunEnd> {
        let reason = format!("{stage}: {detail}");
        error!("Application {application_id} failed: {reason}");
        self.applications
            .mark_failed(application_id, &reason)
            .await?;
        Ok(RunEnd::Done)
    }

    /// Final catch-all: re-fetches the row and, only if it is not already
    /// COMPLETED, appends the error text and marks FAILED.
    async fn record_uncaught(&self, application_id: Uuid, e: &anyhow::Error) {
        let err_text = serde_json::to_string(&json!({ "error": e.to_string() }))
            .unwrap_or_else(|_| e.to_string());
        match self.applications.fetch(application_id).await {
            Ok(Some(app)) if app.status != ApplicationStatus::Completed => {
                if let Err(mark_err) = self
                    .applications
                    .mark_failed(application_id, &err_text)
                    .await
                {
                    error!(
                        "Failed to mark application {application_id} as FAILED: {mark_err:#}"
                    );
                }
            }
            Ok(_) => {}
            Err(fetch_err) => {
                error!("Failed to re-fetch application {application_id}: {fetch_err:#}");
            }
        }
    }
}

/// Convenience constructor for the production wiring.
pub fn production_pipeline(
    pool: sqlx::PgPool,
    textract: aws_sdk_textract::Client,
    llm: crate::llm_client::LlmClient,
    gemini_api_key: String,
    s3_bucket: String,
    poll: PollConfig,
    strict_claim: bool,
) -> Pipeline {
    let claim_mode = if strict_claim {
        ClaimMode::CasQueuedOrFailed
    } else {
        ClaimMode::Unconditional
    };
    Pipeline::new(
        Arc::new(store::PgApplicationStore::new(pool.clone())),
        Arc::new(store::PgJobPostStore::new(pool)),
        Arc::new(crate::services::ocr::TextractOcr::new(textract)),
        Arc::new(crate::services::embedding::GeminiEmbedder::new(
            gemini_api_key,
        )),
        Arc::new(crate::services::normalizer::LlmNormalizer::new(llm.clone())),
        Arc::new(crate::services::evaluation::LlmEvaluator::new(llm)),
        s3_bucket,
        poll,
        claim_mode,
    )
}

#[cfg(test)]
mod tests {
    use super::store::{ApplicationStore, ClaimMode, JobPostStore};
    use super::*;
    use crate::layout::geometry::{BoundingBox, Geometry, RawTextFragment};
    use crate::models::application::ApplicationRow;
    use crate::models::job_post::JobPostRow;
    use crate::models::profile::{AtsEvaluation, ResumeProfile};
    use crate::services::embedding::EmbeddingError;
    use crate::services::normalizer::NormalizeError;
    use crate::services::ocr::{OcrError, OcrJobStatus, OcrPoll};
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    struct MemoryApplications {
        rows: Mutex<std::collections::HashMap<Uuid, ApplicationRow>>,
    }

    impl MemoryApplications {
        fn with(app: ApplicationRow) -> Arc<Self> {
            let mut rows = std::collections::HashMap::new();
            rows.insert(app.id, app);
            Arc::new(Self {
                rows: Mutex::new(rows),
            })
        }

        fn get(&self, id: Uuid) -> ApplicationRow {
            self.rows.lock().expect("rows").get(&id).cloned().expect("row")
        }
    }

    #[async_trait]
    impl ApplicationStore for MemoryApplications {
        async fn fetch(&self, id: Uuid) -> Result<Option<ApplicationRow>> {
            Ok(self.rows.lock().expect("rows").get(&id).cloned())
        }

        async fn claim_processing(&self, id: Uuid, mode: ClaimMode) -> Result<bool> {
            let mut rows = self.rows.lock().expect("rows");
            let Some(row) = rows.get_mut(&id) else {
                return Ok(false);
            };
            if mode == ClaimMode::CasQueuedOrFailed
                && !matches!(
                    row.status,
                    ApplicationStatus::Queued | ApplicationStatus::Failed
                )
            {
                return Ok(false);
            }
            row.status = ApplicationStatus::Processing;
            Ok(true)
        }

        async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<()> {
            let mut rows = self.rows.lock().expect("rows");
            let row = rows.get_mut(&id).expect("row");
            row.status = ApplicationStatus::Failed;
            row.failed_reason = Some(match row.failed_reason.take() {
                Some(existing) if !existing.is_empty() => format!("{existing}\n{reason}"),
                _ => reason.to_string(),
            });
            Ok(())
        }

        async fn save_extracted_data(&self, id: Uuid, data: &serde_json::Value) -> Result<()> {
            let mut rows = self.rows.lock().expect("rows");
            rows.get_mut(&id).expect("row").extracted_data = Some(data.clone());
            Ok(())
        }

        async fn save_embedding(&self, id: Uuid, embedding: &serde_json::Value) -> Result<()> {
            let mut rows = self.rows.lock().expect("rows");
            rows.get_mut(&id).expect("row").embedded_value = Some(embedding.clone());
            Ok(())
        }

        async fn complete(&self, id: Uuid, analysis: &serde_json::Value) -> Result<()> {
            let mut rows = self.rows.lock().expect("rows");
            let row = rows.get_mut(&id).expect("row");
            row.analysis = Some(analysis.clone());
            row.status = ApplicationStatus::Completed;
            Ok(())
        }
    }

    struct MemoryJobPosts {
        post: Option<JobPostRow>,
        count: AtomicUsize,
        fail_increment: bool,
    }

    #[async_trait]
    impl JobPostStore for MemoryJobPosts {
        async fn fetch(&self, _id: Uuid) -> Result<Option<JobPostRow>> {
            Ok(self.post.clone())
        }

        async fn increment_applicant_count(&self, _id: Uuid) -> Result<bool> {
            if self.fail_increment {
                return Err(anyhow!("counter table unavailable"));
            }
            self.count.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }
    }

    struct FakeOcr {
        start_calls: AtomicUsize,
    }

    #[async_trait]
    impl crate::services::ocr::OcrEngine for FakeOcr {
        async fn start(&self, _bucket: &str, _key: &str) -> Result<String, OcrError> {
            self.start_calls.fetch_add(1, Ordering::SeqCst);
            Ok("ocr-job".to_string())
        }

        async fn poll(
            &self,
            _job_handle: &str,
            _next_token: Option<String>,
        ) -> Result<OcrPoll, OcrError> {
            Ok(OcrPoll {
                status: OcrJobStatus::Succeeded,
                blocks: vec![RawTextFragment {
                    block_type: "LINE".to_string(),
                    text: Some("EXPERIENCE".to_string()),
                    geometry: Some(Geometry {
                        bounding_box: Some(BoundingBox {
                            top: Some(0.1),
                            left: Some(0.1),
                            width: Some(0.3),
                            height: Some(0.02),
                        }),
                        polygon: None,
                    }),
                    page: Some(1),
                    confidence: Some(99.0),
                }],
                next_token: None,
            })
        }
    }

    struct FakeEmbedder {
        vector: Option<Vec<f32>>,
    }

    #[async_trait]
    impl Embedder for FakeEmbedder {
        async fn embed(
            &self,
            _content: &[String],
            _task_type: EmbeddingTaskType,
            _title: EmbeddingTitle,
        ) -> Result<Option<Vec<f32>>, EmbeddingError> {
            Ok(self.vector.clone())
        }
    }

    struct FakeNormalizer {
        refuse: bool,
    }

    #[async_trait]
    impl Normalizer for FakeNormalizer {
        async fn normalize(
            &self,
            _sections: &BTreeMap<String, Vec<String>>,
        ) -> Result<NormalizeOutcome, NormalizeError> {
            if self.refuse {
                Ok(NormalizeOutcome::Refused {
                    error: "Failed to structure resume".to_string(),
                    details: "missing field `name`".to_string(),
                    raw_response: "not json".to_string(),
                })
            } else {
                Ok(NormalizeOutcome::Structured(ResumeProfile {
                    name: "Jane Doe".to_string(),
                    email: "jane@example.com".to_string(),
                    ..Default::default()
                }))
            }
        }
    }

    struct FakeEvaluator;

    #[async_trait]
    impl Evaluator for FakeEvaluator {
        async fn evaluate(
            &self,
            _profile: &ResumeProfile,
            _job_post: &JobPostRow,
        ) -> Result<AtsEvaluation> {
            Ok(AtsEvaluation {
                strengths: vec!["relevant experience".to_string()],
                weaknesses: vec![],
                score: 5.0,
            })
        }
    }

    fn application(status: ApplicationStatus) -> ApplicationRow {
        ApplicationRow {
            id: Uuid::new_v4(),
            candidate_name: "Jane Doe".to_string(),
            candidate_email: "jane@example.com".to_string(),
            job_post_id: Uuid::new_v4(),
            original_filename: "cv.pdf".to_string(),
            s3_path: Some("resumes/abc_cv.pdf".to_string()),
            status,
            seniority_level: None,
            extracted_data: None,
            embedded_value: None,
            analysis: None,
            failed_reason: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn job_post(with_requirements: bool) -> JobPostRow {
        let v = serde_json::json!([1.0, 0.0]);
        JobPostRow {
            id: Uuid::new_v4(),
            title: "Backend Engineer".to_string(),
            description: "Build services".to_string(),
            requirements: "Rust".to_string(),
            responsibilities: "Ship".to_string(),
            description_embedding: Some(v.clone()),
            requirements_embedding: with_requirements.then(|| serde_json::json!([0.0, 1.0])),
            responsibilities_embedding: Some(v),
            applicant_count: 0,
        }
    }

    struct Harness {
        pipeline: Pipeline,
        applications: Arc<MemoryApplications>,
        job_posts: Arc<MemoryJobPosts>,
        ocr: Arc<FakeOcr>,
        app_id: Uuid,
    }

    fn harness(
        app: ApplicationRow,
        post: Option<JobPostRow>,
        refuse_normalize: bool,
        embedding: Option<Vec<f32>>,
        fail_increment: bool,
        claim_mode: ClaimMode,
    ) -> Harness {
        let app_id = app.id;
        let applications = MemoryApplications::with(app);
        let job_posts = Arc::new(MemoryJobPosts {
            post,
            count: AtomicUsize::new(0),
            fail_increment,
        });
        let ocr = Arc::new(FakeOcr {
            start_calls: AtomicUsize::new(0),
        });
        let pipeline = Pipeline::new(
            applications.clone(),
            job_posts.clone(),
            ocr.clone(),
            Arc::new(FakeEmbedder { vector: embedding }),
            Arc::new(FakeNormalizer {
                refuse: refuse_normalize,
            }),
            Arc::new(FakeEvaluator),
            "resume-bucket".to_string(),
            PollConfig {
                poll_interval: Duration::from_millis(1),
                max_wait: Duration::from_millis(100),
                max_transient_retries: 3,
            },
            claim_mode,
        );
        Harness {
            pipeline,
            applications,
            job_posts,
            ocr,
            app_id,
        }
    }

    #[tokio::test]
    async fn test_happy_path_completes_with_weighted_score() {
        let h = harness(
            application(ApplicationStatus::Queued),
            Some(job_post(true)),
            false,
            Some(vec![1.0, 0.0]),
            false,
            ClaimMode::Unconditional,
        );
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Completed);
        assert!(row.extracted_data.is_some());
        assert!(row.embedded_value.is_some());
        let analysis = row.analysis.expect("analysis");
        // description/responsibilities match exactly, requirements is
        // orthogonal: 0*40 + 1*30 + 1*20 + 5*10 = 100.
        let overall = analysis["overall_score"].as_f64().expect("overall");
        assert!((overall - 100.0).abs() < 1e-9, "was {overall}");
        assert_eq!(analysis["evaluation"]["score"], 5.0);
        assert_eq!(h.job_posts.count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_completed_application_is_never_reprocessed() {
        let mut app = application(ApplicationStatus::Completed);
        app.analysis = Some(serde_json::json!({"overall_score": 42.0}));
        app.extracted_data = Some(serde_json::json!({"name": "done"}));
        let h = harness(
            app.clone(),
            Some(job_post(true)),
            false,
            Some(vec![1.0, 0.0]),
            false,
            ClaimMode::Unconditional,
        );

        h.pipeline.process(h.app_id).await;
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Completed);
        assert_eq!(row.analysis, app.analysis);
        assert_eq!(row.extracted_data, app.extracted_data);
        assert_eq!(h.ocr.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_requirements_embedding_fails_before_ocr() {
        let h = harness(
            application(ApplicationStatus::Queued),
            Some(job_post(false)),
            false,
            Some(vec![1.0, 0.0]),
            false,
            ClaimMode::Unconditional,
        );
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Failed);
        let reason = row.failed_reason.expect("reason");
        assert!(reason.contains("Failed to fetch job post"), "was: {reason}");
        assert_eq!(h.ocr.start_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_job_post_fails() {
        let h = harness(
            application(ApplicationStatus::Queued),
            None,
            false,
            Some(vec![1.0, 0.0]),
            false,
            ClaimMode::Unconditional,
        );
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Failed);
        assert!(row
            .failed_reason
            .expect("reason")
            .contains("Failed to fetch job post"));
    }

    #[tokio::test]
    async fn test_normalizer_refusal_captured_and_fatal() {
        let h = harness(
            application(ApplicationStatus::Queued),
            Some(job_post(true)),
            true,
            Some(vec![1.0, 0.0]),
            false,
            ClaimMode::Unconditional,
        );
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Failed);
        let reason = row.failed_reason.expect("reason");
        assert!(reason.contains("Profile normalization failed"));
        assert!(reason.contains("raw_response"), "error document captured: {reason}");
        // Nothing after the failed stage ran.
        assert!(row.embedded_value.is_none());
        assert!(row.analysis.is_none());
    }

    #[tokio::test]
    async fn test_missing_embedding_is_fatal() {
        let h = harness(
            application(ApplicationStatus::Queued),
            Some(job_post(true)),
            false,
            None,
            false,
            ClaimMode::Unconditional,
        );
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Failed);
        assert!(row
            .failed_reason
            .expect("reason")
            .contains("Embedding creation failed"));
    }

    #[tokio::test]
    async fn test_increment_failure_is_non_fatal() {
        let h = harness(
            application(ApplicationStatus::Queued),
            Some(job_post(true)),
            false,
            Some(vec![1.0, 0.0]),
            true,
            ClaimMode::Unconditional,
        );
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Completed);
        assert!(row.failed_reason.is_none());
    }

    #[tokio::test]
    async fn test_failed_reason_appends_across_attempts() {
        let h = harness(
            application(ApplicationStatus::Queued),
            None,
            false,
            Some(vec![1.0, 0.0]),
            false,
            ClaimMode::Unconditional,
        );
        h.pipeline.process(h.app_id).await;
        h.pipeline.process(h.app_id).await;

        let reason = h.applications.get(h.app_id).failed_reason.expect("reason");
        assert_eq!(reason.matches("Failed to fetch job post").count(), 2);
    }

    #[tokio::test]
    async fn test_strict_claim_skips_in_flight_application() {
        let h = harness(
            application(ApplicationStatus::Processing),
            Some(job_post(true)),
            false,
            Some(vec![1.0, 0.0]),
            false,
            ClaimMode::CasQueuedOrFailed,
        );
        h.pipeline.process(h.app_id).await;

        let row = h.applications.get(h.app_id);
        assert_eq!(row.status, ApplicationStatus::Processing);
        assert_eq!(h.ocr.start_calls.load(Ordering::SeqCst), 0);
    }
}
