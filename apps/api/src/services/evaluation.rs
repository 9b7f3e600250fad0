//! Qualitative ATS evaluation of a normalized profile against a job post.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::info;

use crate::llm_client::{prompts, LlmClient};
use crate::models::job_post::JobPostRow;
use crate::models::profile::{AtsEvaluation, ResumeProfile};

/// Evaluation collaborator seam, held by the pipeline as
/// `Arc<dyn Evaluator>`.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate(
        &self,
        profile: &ResumeProfile,
        job_post: &JobPostRow,
    ) -> Result<AtsEvaluation>;
}

/// Production evaluator backed by the shared LLM client.
pub struct LlmEvaluator {
    llm: LlmClient,
}

impl LlmEvaluator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Evaluator for LlmEvaluator {
    /// Asks the LLM for a strengths/weaknesses/score judgement. A response
    /// that does not conform to the evaluation schema is an error; there is
    /// no partial-evaluation state.
    async fn evaluate(
        &self,
        profile: &ResumeProfile,
        job_post: &JobPostRow,
    ) -> Result<AtsEvaluation> {
        let profile_json =
            serde_json::to_string_pretty(profile).context("serializing profile for evaluation")?;
        let prompt = prompts::evaluator_prompt(
            &profile_json,
            &job_post.title,
            &job_post.description,
            &job_post.requirements,
            &job_post.responsibilities,
        );

        info!("Requesting ATS evaluation for job post {}", job_post.id);

        let evaluation: AtsEvaluation = self
            .llm
            .call_json(&prompt, prompts::EVALUATOR_SYSTEM)
            .await
            .context("ATS evaluation call failed")?;

        Ok(evaluation)
    }
}
