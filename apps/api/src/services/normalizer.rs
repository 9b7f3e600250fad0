//! Profile normalization: grouped resume text → structured `ResumeProfile`
//! via the LLM, with a tagged outcome instead of a duck-typed error dict.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, info};

use crate::llm_client::{prompts, LlmClient, LlmError};
use crate::models::profile::ResumeProfile;

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("section key '{0}' is not numeric")]
    BadSectionKey(String),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Outcome of a normalization call. `Refused` captures the collaborator's
/// error document verbatim so it can be persisted into `failed_reason`;
/// it is never treated as partial data.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum NormalizeOutcome {
    Structured(ResumeProfile),
    Refused {
        error: String,
        details: String,
        raw_response: String,
    },
}

/// Joins grouped section texts into one resume blob. Keys must parse as
/// integers and are concatenated in numeric order — string order would put
/// "10" before "2" and scramble reading order, which the LLM depends on for
/// context. A non-numeric key is a stage failure, not something to skip.
pub fn combine_sections(sections: &BTreeMap<String, Vec<String>>) -> Result<String, NormalizeError> {
    let mut keyed: Vec<(i64, &Vec<String>)> = Vec::with_capacity(sections.len());
    for (key, lines) in sections {
        let n: i64 = key
            .trim()
            .parse()
            .map_err(|_| NormalizeError::BadSectionKey(key.clone()))?;
        keyed.push((n, lines));
    }
    keyed.sort_by_key(|(n, _)| *n);

    Ok(keyed
        .iter()
        .flat_map(|(_, lines)| lines.iter())
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n"))
}

/// Profile-structuring collaborator seam, held by the pipeline as
/// `Arc<dyn Normalizer>`.
#[async_trait]
pub trait Normalizer: Send + Sync {
    async fn normalize(
        &self,
        sections: &BTreeMap<String, Vec<String>>,
    ) -> Result<NormalizeOutcome, NormalizeError>;
}

/// Production normalizer backed by the shared LLM client.
pub struct LlmNormalizer {
    llm: LlmClient,
}

impl LlmNormalizer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl Normalizer for LlmNormalizer {
    /// Sends the combined resume text through the LLM and returns either a
    /// structured profile or the model's error document. Transport-level
    /// failures propagate as `NormalizeError::Llm`; a response that is
    /// valid JSON but does not conform to the schema becomes `Refused`.
    async fn normalize(
        &self,
        sections: &BTreeMap<String, Vec<String>>,
    ) -> Result<NormalizeOutcome, NormalizeError> {
        let combined = combine_sections(sections)?;
        let today = Utc::now().format("%Y-%m-%d").to_string();
        let prompt = prompts::normalizer_prompt(&combined, &today);

        info!(
            "Sending resume text ({} chars) for normalization",
            combined.len()
        );

        match self
            .llm
            .call_json_with_raw::<ResumeProfile>(&prompt, prompts::NORMALIZER_SYSTEM)
            .await?
        {
            Ok(profile) => Ok(NormalizeOutcome::Structured(profile)),
            Err((parse_err, raw)) => {
                error!("Normalization response did not conform to schema: {parse_err}");
                Ok(NormalizeOutcome::Refused {
                    error: "Failed to structure resume".to_string(),
                    details: parse_err.to_string(),
                    raw_response: raw,
                })
            }
        }
    }
}
