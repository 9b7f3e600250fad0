//! Embedding generation via the Gemini embedContent REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Dimension of every embedding in the system (gemini-embedding-001). A
/// vector of any other length is a collaborator contract violation, never a
/// valid state.
pub const EMBEDDING_DIM: usize = 3072;

const EMBEDDING_MODEL: &str = "gemini-embedding-001";
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Embedding task hint passed to the collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EmbeddingTaskType {
    RetrievalQuery,
    RetrievalDocument,
    SemanticSimilarity,
}

/// Fixed titles attached to embedding requests, so resume and job-post
/// vectors land in comparable regions of the space.
#[derive(Debug, Clone, Copy)]
pub enum EmbeddingTitle {
    ApplicantResume,
    RecruiterJobDescription,
}

impl EmbeddingTitle {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingTitle::ApplicantResume => "This is an applicant's resume to be embedded",
            EmbeddingTitle::RecruiterJobDescription => {
                "This is a job description of a recruiter to be embedded"
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("embedding API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("embedding has wrong dimension: expected {expected}, got {actual}")]
    WrongDimension { expected: usize, actual: usize },
}

/// Embedding collaborator seam. Held as `Arc<dyn Embedder>` by the pipeline
/// so tests can substitute a canned implementation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embeds `content` (joined into one text blob). `None` means the
    /// collaborator produced no vector for the content — the caller decides
    /// whether that is fatal.
    async fn embed(
        &self,
        content: &[String],
        task_type: EmbeddingTaskType,
        title: EmbeddingTitle,
    ) -> Result<Option<Vec<f32>>, EmbeddingError>;
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    model: String,
    content: ContentPart<'a>,
    #[serde(rename = "taskType")]
    task_type: EmbeddingTaskType,
    title: &'a str,
    #[serde(rename = "outputDimensionality")]
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct ContentPart<'a> {
    parts: Vec<TextPart<'a>>,
}

#[derive(Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

/// Production embedder backed by the Gemini REST API.
#[derive(Clone)]
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
}

impl GeminiEmbedder {
    pub fn new(api_key: String) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(60))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
        }
    }
}

#[async_trait]
impl Embedder for GeminiEmbedder {
    async fn embed(
        &self,
        content: &[String],
        task_type: EmbeddingTaskType,
        title: EmbeddingTitle,
    ) -> Result<Option<Vec<f32>>, EmbeddingError> {
        if content.is_empty() {
            warn!("embed called with empty content");
            return Ok(None);
        }

        let text = content.join("\n");
        let request = EmbedContentRequest {
            model: format!("models/{EMBEDDING_MODEL}"),
            content: ContentPart {
                parts: vec![TextPart { text: &text }],
            },
            task_type,
            title: title.as_str(),
            output_dimensionality: EMBEDDING_DIM,
        };

        let url = format!(
            "{GEMINI_API_BASE}/{EMBEDDING_MODEL}:embedContent?key={}",
            self.api_key
        );
        let response = self.client.post(&url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: EmbedContentResponse = response.json().await?;
        match body.embedding {
            Some(embedding) => {
                if embedding.values.len() != EMBEDDING_DIM {
                    return Err(EmbeddingError::WrongDimension {
                        expected: EMBEDDING_DIM,
                        actual: embedding.values.len(),
                    });
                }
                info!("Created embedding (length={})", embedding.values.len());
                Ok(Some(embedding.values))
            }
            None => {
                warn!("No embedding returned for task {:?}", task_type);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_type_serializes_screaming_snake() {
        let json = serde_json::to_string(&EmbeddingTaskType::SemanticSimilarity).expect("ser");
        assert_eq!(json, "\"SEMANTIC_SIMILARITY\"");
        let json = serde_json::to_string(&EmbeddingTaskType::RetrievalDocument).expect("ser");
        assert_eq!(json, "\"RETRIEVAL_DOCUMENT\"");
    }

    #[test]
    fn test_response_parses_values() {
        let body = r#"{"embedding": {"values": [0.1, -0.2, 0.3]}}"#;
        let parsed: EmbedContentResponse = serde_json::from_str(body).expect("parse");
        assert_eq!(parsed.embedding.expect("values").values.len(), 3);
    }

    #[test]
    fn test_response_without_embedding() {
        let parsed: EmbedContentResponse = serde_json::from_str("{}").expect("parse");
        assert!(parsed.embedding.is_none());
    }
}
