use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// A job posting an application is scored against. The three embeddings are
/// produced when the post is created; the pipeline treats the absence of any
/// of them as an incomplete post (fatal for scoring).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPostRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub requirements: String,
    pub responsibilities: String,
    pub description_embedding: Option<Value>,
    pub requirements_embedding: Option<Value>,
    pub responsibilities_embedding: Option<Value>,
    pub applicant_count: i32,
}

impl JobPostRow {
    /// All three embeddings as float vectors, or `None` if any is missing or
    /// not a numeric array.
    pub fn embeddings(&self) -> Option<JobPostEmbeddings> {
        Some(JobPostEmbeddings {
            description: as_vector(self.description_embedding.as_ref())?,
            requirements: as_vector(self.requirements_embedding.as_ref())?,
            responsibilities: as_vector(self.responsibilities_embedding.as_ref())?,
        })
    }
}

/// The three similarity axes a resume is compared on.
#[derive(Debug, Clone)]
pub struct JobPostEmbeddings {
    pub description: Vec<f32>,
    pub requirements: Vec<f32>,
    pub responsibilities: Vec<f32>,
}

fn as_vector(value: Option<&Value>) -> Option<Vec<f32>> {
    let items = value?.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect()
}
