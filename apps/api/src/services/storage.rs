//! Document store: uploaded resumes live in S3 under stable keys the OCR
//! collaborator can resolve.

use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

/// Builds the object key for an uploaded resume. The UUID prefix keeps keys
/// unique across same-named files.
pub fn resume_key(original_filename: &str) -> String {
    format!("resumes/{}_{}", Uuid::new_v4(), original_filename)
}

/// Uploads resume bytes to S3 and returns nothing; the caller persists the
/// key on the application row once the put succeeds.
pub async fn put_resume(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    key: &str,
    body: Bytes,
) -> Result<()> {
    s3.put_object()
        .bucket(bucket)
        .key(key)
        .content_type("application/pdf")
        .body(ByteStream::from(body))
        .send()
        .await
        .with_context(|| format!("uploading resume to s3://{bucket}/{key}"))?;

    info!("Uploaded resume to s3://{bucket}/{key}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_key_prefix_and_filename() {
        let key = resume_key("cv.pdf");
        assert!(key.starts_with("resumes/"));
        assert!(key.ends_with("_cv.pdf"));
    }

    #[test]
    fn test_resume_keys_unique_per_call() {
        assert_ne!(resume_key("cv.pdf"), resume_key("cv.pdf"));
    }
}
