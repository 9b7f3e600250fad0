use aws_sdk_s3::Client as S3Client;
use redis::Client as RedisClient;
use sqlx::PgPool;

use crate::config::Config;

/// Shared application state injected into route handlers via Axum
/// extractors. The pipeline's collaborators are wired separately in main
/// and handed to the worker task; handlers only need upload-path clients.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: RedisClient,
    pub s3: S3Client,
    pub config: Config,
}
