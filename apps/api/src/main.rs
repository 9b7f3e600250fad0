mod config;
mod db;
mod errors;
mod layout;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod services;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Hirescope API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    info!("Redis client initialized");

    // Initialize AWS clients (S3 for documents, Textract for OCR). Only S3
    // takes the endpoint override so MinIO works locally; Textract always
    // talks to AWS.
    let aws_config = build_aws_config(&config).await;
    let s3_config = aws_sdk_s3::config::Builder::from(&aws_config)
        .endpoint_url(&config.s3_endpoint)
        .force_path_style(true)
        .build();
    let s3 = aws_sdk_s3::Client::from_conf(s3_config);
    let textract = aws_sdk_textract::Client::new(&aws_config);
    info!("S3 and Textract clients initialized");

    // Initialize LLM client (normalization + ATS evaluation)
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Wire the processing pipeline and start the background worker
    let processing = Arc::new(pipeline::production_pipeline(
        db.clone(),
        textract,
        llm,
        config.gemini_api_key.clone(),
        config.s3_bucket.clone(),
        config.poll,
        config.strict_claim,
    ));
    tokio::spawn(pipeline::worker::run(redis.clone(), processing));
    info!(
        "Worker started (poll interval {:?}, max wait {:?}, strict_claim={})",
        config.poll.poll_interval, config.poll.max_wait, config.strict_claim
    );

    // Build app state and router
    let state = AppState {
        db,
        redis,
        s3,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Shared AWS SDK configuration for MinIO-compatible (local) or AWS
/// (production) endpoints, with static credentials from the environment.
async fn build_aws_config(config: &Config) -> aws_config::SdkConfig {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "hirescope-static",
    );

    aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new(config.aws_region.clone()))
        .credentials_provider(credentials)
        .load()
        .await
}
