mod cache;
mod checkout;
mod config;
mod db;
mod documents;
mod drafts;
mod errors;
mod generation;
mod models;
mod modules;
mod revision;
mod routes;
mod state;
mod templates;
mod upload;
mod workflow;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::cache::Cache;
use crate::checkout::client::PaymentClient;
use crate::config::Config;
use crate::db::{create_pool, ensure_schema};
use crate::routes::build_router;
use crate::state::{AppState, InflightGuard};
use crate::workflow::client::HttpWorkflowRunner;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (panics on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Scriptorium API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    ensure_schema(&db).await?;

    // Initialize Redis
    let redis = redis::Client::open(config.redis_url.clone())?;
    let cache = Cache::new(redis);
    info!("Redis client initialized");

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Initialize AI workflow client
    let workflow = Arc::new(HttpWorkflowRunner::new(
        config.workflow_api_url.clone(),
        config.workflow_api_key.clone(),
    )?);
    info!("Workflow client initialized");

    // Initialize payment provider client
    let payments = PaymentClient::new(
        config.checkout_api_url.clone(),
        config.checkout_api_key.clone(),
    )?;
    info!("Payment client initialized");

    // Build app state
    let state = AppState {
        db,
        cache,
        s3,
        workflow,
        payments,
        config: config.clone(),
        inflight: InflightGuard::new(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "scriptorium-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}
