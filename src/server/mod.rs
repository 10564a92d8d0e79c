pub mod csrf;
pub mod error;
pub mod handlers;
pub mod models;
pub mod render;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::ocr::TesseractOcr;
use crate::report::Pipeline;

pub struct AppState {
    pub config: AppConfig,
    pub pipeline: Pipeline,
    /// Used by the health check to probe the OCR tools.
    pub ocr: TesseractOcr,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig, pipeline: Pipeline) -> SharedState {
        let ocr = TesseractOcr::new(config.ocr.clone());
        Arc::new(Self {
            config,
            pipeline,
            ocr,
        })
    }

    pub fn from_config(config: AppConfig) -> Result<SharedState> {
        let pipeline = Pipeline::from_config(&config)?;
        Ok(Self::new(config, pipeline))
    }
}

pub fn create_app(state: SharedState) -> Router {
    let body_limit = state.config.server.max_upload_bytes;

    Router::new()
        .route("/", get(handlers::index).post(handlers::submit_form))
        .route("/api/analyze", post(handlers::analyze))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

/// Log configuration problems that would otherwise only show up per file.
pub async fn check_environment(state: &SharedState) {
    let problems = state.ocr.check_tools().await;
    for problem in &problems {
        error!("{}", problem);
    }
    if !problems.is_empty() {
        warn!("OCR is unavailable: scanned PDFs and images cannot be read");
    }

    if state.config.uses_default_secret() {
        warn!("SECRET_KEY is not set, using the development default");
    }
    if state.pipeline.suggestions_enabled() {
        info!("AI suggestions enabled (model: {})", state.config.suggest.model);
    } else {
        info!("GEMINI_API_KEY not set, AI suggestions disabled");
    }
}

pub async fn start_server(config: AppConfig) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?;

    let state = AppState::from_config(config)?;
    check_environment(&state).await;

    info!("Starting server on {}", addr);
    let app = create_app(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Upload form: http://{}/", addr);
    info!("API endpoint: http://{}/api/analyze", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
