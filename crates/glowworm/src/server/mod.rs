//! HTTP surface for the analysis pipeline.
//!
//! All routes live under `/api`. Clients are built once at startup and
//! shared through [`AppState`].

mod error;
mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use glowworm_core::{
    AnalysisServices, BatchCoordinator, Config, ConfigError, MediaAnalyzer, SearchEngine,
    VideoGenerator,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<MediaAnalyzer>,
    pub batch: Arc<BatchCoordinator>,
    pub search: Arc<SearchEngine>,
    /// `None` when no video-generation key is configured
    pub video: Option<Arc<VideoGenerator>>,
    pub llm_provider: String,
    pub sandbox_enabled: bool,
}

impl AppState {
    pub fn new(services: AnalysisServices, config: &Config, video: Option<VideoGenerator>) -> Self {
        let llm_provider = services.llm.name().to_string();
        let sandbox_enabled = services.sandbox.is_some();
        let search = SearchEngine::new(Some(services.llm.clone()));
        let analyzer = Arc::new(MediaAnalyzer::new(services, config));

        Self {
            batch: Arc::new(BatchCoordinator::new(
                analyzer.clone(),
                config.analysis.batch_size,
            )),
            analyzer,
            search: Arc::new(search),
            video: video.map(Arc::new),
            llm_provider,
            sandbox_enabled,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let services = AnalysisServices::from_config(config)?;
        let video = match VideoGenerator::from_config(
            &config.video,
            Duration::from_millis(config.limits.video_timeout_ms),
        ) {
            Ok(generator) => Some(generator),
            Err(e) => {
                tracing::warn!("Video generation disabled: {e}");
                None
            }
        };
        Ok(Self::new(services, config, video))
    }

    fn video_generator(&self) -> Result<&VideoGenerator, ApiError> {
        self.video.as_deref().ok_or_else(|| {
            ConfigError::not_configured("Video generation", "set the LUMA_API_KEY env var").into()
        })
    }
}

/// Build the router. Request bodies above `max_upload_bytes` get a 413.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/analyze", post(handlers::analyze))
        .route("/api/batch-analyze", post(handlers::batch_analyze))
        .route("/api/generate-video", post(handlers::generate_video))
        .route("/api/check-video", get(handlers::check_video))
        .route("/api/search", post(handlers::search))
        .route("/api/recommendations", post(handlers::recommendations))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serve until Ctrl-C.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let state = AppState::from_config(&config)?;
    let limit = usize::try_from(config.limits.max_upload_mb * 1024 * 1024)?;
    let app = router(state, limit);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {e}");
            }
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}
