use analysis_core::{AnalysisError, StatementProvider};
use analysis_orchestrator::{EvaluationService, JsonStatementProvider, RetryPolicy, StockScreener};
use anyhow::Context;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod evaluate_routes;
pub mod symbol_routes;
pub mod ticker_registry;


pub use config::ServerConfig;
pub use ticker_registry::TickerRegistry;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EvaluationService>,
    pub screener: Arc<StockScreener>,
    pub tickers: Arc<TickerRegistry>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, provider: Arc<dyn StatementProvider>, tickers: TickerRegistry) -> Self {
        let retry = RetryPolicy::new(config.provider_max_attempts, config.provider_retry_backoff);
        let service = Arc::new(
            EvaluationService::new(provider)
                .with_profile(config.scoring_profile)
                .with_retry(retry),
        );
        let screener = Arc::new(StockScreener::new(Arc::clone(&service)).with_concurrency(config.screen_concurrency));
        Self {
            service,
            screener,
            tickers: Arc::new(tickers),
            config: Arc::new(config),
        }
    }
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError::Internal(e)
    }
}

impl From<AnalysisError> for AppError {
    fn from(e: AnalysisError) -> Self {
        match e {
            AnalysisError::SymbolNotFound(symbol) => AppError::NotFound(format!("Symbol not found: {symbol}")),
            AnalysisError::InvalidData(msg) => AppError::BadRequest(msg),
            other => AppError::Internal(other.into()),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(evaluate_routes::evaluate_routes())
        .merge(symbol_routes::symbol_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(env_filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter()).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env()?;
    tracing::info!(
        "Starting API server (profile: {}, data: {})",
        config.scoring_profile.name,
        config.statement_data_dir.display()
    );
    if !config.statement_data_dir.is_dir() {
        tracing::warn!(
            "Statement directory {} does not exist; every symbol will be reported as not found",
            config.statement_data_dir.display()
        );
    }

    let provider = Arc::new(JsonStatementProvider::new(&config.statement_data_dir));
    let tickers = TickerRegistry::load_or_empty(&config.tickers_csv)?;
    let bind_addr = config.bind_addr.clone();
    let app = build_router(AppState::new(config, provider, tickers));

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
