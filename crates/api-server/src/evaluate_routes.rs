//! Evaluation, screening and scoring-profile endpoints.

use analysis_core::{MetricSet, Score};
use analysis_orchestrator::{screener::normalize_symbols, DataSource, ScreenerFilters, ScreenerResult, SymbolEvaluation};
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use fundamental_analysis::{
    presentation::{build_summary, ReportRow},
    Contribution, ScoringProfile,
};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct ProfileQuery {
    #[serde(default)]
    pub profile: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ScreenRequest {
    pub symbols: Vec<String>,
    #[serde(default)]
    pub min_score: Option<u8>,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub profile: Option<String>,
}

/// Everything the UI needs to render one symbol.
#[derive(Debug, Serialize)]
pub struct EvaluationReport {
    pub symbol: String,
    pub profile: String,
    pub score: Score,
    pub metrics: MetricSet,
    pub breakdown: Vec<Contribution>,
    pub row: ReportRow,
    pub html_row: ReportRow,
    pub summary: String,
    pub unavailable_sources: Vec<DataSource>,
    pub evaluated_at: DateTime<Utc>,
}

impl EvaluationReport {
    fn new(evaluated: SymbolEvaluation, profile: &ScoringProfile) -> Self {
        let SymbolEvaluation {
            symbol,
            evaluation,
            unavailable_sources,
            evaluated_at,
        } = evaluated;
        Self {
            breakdown: profile.breakdown(&evaluation.metrics),
            row: ReportRow::plain(&symbol, &evaluation),
            html_row: ReportRow::html(&symbol, &evaluation),
            summary: build_summary(&evaluation.metrics),
            profile: evaluation.profile,
            score: evaluation.score,
            metrics: evaluation.metrics,
            symbol,
            unavailable_sources,
            evaluated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileSummary {
    #[serde(flatten)]
    pub profile: &'static ScoringProfile,
    pub default: bool,
}

pub fn evaluate_routes() -> Router<AppState> {
    Router::new()
        .route("/api/evaluate/:symbol", get(evaluate_symbol))
        .route("/api/screen", post(screen))
        .route("/api/scoring/profiles", get(list_profiles))
}

/// Named profile, or the server default when none is given.
fn select_profile(state: &AppState, name: Option<&str>) -> Result<&'static ScoringProfile, AppError> {
    match name.map(str::trim).filter(|n| !n.is_empty()) {
        Some(name) => ScoringProfile::by_name(name)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown scoring profile: {name}"))),
        None => Ok(state.config.scoring_profile),
    }
}

async fn evaluate_symbol(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<ProfileQuery>,
) -> Result<Json<ApiResponse<EvaluationReport>>, AppError> {
    let profile = select_profile(&state, query.profile.as_deref())?;
    let evaluated = state.service.evaluate_symbol_with(&symbol, profile).await?;
    Ok(Json(ApiResponse::success(EvaluationReport::new(evaluated, profile))))
}

async fn screen(
    State(state): State<AppState>,
    Json(request): Json<ScreenRequest>,
) -> Result<Json<ApiResponse<ScreenerResult>>, AppError> {
    let profile = select_profile(&state, request.profile.as_deref())?;

    let symbols = normalize_symbols(request.symbols);
    if symbols.is_empty() {
        return Err(AppError::BadRequest("No symbols provided".to_string()));
    }
    let max = state.config.screen_max_symbols;
    if symbols.len() > max {
        return Err(AppError::BadRequest(format!(
            "Too many symbols: {} (max {})",
            symbols.len(),
            max
        )));
    }

    let filters = ScreenerFilters {
        min_score: request.min_score.unwrap_or(0),
        limit: request.limit,
        profile,
    };
    let result = state.screener.screen(symbols, filters).await?;
    Ok(Json(ApiResponse::success(result)))
}

async fn list_profiles(State(state): State<AppState>) -> Json<ApiResponse<Vec<ProfileSummary>>> {
    let default = state.config.scoring_profile.name;
    let profiles = ScoringProfile::all()
        .iter()
        .map(|&profile| ProfileSummary {
            profile,
            default: profile.name == default,
        })
        .collect();
    Json(ApiResponse::success(profiles))
}
