//! Symbol Search API Routes
//!
//! Autocomplete over the ticker registry loaded at startup.

use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::ticker_registry::{TickerMatch, SEARCH_LIMIT};
use crate::{ApiResponse, AppState};

#[derive(Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

pub fn symbol_routes() -> Router<AppState> {
    Router::new().route("/api/symbols/search", get(search_symbols))
}

async fn search_symbols(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<ApiResponse<Vec<TickerMatch>>> {
    Json(ApiResponse::success(state.tickers.search(&query.q, SEARCH_LIMIT)))
}
