use super::{EvaluationService, SymbolEvaluation};
use analysis_core::AnalysisError;
use fundamental_analysis::ScoringProfile;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

pub const DEFAULT_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerResult {
    /// Highest score first; ties ordered by symbol.
    pub results: Vec<SymbolEvaluation>,
    pub total_analyzed: usize,
    pub total_passed_filters: usize,
    /// Symbols no source knew about, or whose task failed.
    pub failed: Vec<String>,
    pub profile: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct ScreenerFilters {
    pub min_score: u8,
    /// `None` keeps every passing symbol.
    pub limit: Option<usize>,
    pub profile: &'static ScoringProfile,
}

impl Default for ScreenerFilters {
    fn default() -> Self {
        Self {
            min_score: 0,
            limit: None,
            profile: ScoringProfile::standard(),
        }
    }
}

pub struct StockScreener {
    service: Arc<EvaluationService>,
    concurrency: usize,
}

impl StockScreener {
    pub fn new(service: Arc<EvaluationService>) -> Self {
        Self {
            service,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn screen(&self, symbols: Vec<String>, filters: ScreenerFilters) -> Result<ScreenerResult, anyhow::Error> {
        let symbols = normalize_symbols(symbols);
        let total_analyzed = symbols.len();

        tracing::info!(
            "Starting screen of {} symbols (profile: {}, concurrency: {})",
            total_analyzed,
            filters.profile.name,
            self.concurrency
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        // Symbols whose task has not reported back; a panicked task leaves its symbol here.
        let mut pending: HashSet<String> = symbols.iter().cloned().collect();

        for symbol in symbols {
            let service = Arc::clone(&self.service);
            let semaphore = Arc::clone(&semaphore);
            let profile = filters.profile;
            tasks.spawn(async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => service.evaluate_symbol_with(&symbol, profile).await,
                    Err(e) => Err(AnalysisError::Provider(format!("screen aborted: {e}"))),
                };
                (symbol, result)
            });
        }

        let mut results = Vec::new();
        let mut failed = Vec::new();

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((symbol, Ok(evaluated))) => {
                    pending.remove(&symbol);
                    if evaluated.evaluation.score.value() >= filters.min_score {
                        results.push(evaluated);
                    }
                }
                Ok((symbol, Err(e))) => {
                    tracing::warn!("Failed to evaluate {}: {}", symbol, e);
                    pending.remove(&symbol);
                    failed.push(symbol);
                }
                Err(e) => {
                    tracing::error!("Screen task error: {}", e);
                }
            }
        }
        failed.extend(pending);

        let total_passed_filters = results.len();

        results.sort_by(|a, b| {
            b.evaluation
                .score
                .cmp(&a.evaluation.score)
                .then_with(|| a.symbol.cmp(&b.symbol))
        });
        if let Some(limit) = filters.limit {
            results.truncate(limit);
        }
        failed.sort();

        tracing::info!(
            "Screen complete: {}/{} symbols passed filters, returning {}",
            total_passed_filters,
            total_analyzed,
            results.len()
        );

        Ok(ScreenerResult {
            results,
            total_analyzed,
            total_passed_filters,
            failed,
            profile: filters.profile.name.to_string(),
            timestamp: chrono::Utc::now(),
        })
    }
}

/// Trims, upper-cases and de-duplicates, keeping first-seen order.
pub fn normalize_symbols(symbols: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}
