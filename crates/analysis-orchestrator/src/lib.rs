use analysis_core::{
    AnalysisError, Evaluation, QuoteSnapshot, Statement, StatementKind, StatementProvider, StatementSet,
};
use chrono::{DateTime, Utc};
use fundamental_analysis::{FundamentalAnalysisEngine, ScoringProfile};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

pub mod provider;
pub mod retry;
pub mod screener;

pub use provider::{InMemoryStatementProvider, IssuerData, JsonStatementProvider};
pub use retry::RetryPolicy;
pub use screener::{ScreenerFilters, ScreenerResult, StockScreener};

/// One input fetched from a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSource {
    Statement(StatementKind),
    Quote,
}

impl DataSource {
    pub const ALL: [DataSource; 6] = [
        DataSource::Statement(StatementKind::AnnualIncome),
        DataSource::Statement(StatementKind::AnnualBalance),
        DataSource::Statement(StatementKind::AnnualCashflow),
        DataSource::Statement(StatementKind::QuarterlyIncome),
        DataSource::Statement(StatementKind::QuarterlyCashflow),
        DataSource::Quote,
    ];

    /// Stable snake_case key, used in JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            DataSource::Statement(StatementKind::AnnualIncome) => "annual_income",
            DataSource::Statement(StatementKind::AnnualBalance) => "annual_balance",
            DataSource::Statement(StatementKind::AnnualCashflow) => "annual_cashflow",
            DataSource::Statement(StatementKind::QuarterlyIncome) => "quarterly_income",
            DataSource::Statement(StatementKind::QuarterlyCashflow) => "quarterly_cashflow",
            DataSource::Quote => "quote",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Statement(kind) => write!(f, "{kind}"),
            DataSource::Quote => f.write_str("quote"),
        }
    }
}

impl Serialize for DataSource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for DataSource {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        const KEYS: &[&str] = &[
            "annual_income",
            "annual_balance",
            "annual_cashflow",
            "quarterly_income",
            "quarterly_cashflow",
            "quote",
        ];
        DataSource::ALL
            .into_iter()
            .find(|source| source.key() == key)
            .ok_or_else(|| serde::de::Error::unknown_variant(&key, KEYS))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolEvaluation {
    pub symbol: String,
    pub evaluation: Evaluation,
    /// Inputs the provider could not supply; they were evaluated as empty.
    pub unavailable_sources: Vec<DataSource>,
    pub evaluated_at: DateTime<Utc>,
}

/// Fetches a symbol's inputs and runs the metric engine over them.
///
/// Provider failures never abort an evaluation: a failed statement is
/// evaluated as empty, a failed quote as the default snapshot. Only a symbol
/// unknown to every source is reported as an error.
pub struct EvaluationService {
    provider: Arc<dyn StatementProvider>,
    engine: FundamentalAnalysisEngine,
    retry: RetryPolicy,
}

impl EvaluationService {
    pub fn new(provider: Arc<dyn StatementProvider>) -> Self {
        Self {
            provider,
            engine: FundamentalAnalysisEngine::new(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_profile(mut self, profile: &'static ScoringProfile) -> Self {
        self.engine = FundamentalAnalysisEngine::with_profile(profile);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn profile(&self) -> &'static ScoringProfile {
        self.engine.profile()
    }

    /// Evaluates with the service's configured profile.
    pub async fn evaluate_symbol(&self, symbol: &str) -> Result<SymbolEvaluation, AnalysisError> {
        self.evaluate_symbol_with(symbol, self.engine.profile()).await
    }

    pub async fn evaluate_symbol_with(
        &self,
        symbol: &str,
        profile: &'static ScoringProfile,
    ) -> Result<SymbolEvaluation, AnalysisError> {
        let symbol = symbol.trim().to_uppercase();
        tracing::info!("Evaluating {} (profile: {})", symbol, profile.name);

        let (statements, quote, unavailable_sources) = self.gather(&symbol).await?;
        let evaluation = FundamentalAnalysisEngine::with_profile(profile).evaluate(&statements, &quote);

        if !unavailable_sources.is_empty() {
            tracing::warn!(
                "{} evaluated without {} source(s): {:?}",
                symbol,
                unavailable_sources.len(),
                unavailable_sources.iter().map(DataSource::key).collect::<Vec<_>>()
            );
        }
        tracing::info!("{} scored {}", symbol, evaluation.score);

        Ok(SymbolEvaluation {
            symbol,
            evaluation,
            unavailable_sources,
            evaluated_at: Utc::now(),
        })
    }

    /// Fetches all six inputs concurrently.
    async fn gather(&self, symbol: &str) -> Result<(StatementSet, QuoteSnapshot, Vec<DataSource>), AnalysisError> {
        let fetch = |kind: StatementKind| {
            self.retry
                .run(kind.label(), move || self.provider.fetch_statement(symbol, kind))
        };

        let (annual_income, annual_balance, annual_cashflow, quarterly_income, quarterly_cashflow, quote) = tokio::join!(
            fetch(StatementKind::AnnualIncome),
            fetch(StatementKind::AnnualBalance),
            fetch(StatementKind::AnnualCashflow),
            fetch(StatementKind::QuarterlyIncome),
            fetch(StatementKind::QuarterlyCashflow),
            self.retry.run("quote", || self.provider.fetch_quote(symbol)),
        );

        let fetched = [
            (StatementKind::AnnualIncome, annual_income),
            (StatementKind::AnnualBalance, annual_balance),
            (StatementKind::AnnualCashflow, annual_cashflow),
            (StatementKind::QuarterlyIncome, quarterly_income),
            (StatementKind::QuarterlyCashflow, quarterly_cashflow),
        ];

        if is_not_found(&quote) && fetched.iter().all(|(_, result)| is_not_found(result)) {
            return Err(AnalysisError::SymbolNotFound(symbol.to_string()));
        }

        let mut statements = StatementSet::default();
        let mut unavailable = Vec::new();

        for (kind, result) in fetched {
            let statement = match result {
                Ok(statement) => statement,
                Err(e) => {
                    tracing::warn!("Failed to fetch {} for {}: {}", kind, symbol, e);
                    unavailable.push(DataSource::Statement(kind));
                    Statement::default()
                }
            };
            statements.set(kind, statement);
        }

        let quote = quote.unwrap_or_else(|e| {
            tracing::warn!("Failed to fetch quote for {}: {}", symbol, e);
            unavailable.push(DataSource::Quote);
            QuoteSnapshot::default()
        });

        Ok((statements, quote, unavailable))
    }
}

fn is_not_found<T>(result: &Result<T, AnalysisError>) -> bool {
    matches!(result, Err(AnalysisError::SymbolNotFound(_)))
}
