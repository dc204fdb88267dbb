use async_trait::async_trait;
use crate::{AnalysisError, QuoteSnapshot, Statement, StatementKind};

/// Source of statement tables and quote snapshots for a ticker symbol.
///
/// Each call may fail independently; callers are expected to treat a failed
/// statement exactly like an empty one.
#[async_trait]
pub trait StatementProvider: Send + Sync {
    async fn fetch_statement(&self, symbol: &str, kind: StatementKind) -> Result<Statement, AnalysisError>;

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, AnalysisError>;
}
