pub mod aliases;
pub mod metrics;
pub mod presentation;
pub mod resolver;
pub mod scoring;


use analysis_core::{Evaluation, MetricSet, QuoteSnapshot, StatementSet};

pub use metrics::{safe_ratio, MetricCalculator, TTM_QUARTERS};
pub use resolver::{resolve, resolve_at, resolve_recent_sum, LabelQuery, Period, SubstringFallback};
pub use scoring::{score, Contribution, Direction, MetricWeight, ScoringProfile};

/// Metric extraction plus scoring under one profile.
#[derive(Debug, Clone, Copy)]
pub struct FundamentalAnalysisEngine {
    calculator: MetricCalculator,
    profile: &'static ScoringProfile,
}

impl FundamentalAnalysisEngine {
    pub fn new() -> Self {
        Self::with_profile(ScoringProfile::standard())
    }

    pub fn with_profile(profile: &'static ScoringProfile) -> Self {
        Self {
            calculator: MetricCalculator::new(),
            profile,
        }
    }

    pub fn profile(&self) -> &'static ScoringProfile {
        self.profile
    }

    pub fn evaluate(&self, statements: &StatementSet, quote: &QuoteSnapshot) -> Evaluation {
        let metrics = self.calculator.evaluate(statements, quote);
        let score = self.profile.score(&metrics);
        tracing::debug!(
            company = %metrics.name,
            score = score.value(),
            profile = self.profile.name,
            degraded = metrics.degraded.len(),
            "evaluation complete"
        );
        Evaluation {
            metrics,
            score,
            profile: self.profile.name.to_string(),
        }
    }
}

impl Default for FundamentalAnalysisEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Metric set for one company; never fails.
pub fn evaluate(statements: &StatementSet, quote: &QuoteSnapshot) -> MetricSet {
    MetricCalculator::new().evaluate(statements, quote)
}
