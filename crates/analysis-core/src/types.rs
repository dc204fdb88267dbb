use serde::{Deserialize, Serialize};
use std::fmt;

use crate::statement::{lenient_number, Statement};

/// The statement tables a provider can supply for one issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    AnnualIncome,
    AnnualBalance,
    AnnualCashflow,
    QuarterlyIncome,
    QuarterlyCashflow,
}

impl StatementKind {
    pub const ALL: [StatementKind; 5] = [
        StatementKind::AnnualIncome,
        StatementKind::AnnualBalance,
        StatementKind::AnnualCashflow,
        StatementKind::QuarterlyIncome,
        StatementKind::QuarterlyCashflow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::AnnualIncome => "annual income statement",
            StatementKind::AnnualBalance => "annual balance sheet",
            StatementKind::AnnualCashflow => "annual cash-flow statement",
            StatementKind::QuarterlyIncome => "quarterly income statement",
            StatementKind::QuarterlyCashflow => "quarterly cash-flow statement",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Statement inputs for one evaluation. Absent statements are empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementSet {
    #[serde(default)]
    pub annual_income: Statement,
    #[serde(default)]
    pub annual_balance: Statement,
    #[serde(default)]
    pub quarterly_income: Statement,
    #[serde(default)]
    pub quarterly_cashflow: Statement,
    /// Only consulted when the quarterly cash-flow statement cannot produce
    /// a trailing operating cash flow figure.
    #[serde(default)]
    pub annual_cashflow: Statement,
}

impl StatementSet {
    pub fn get(&self, kind: StatementKind) -> &Statement {
        match kind {
            StatementKind::AnnualIncome => &self.annual_income,
            StatementKind::AnnualBalance => &self.annual_balance,
            StatementKind::AnnualCashflow => &self.annual_cashflow,
            StatementKind::QuarterlyIncome => &self.quarterly_income,
            StatementKind::QuarterlyCashflow => &self.quarterly_cashflow,
        }
    }

    pub fn set(&mut self, kind: StatementKind, statement: Statement) {
        match kind {
            StatementKind::AnnualIncome => self.annual_income = statement,
            StatementKind::AnnualBalance => self.annual_balance = statement,
            StatementKind::AnnualCashflow => self.annual_cashflow = statement,
            StatementKind::QuarterlyIncome => self.quarterly_income = statement,
            StatementKind::QuarterlyCashflow => self.quarterly_cashflow = statement,
        }
    }
}

/// Current trading/quote fields, keyed the way the quote vendor names them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    #[serde(rename = "currentPrice", default, deserialize_with = "lenient_number")]
    pub current_price: Option<f64>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(rename = "longName", default)]
    pub long_name: Option<String>,
    #[serde(rename = "trailingPE", default, deserialize_with = "lenient_number")]
    pub trailing_pe: Option<f64>,
    #[serde(rename = "forwardPE", default, deserialize_with = "lenient_number")]
    pub forward_pe: Option<f64>,
    /// Decimal, e.g. 0.42 for 42%.
    #[serde(rename = "grossMargins", default, deserialize_with = "lenient_number")]
    pub gross_margin: Option<f64>,
    /// Currency units.
    #[serde(rename = "grossProfits", default, deserialize_with = "lenient_number")]
    pub gross_profit: Option<f64>,
    /// Decimal, e.g. 0.03 for 3%.
    #[serde(rename = "dividendYield", default, deserialize_with = "lenient_number")]
    pub dividend_yield: Option<f64>,
}

/// Outcome of looking up one canonical quantity in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedQuantity {
    Value(f64),
    Absent,
}

impl ResolvedQuantity {
    pub fn value(self) -> Option<f64> {
        match self {
            ResolvedQuantity::Value(v) => Some(v),
            ResolvedQuantity::Absent => None,
        }
    }

    pub fn is_absent(self) -> bool {
        matches!(self, ResolvedQuantity::Absent)
    }

    pub fn or_else(self, f: impl FnOnce() -> ResolvedQuantity) -> ResolvedQuantity {
        match self {
            ResolvedQuantity::Absent => f(),
            found => found,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> ResolvedQuantity {
        match self {
            ResolvedQuantity::Value(v) => ResolvedQuantity::Value(f(v)),
            ResolvedQuantity::Absent => ResolvedQuantity::Absent,
        }
    }
}

impl From<Option<f64>> for ResolvedQuantity {
    fn from(value: Option<f64>) -> Self {
        match value {
            Some(v) if v.is_finite() => ResolvedQuantity::Value(v),
            _ => ResolvedQuantity::Absent,
        }
    }
}

/// The eight standardized ratios.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Roce,
    InterestCoverage,
    GrossMargin,
    NetMargin,
    CashConversionRatio,
    GrossProfitToAssets,
    PriceEarningsRatio,
    DividendYield,
}

impl MetricKind {
    pub const ALL: [MetricKind; 8] = [
        MetricKind::Roce,
        MetricKind::InterestCoverage,
        MetricKind::GrossMargin,
        MetricKind::NetMargin,
        MetricKind::CashConversionRatio,
        MetricKind::GrossProfitToAssets,
        MetricKind::PriceEarningsRatio,
        MetricKind::DividendYield,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Roce => "ROCE",
            MetricKind::InterestCoverage => "Interest Coverage",
            MetricKind::GrossMargin => "Gross Margin",
            MetricKind::NetMargin => "Net Margin",
            MetricKind::CashConversionRatio => "Cash Conversion Ratio",
            MetricKind::GrossProfitToAssets => "Gross Profit / Assets",
            MetricKind::PriceEarningsRatio => "P/E Ratio",
            MetricKind::DividendYield => "Dividend Yield",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Ratios and descriptive fields for one company at one point in time.
///
/// Every ratio is a raw decimal or multiple. A ratio whose inputs were missing
/// is exactly `0.0` and its kind is listed in `degraded`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub name: String,
    pub country: Option<String>,
    pub price: f64,
    pub roce: f64,
    pub interest_coverage: f64,
    pub net_margin: f64,
    pub gross_margin: f64,
    pub cash_conversion_ratio: f64,
    pub gross_profit_to_assets: f64,
    pub pe_ratio: f64,
    pub dividend_yield: f64,
    #[serde(default)]
    pub degraded: Vec<MetricKind>,
}

impl MetricSet {
    pub fn value(&self, metric: MetricKind) -> f64 {
        match metric {
            MetricKind::Roce => self.roce,
            MetricKind::InterestCoverage => self.interest_coverage,
            MetricKind::GrossMargin => self.gross_margin,
            MetricKind::NetMargin => self.net_margin,
            MetricKind::CashConversionRatio => self.cash_conversion_ratio,
            MetricKind::GrossProfitToAssets => self.gross_profit_to_assets,
            MetricKind::PriceEarningsRatio => self.pe_ratio,
            MetricKind::DividendYield => self.dividend_yield,
        }
    }

    pub fn set_value(&mut self, metric: MetricKind, value: f64) {
        let slot = match metric {
            MetricKind::Roce => &mut self.roce,
            MetricKind::InterestCoverage => &mut self.interest_coverage,
            MetricKind::GrossMargin => &mut self.gross_margin,
            MetricKind::NetMargin => &mut self.net_margin,
            MetricKind::CashConversionRatio => &mut self.cash_conversion_ratio,
            MetricKind::GrossProfitToAssets => &mut self.gross_profit_to_assets,
            MetricKind::PriceEarningsRatio => &mut self.pe_ratio,
            MetricKind::DividendYield => &mut self.dividend_yield,
        };
        *slot = value;
    }

    pub fn is_degraded(&self, metric: MetricKind) -> bool {
        self.degraded.contains(&metric)
    }
}

impl Default for MetricSet {
    fn default() -> Self {
        Self {
            name: "N/A".to_string(),
            country: None,
            price: 0.0,
            roce: 0.0,
            interest_coverage: 0.0,
            net_margin: 0.0,
            gross_margin: 0.0,
            cash_conversion_ratio: 0.0,
            gross_profit_to_assets: 0.0,
            pe_ratio: 0.0,
            dividend_yield: 0.0,
            degraded: Vec::new(),
        }
    }
}

/// Composite score, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Score(u8);

impl Score {
    pub const MAX: u8 = 100;

    pub fn new(value: u8) -> Self {
        Score(value.min(Self::MAX))
    }

    /// Clamps a point total to `[0, 100]` and rounds half to even.
    /// NaN counts as zero.
    pub fn from_points(points: f64) -> Self {
        if points.is_nan() {
            return Score(0);
        }
        Score(points.clamp(0.0, Self::MAX as f64).round_ties_even() as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/100", self.0)
    }
}

/// A metric set together with the score derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub metrics: MetricSet,
    pub score: Score,
    /// Name of the scoring profile that produced `score`.
    pub profile: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_clamps_and_rounds() {
        assert_eq!(Score::from_points(-12.0).value(), 0);
        assert_eq!(Score::from_points(104.9).value(), 100);
        assert_eq!(Score::from_points(42.5).value(), 42);
        assert_eq!(Score::from_points(43.5).value(), 44);
        assert_eq!(Score::from_points(72.5).value(), 72);
        assert_eq!(Score::from_points(42.49).value(), 42);
        assert_eq!(Score::from_points(f64::NAN).value(), 0);
        assert_eq!(Score::new(250).value(), 100);
        assert_eq!(Score::new(77).to_string(), "77/100");
    }

    #[test]
    fn test_resolved_quantity_from_option() {
        assert_eq!(ResolvedQuantity::from(Some(3.0)), ResolvedQuantity::Value(3.0));
        assert_eq!(ResolvedQuantity::from(None), ResolvedQuantity::Absent);
        assert_eq!(ResolvedQuantity::from(Some(f64::NAN)), ResolvedQuantity::Absent);
    }

    #[test]
    fn test_resolved_quantity_or_else_keeps_first_value() {
        let found = ResolvedQuantity::Value(1.0).or_else(|| ResolvedQuantity::Value(2.0));
        assert_eq!(found, ResolvedQuantity::Value(1.0));
        let fallback = ResolvedQuantity::Absent.or_else(|| ResolvedQuantity::Value(2.0));
        assert_eq!(fallback, ResolvedQuantity::Value(2.0));
    }

    #[test]
    fn test_quote_snapshot_uses_vendor_keys() {
        let json = r#"{
            "currentPrice": 187.3,
            "country": "United States",
            "longName": "Example Corp",
            "trailingPE": "N/A",
            "forwardPE": 21.4,
            "grossMargins": 0.44,
            "grossProfits": null,
            "dividendYield": "0.005"
        }"#;
        let quote: QuoteSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(quote.current_price, Some(187.3));
        assert_eq!(quote.long_name.as_deref(), Some("Example Corp"));
        assert_eq!(quote.trailing_pe, None);
        assert_eq!(quote.forward_pe, Some(21.4));
        assert_eq!(quote.gross_profit, None);
        assert_eq!(quote.dividend_yield, Some(0.005));
    }

    #[test]
    fn test_quote_snapshot_missing_fields_default() {
        let quote: QuoteSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(quote, QuoteSnapshot::default());
    }

    #[test]
    fn test_metric_set_value_accessors() {
        let mut metrics = MetricSet::default();
        for (i, metric) in MetricKind::ALL.iter().enumerate() {
            metrics.set_value(*metric, i as f64);
        }
        for (i, metric) in MetricKind::ALL.iter().enumerate() {
            assert_eq!(metrics.value(*metric), i as f64);
        }
    }

    #[test]
    fn test_statement_set_missing_sections_are_empty() {
        let set: StatementSet =
            serde_json::from_str(r#"{"annual_income": {"Operating Income": [150]}}"#).unwrap();
        assert!(!set.get(StatementKind::AnnualIncome).is_empty());
        assert!(set.get(StatementKind::QuarterlyCashflow).is_empty());
    }
}
