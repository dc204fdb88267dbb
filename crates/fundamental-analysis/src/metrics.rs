use analysis_core::{MetricKind, MetricSet, QuoteSnapshot, ResolvedQuantity, Statement, StatementSet};

use crate::aliases::{
    CURRENT_LIABILITIES, INTEREST_EXPENSE, NET_INCOME, OPERATING_CASH_FLOW, OPERATING_INCOME,
    REVENUE, TOTAL_ASSETS,
};
use crate::resolver::{resolve, resolve_at, resolve_recent_sum, LabelQuery, Period};

/// Quarters summed for trailing-twelve-month figures.
pub const TTM_QUARTERS: usize = 4;

/// Derives the eight ratios from statement tables and a quote snapshot.
///
/// Every `calculate_*` method returns `None` when an input is absent, a
/// denominator is zero, or the result is not finite. `evaluate` maps `None`
/// to `0.0` and records the metric as degraded.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricCalculator;

impl MetricCalculator {
    pub fn new() -> Self {
        Self
    }

    /// EBIT / (Total Assets - Current Liabilities), all from the same year.
    pub fn calculate_roce(&self, statements: &StatementSet) -> Option<f64> {
        let [ebit, total_assets, current_liabilities] = same_period([
            (&statements.annual_income, &OPERATING_INCOME),
            (&statements.annual_balance, &TOTAL_ASSETS),
            (&statements.annual_balance, &CURRENT_LIABILITIES),
        ])?;
        let capital_employed = total_assets - current_liabilities;
        safe_ratio(ResolvedQuantity::Value(ebit), ResolvedQuantity::Value(capital_employed))
    }

    /// EBIT / |Interest Expense|
    pub fn calculate_interest_coverage(&self, statements: &StatementSet) -> Option<f64> {
        let ebit = resolve(&statements.annual_income, &OPERATING_INCOME);
        // Vendors disagree on the sign of expense rows.
        let interest = resolve(&statements.annual_income, &INTEREST_EXPENSE).map(f64::abs);
        safe_ratio(ebit, interest)
    }

    /// Net Income / Revenue for the newest quarter reporting both.
    pub fn calculate_net_margin(&self, statements: &StatementSet) -> Option<f64> {
        let [net_income, revenue] = same_period([
            (&statements.quarterly_income, &NET_INCOME),
            (&statements.quarterly_income, &REVENUE),
        ])?;
        safe_ratio(ResolvedQuantity::Value(net_income), ResolvedQuantity::Value(revenue))
    }

    /// Operating cash flow / net income over the same window.
    ///
    /// Uses the trailing four quarters when the quarterly cash-flow statement
    /// reports operating cash flow, otherwise the latest annual figures.
    pub fn calculate_cash_conversion(&self, statements: &StatementSet) -> Option<f64> {
        let ttm_ocf = resolve_recent_sum(&statements.quarterly_cashflow, &OPERATING_CASH_FLOW, TTM_QUARTERS);
        if !ttm_ocf.is_absent() {
            let ttm_net_income = resolve_recent_sum(&statements.quarterly_income, &NET_INCOME, TTM_QUARTERS);
            return safe_ratio(ttm_ocf, ttm_net_income);
        }

        let annual_ocf = resolve(&statements.annual_cashflow, &OPERATING_CASH_FLOW);
        let annual_net_income = resolve(&statements.annual_income, &NET_INCOME);
        safe_ratio(annual_ocf, annual_net_income)
    }

    pub fn calculate_gross_profit_to_assets(&self, statements: &StatementSet, quote: &QuoteSnapshot) -> Option<f64> {
        let gross_profit = ResolvedQuantity::from(quote.gross_profit);
        let total_assets = resolve(&statements.annual_balance, &TOTAL_ASSETS);
        safe_ratio(gross_profit, total_assets)
    }

    /// Trailing P/E, else forward P/E. A zero P/E means "not reported".
    pub fn calculate_pe_ratio(&self, quote: &QuoteSnapshot) -> Option<f64> {
        let reported = |pe: Option<f64>| pe.filter(|v| v.is_finite() && *v != 0.0);
        reported(quote.trailing_pe).or_else(|| reported(quote.forward_pe))
    }

    pub fn calculate_gross_margin(&self, quote: &QuoteSnapshot) -> Option<f64> {
        quote.gross_margin.filter(|v| v.is_finite())
    }

    pub fn calculate_dividend_yield(&self, quote: &QuoteSnapshot) -> Option<f64> {
        quote.dividend_yield.filter(|v| v.is_finite())
    }

    /// Produces a complete metric set. Never fails: every ratio that cannot
    /// be computed is `0.0`.
    pub fn evaluate(&self, statements: &StatementSet, quote: &QuoteSnapshot) -> MetricSet {
        let mut metrics = MetricSet {
            name: quote.long_name.clone().unwrap_or_else(|| "N/A".to_string()),
            country: quote.country.clone(),
            price: quote.current_price.filter(|p| p.is_finite()).unwrap_or(0.0),
            ..MetricSet::default()
        };

        for metric in MetricKind::ALL {
            let computed = match metric {
                MetricKind::Roce => self.calculate_roce(statements),
                MetricKind::InterestCoverage => self.calculate_interest_coverage(statements),
                MetricKind::GrossMargin => self.calculate_gross_margin(quote),
                MetricKind::NetMargin => self.calculate_net_margin(statements),
                MetricKind::CashConversionRatio => self.calculate_cash_conversion(statements),
                MetricKind::GrossProfitToAssets => self.calculate_gross_profit_to_assets(statements, quote),
                MetricKind::PriceEarningsRatio => self.calculate_pe_ratio(quote),
                MetricKind::DividendYield => self.calculate_dividend_yield(quote),
            };

            match computed {
                Some(value) => metrics.set_value(metric, value),
                None => {
                    tracing::debug!(metric = %metric, "inputs unavailable, ratio set to 0");
                    metrics.degraded.push(metric);
                }
            }
        }

        metrics
    }
}

/// Resolves every lookup in the newest period where all of them have a value.
fn same_period<const N: usize>(lookups: [(&Statement, &LabelQuery<'_>); N]) -> Option<[f64; N]> {
    let periods = lookups
        .iter()
        .map(|(statement, _)| statement.period_count())
        .max()
        .unwrap_or(0);

    (0..periods).find_map(|index| {
        let mut values = [0.0; N];
        for (slot, (statement, query)) in values.iter_mut().zip(&lookups) {
            *slot = resolve_at(statement, query, Period::Exact(index)).value()?;
        }
        Some(values)
    })
}

/// numerator / denominator, or `None` if either side is absent, the
/// denominator is zero, or the quotient is not finite.
pub fn safe_ratio(numerator: ResolvedQuantity, denominator: ResolvedQuantity) -> Option<f64> {
    let numerator = numerator.value()?;
    let denominator = denominator.value()?;
    if denominator == 0.0 {
        return None;
    }
    let ratio = numerator / denominator;
    ratio.is_finite().then_some(ratio)
}
