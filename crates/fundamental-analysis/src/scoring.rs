//! Composite 0-100 score.
//!
//! Each metric earns `clamp(attainment * max_points, 0, max_points)` where
//! attainment is `value / target` (or `target / value` for metrics where
//! lower is better). The per-metric points are summed, clamped to `[0, 100]`
//! and rounded. Weight tables are compile-time profiles selected by name.

use analysis_core::{MetricKind, MetricSet, Score};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    HigherIsBetter,
    /// Cheaper is better. A value of exactly 0 means "unknown" and earns nothing.
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricWeight {
    pub metric: MetricKind,
    pub target: f64,
    pub max_points: f64,
    pub direction: Direction,
}

impl MetricWeight {
    const fn higher(metric: MetricKind, target: f64, max_points: f64) -> Self {
        Self {
            metric,
            target,
            max_points,
            direction: Direction::HigherIsBetter,
        }
    }

    const fn lower(metric: MetricKind, target: f64, max_points: f64) -> Self {
        Self {
            metric,
            target,
            max_points,
            direction: Direction::LowerIsBetter,
        }
    }

    /// Points earned by `value`, always within `[0, max_points]`.
    pub fn contribution(&self, value: f64) -> f64 {
        if !value.is_finite() {
            return 0.0;
        }
        let attainment = match self.direction {
            Direction::HigherIsBetter => value / self.target,
            Direction::LowerIsBetter if value == 0.0 => 0.0,
            Direction::LowerIsBetter => self.target / value,
        };
        (attainment * self.max_points).clamp(0.0, self.max_points)
    }
}

/// One metric's share of a score, for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Contribution {
    pub metric: MetricKind,
    pub value: f64,
    pub points: f64,
    pub max_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringProfile {
    pub name: &'static str,
    pub description: &'static str,
    pub weights: [MetricWeight; 8],
}

pub static STANDARD: ScoringProfile = ScoringProfile {
    name: "standard",
    description: "Capital efficiency and interest cover dominate; margins, cash conversion, asset productivity, valuation and yield round it out.",
    weights: [
        MetricWeight::higher(MetricKind::Roce, 0.15, 30.0),
        MetricWeight::higher(MetricKind::InterestCoverage, 10.0, 30.0),
        MetricWeight::higher(MetricKind::GrossMargin, 0.40, 10.0),
        MetricWeight::higher(MetricKind::NetMargin, 0.15, 10.0),
        MetricWeight::higher(MetricKind::CashConversionRatio, 0.90, 5.0),
        MetricWeight::higher(MetricKind::GrossProfitToAssets, 0.30, 5.0),
        MetricWeight::lower(MetricKind::PriceEarningsRatio, 20.0, 5.0),
        MetricWeight::higher(MetricKind::DividendYield, 0.03, 5.0),
    ],
};

pub static MARGIN_HEAVY: ScoringProfile = ScoringProfile {
    name: "margin-heavy",
    description: "Standard table with gross and net margin capped at 15 points each; the total still saturates at 100.",
    weights: [
        MetricWeight::higher(MetricKind::Roce, 0.15, 30.0),
        MetricWeight::higher(MetricKind::InterestCoverage, 10.0, 30.0),
        MetricWeight::higher(MetricKind::GrossMargin, 0.40, 15.0),
        MetricWeight::higher(MetricKind::NetMargin, 0.15, 15.0),
        MetricWeight::higher(MetricKind::CashConversionRatio, 0.90, 5.0),
        MetricWeight::higher(MetricKind::GrossProfitToAssets, 0.30, 5.0),
        MetricWeight::lower(MetricKind::PriceEarningsRatio, 20.0, 5.0),
        MetricWeight::higher(MetricKind::DividendYield, 0.03, 5.0),
    ],
};

static PROFILES: [&ScoringProfile; 2] = [&STANDARD, &MARGIN_HEAVY];

impl ScoringProfile {
    pub fn standard() -> &'static ScoringProfile {
        &STANDARD
    }

    pub fn all() -> &'static [&'static ScoringProfile] {
        &PROFILES
    }

    pub fn by_name(name: &str) -> Option<&'static ScoringProfile> {
        PROFILES
            .iter()
            .copied()
            .find(|profile| profile.name.eq_ignore_ascii_case(name.trim()))
    }

    pub fn weight(&self, metric: MetricKind) -> Option<&MetricWeight> {
        self.weights.iter().find(|w| w.metric == metric)
    }

    /// Sum of all caps; may exceed 100.
    pub fn max_points(&self) -> f64 {
        self.weights.iter().map(|w| w.max_points).sum()
    }

    pub fn breakdown(&self, metrics: &MetricSet) -> Vec<Contribution> {
        self.weights
            .iter()
            .map(|weight| {
                let value = metrics.value(weight.metric);
                Contribution {
                    metric: weight.metric,
                    value,
                    points: weight.contribution(value),
                    max_points: weight.max_points,
                }
            })
            .collect()
    }

    pub fn score(&self, metrics: &MetricSet) -> Score {
        let total: f64 = self
            .weights
            .iter()
            .map(|weight| weight.contribution(metrics.value(weight.metric)))
            .sum();
        Score::from_points(total)
    }
}

/// Scores with the standard profile.
pub fn score(metrics: &MetricSet) -> Score {
    STANDARD.score(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn at_target() -> MetricSet {
        MetricSet {
            roce: 0.15,
            interest_coverage: 10.0,
            gross_margin: 0.40,
            net_margin: 0.15,
            cash_conversion_ratio: 0.90,
            gross_profit_to_assets: 0.30,
            pe_ratio: 20.0,
            dividend_yield: 0.03,
            ..MetricSet::default()
        }
    }

    fn metric_set_from(values: [f64; 8]) -> MetricSet {
        let mut metrics = MetricSet::default();
        for (metric, value) in MetricKind::ALL.into_iter().zip(values) {
            metrics.set_value(metric, value);
        }
        metrics
    }

    #[test]
    fn test_standard_caps_sum_to_100() {
        assert_relative_eq!(STANDARD.max_points(), 100.0);
        assert_relative_eq!(MARGIN_HEAVY.max_points(), 110.0);
    }

    #[test]
    fn test_every_metric_weighted_once() {
        for profile in ScoringProfile::all() {
            for metric in MetricKind::ALL {
                let count = profile.weights.iter().filter(|w| w.metric == metric).count();
                assert_eq!(count, 1, "{} weights {metric} {count} times", profile.name);
            }
        }
    }

    #[test]
    fn test_all_targets_met_scores_100() {
        assert_eq!(score(&at_target()).value(), 100);
    }

    #[test]
    fn test_empty_metrics_score_zero() {
        assert_eq!(score(&MetricSet::default()).value(), 0);
    }

    #[test]
    fn test_contribution_saturates_at_cap() {
        let roce = STANDARD.weight(MetricKind::Roce).unwrap();
        assert_relative_eq!(roce.contribution(0.075), 15.0);
        assert_relative_eq!(roce.contribution(0.15), 30.0);
        assert_relative_eq!(roce.contribution(0.90), 30.0);
        assert_relative_eq!(roce.contribution(-0.2), 0.0);
    }

    #[test]
    fn test_interest_coverage_above_target_is_capped() {
        let coverage = STANDARD.weight(MetricKind::InterestCoverage).unwrap();
        assert_relative_eq!(coverage.contribution(15.0), 30.0);
    }

    #[test]
    fn test_pe_is_inverted() {
        let pe = STANDARD.weight(MetricKind::PriceEarningsRatio).unwrap();
        assert_relative_eq!(pe.contribution(0.0), 0.0);
        assert_relative_eq!(pe.contribution(10.0), 5.0);
        assert_relative_eq!(pe.contribution(20.0), 5.0);
        assert_relative_eq!(pe.contribution(40.0), 2.5);
        assert_relative_eq!(pe.contribution(-15.0), 0.0);
    }

    #[test]
    fn test_non_finite_values_earn_nothing() {
        let gross = STANDARD.weight(MetricKind::GrossMargin).unwrap();
        assert_eq!(gross.contribution(f64::NAN), 0.0);
        assert_eq!(gross.contribution(f64::INFINITY), 0.0);
    }

    #[test]
    fn test_rounding() {
        // 0.1 / 0.15 * 30 = 20.0; 0.02 / 0.03 * 5 = 3.333...
        let metrics = MetricSet {
            roce: 0.1,
            dividend_yield: 0.02,
            ..MetricSet::default()
        };
        assert_eq!(score(&metrics).value(), 23);
    }

    #[test]
    fn test_half_point_totals_round_to_even() {
        // 30 + 30 + 10 + 20 / 40 * 5 = 72.5
        let metrics = MetricSet {
            roce: 0.15,
            interest_coverage: 30.0,
            gross_margin: 0.5,
            pe_ratio: 40.0,
            ..MetricSet::default()
        };
        assert_eq!(score(&metrics).value(), 72);
        // 30 + 30 + 15 + 2.5 = 77.5
        assert_eq!(MARGIN_HEAVY.score(&metrics).value(), 78);
    }

    #[test]
    fn test_margin_heavy_profile_clamps_total() {
        let metrics = at_target();
        assert_eq!(MARGIN_HEAVY.score(&metrics).value(), 100);
        let margins_only = MetricSet {
            gross_margin: 0.40,
            net_margin: 0.15,
            ..MetricSet::default()
        };
        assert_eq!(STANDARD.score(&margins_only).value(), 20);
        assert_eq!(MARGIN_HEAVY.score(&margins_only).value(), 30);
    }

    #[test]
    fn test_profile_lookup() {
        assert_eq!(ScoringProfile::by_name("standard").map(|p| p.name), Some("standard"));
        assert_eq!(ScoringProfile::by_name(" Margin-Heavy ").map(|p| p.name), Some("margin-heavy"));
        assert!(ScoringProfile::by_name("aggressive").is_none());
    }

    #[test]
    fn test_breakdown_matches_score() {
        let metrics = MetricSet {
            roce: 0.05,
            interest_coverage: 4.0,
            gross_margin: 0.2,
            pe_ratio: 25.0,
            ..MetricSet::default()
        };
        let breakdown = STANDARD.breakdown(&metrics);
        assert_eq!(breakdown.len(), 8);
        let total: f64 = breakdown.iter().map(|c| c.points).sum();
        assert_eq!(Score::from_points(total), score(&metrics));
    }

    proptest! {
        #[test]
        fn prop_score_is_bounded(values in prop::array::uniform8(-1.0e6f64..1.0e6)) {
            let metrics = metric_set_from(values);
            for profile in ScoringProfile::all() {
                prop_assert!(profile.score(&metrics).value() <= 100);
            }
        }

        #[test]
        fn prop_contribution_within_cap(value in -1.0e6f64..1.0e6) {
            for weight in STANDARD.weights.iter() {
                let points = weight.contribution(value);
                prop_assert!((0.0..=weight.max_points).contains(&points));
            }
        }

        #[test]
        fn prop_contribution_monotonic(a in -10.0f64..100.0, b in -10.0f64..100.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            for weight in STANDARD.weights.iter() {
                match weight.direction {
                    Direction::HigherIsBetter => {
                        prop_assert!(weight.contribution(low) <= weight.contribution(high));
                    }
                    // Monotone on the positive range; 0 and negatives mean "unknown".
                    Direction::LowerIsBetter if low > 0.0 => {
                        prop_assert!(weight.contribution(low) >= weight.contribution(high));
                    }
                    Direction::LowerIsBetter => {}
                }
            }
        }

        #[test]
        fn prop_constant_beyond_target(extra in 0.0f64..1.0e4) {
            for weight in STANDARD.weights.iter().filter(|w| w.direction == Direction::HigherIsBetter) {
                prop_assert_eq!(weight.contribution(weight.target + extra), weight.max_points);
            }
        }
    }
}
