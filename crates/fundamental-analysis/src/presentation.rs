//! Display formatting for metric sets and scores.
//!
//! Nothing here feeds back into scoring; these helpers only shape values for
//! tables, summaries and colour-coded HTML cells.

use analysis_core::{Evaluation, MetricKind, MetricSet, Score};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorBand {
    Green,
    Orange,
    Red,
}

impl ColorBand {
    pub fn css(&self) -> &'static str {
        match self {
            ColorBand::Green => "#28a745",
            ColorBand::Orange => "orange",
            ColorBand::Red => "red",
        }
    }
}

/// Good/okay cut-offs in display units (percent points, or "x" for coverage).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayThreshold {
    pub good: f64,
    pub okay: f64,
}

impl DisplayThreshold {
    pub fn band(&self, display_value: f64) -> ColorBand {
        if display_value >= self.good {
            ColorBand::Green
        } else if display_value >= self.okay {
            ColorBand::Orange
        } else {
            ColorBand::Red
        }
    }
}

/// P/E is shown uncoloured.
pub fn metric_threshold(metric: MetricKind) -> Option<DisplayThreshold> {
    let (good, okay) = match metric {
        MetricKind::Roce => (15.0, 5.0),
        MetricKind::InterestCoverage => (10.0, 3.0),
        MetricKind::GrossMargin => (30.0, 15.0),
        MetricKind::NetMargin => (15.0, 5.0),
        MetricKind::CashConversionRatio => (90.0, 70.0),
        MetricKind::GrossProfitToAssets => (30.0, 10.0),
        MetricKind::DividendYield => (3.0, 1.0),
        MetricKind::PriceEarningsRatio => return None,
    };
    Some(DisplayThreshold { good, okay })
}

pub fn score_band(score: Score) -> ColorBand {
    match score.value() {
        s if s >= 80 => ColorBand::Green,
        s if s >= 50 => ColorBand::Orange,
        _ => ColorBand::Red,
    }
}

/// The number a reader sees for `value`, in the unit its threshold uses.
fn display_value(metric: MetricKind, value: f64) -> f64 {
    match metric {
        MetricKind::InterestCoverage => value.round(),
        MetricKind::PriceEarningsRatio => (value * 100.0).round() / 100.0,
        MetricKind::DividendYield => (value * 10_000.0).round() / 100.0,
        _ => (value * 100.0).round(),
    }
}

/// `None` when the metric has no threshold or is not displayed (N/A).
pub fn metric_band(metric: MetricKind, value: f64) -> Option<ColorBand> {
    if !is_displayed(metric, value) {
        return None;
    }
    metric_threshold(metric).map(|t| t.band(display_value(metric, value)))
}

fn is_displayed(metric: MetricKind, value: f64) -> bool {
    match metric {
        MetricKind::PriceEarningsRatio | MetricKind::DividendYield => value != 0.0,
        _ => true,
    }
}

/// Nearest integer, ties to even. Adding `0.0` turns `-0.0` into `0.0`.
fn whole(value: f64) -> f64 {
    value.round_ties_even() + 0.0
}

pub fn format_percent(ratio: f64) -> String {
    format!("{}%", whole(ratio * 100.0))
}

pub fn format_multiple(ratio: f64) -> String {
    format!("{}x", whole(ratio))
}

pub fn format_price(price: f64) -> String {
    format!("${:.2}", price)
}

pub fn format_pe(pe: f64) -> String {
    if pe == 0.0 {
        "N/A".to_string()
    } else {
        format!("{:.2}", pe)
    }
}

pub fn format_dividend_yield(dividend_yield: f64) -> String {
    if dividend_yield == 0.0 {
        "N/A".to_string()
    } else {
        format!("{:.2}%", dividend_yield * 100.0)
    }
}

pub fn format_score(score: Score) -> String {
    score.to_string()
}

pub fn format_metric(metric: MetricKind, value: f64) -> String {
    match metric {
        MetricKind::InterestCoverage => format_multiple(value),
        MetricKind::PriceEarningsRatio => format_pe(value),
        MetricKind::DividendYield => format_dividend_yield(value),
        _ => format_percent(value),
    }
}

pub fn colorize(text: &str, band: ColorBand) -> String {
    format!(r#"<span style="color: {}">{}</span>"#, band.css(), text)
}

/// Formatted metric, wrapped in a colour span when it has a threshold.
pub fn render_metric_html(metric: MetricKind, value: f64) -> String {
    let text = format_metric(metric, value);
    match metric_band(metric, value) {
        Some(band) => colorize(&text, band),
        None => text,
    }
}

/// One display row, keyed by column title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRow {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Company Name")]
    pub company_name: String,
    #[serde(rename = "Country")]
    pub country: Option<String>,
    #[serde(rename = "Price")]
    pub price: String,
    #[serde(rename = "Dividend Yield")]
    pub dividend_yield: String,
    #[serde(rename = "P/E Ratio")]
    pub pe_ratio: String,
    #[serde(rename = "ROCE")]
    pub roce: String,
    #[serde(rename = "Interest Coverage")]
    pub interest_coverage: String,
    #[serde(rename = "Gross Margin")]
    pub gross_margin: String,
    #[serde(rename = "Net Margin")]
    pub net_margin: String,
    #[serde(rename = "Cash Conversion Ratio (FCF)")]
    pub cash_conversion_ratio: String,
    #[serde(rename = "Gross Profit / Assets")]
    pub gross_profit_to_assets: String,
    #[serde(rename = "Score")]
    pub score: String,
}

impl ReportRow {
    pub fn plain(symbol: &str, evaluation: &Evaluation) -> Self {
        Self::build(symbol, evaluation, format_metric, format_score)
    }

    /// Metric and score cells wrapped in colour spans.
    pub fn html(symbol: &str, evaluation: &Evaluation) -> Self {
        Self::build(symbol, evaluation, render_metric_html, |score| {
            colorize(&format_score(score), score_band(score))
        })
    }

    fn build(
        symbol: &str,
        evaluation: &Evaluation,
        metric_cell: impl Fn(MetricKind, f64) -> String,
        score_cell: impl Fn(Score) -> String,
    ) -> Self {
        let metrics = &evaluation.metrics;
        let cell = |metric: MetricKind| metric_cell(metric, metrics.value(metric));
        Self {
            symbol: symbol.to_string(),
            company_name: metrics.name.clone(),
            country: metrics.country.clone(),
            price: format_price(metrics.price),
            dividend_yield: cell(MetricKind::DividendYield),
            pe_ratio: cell(MetricKind::PriceEarningsRatio),
            roce: cell(MetricKind::Roce),
            interest_coverage: cell(MetricKind::InterestCoverage),
            gross_margin: cell(MetricKind::GrossMargin),
            net_margin: cell(MetricKind::NetMargin),
            cash_conversion_ratio: cell(MetricKind::CashConversionRatio),
            gross_profit_to_assets: cell(MetricKind::GrossProfitToAssets),
            score: score_cell(evaluation.score),
        }
    }
}

/// Plain-text summary handed to downstream qualitative tooling.
pub fn build_summary(metrics: &MetricSet) -> String {
    format!(
        "ROCE: {:.2}%\n\
         Interest Coverage: {:.2}x\n\
         Gross Margin: {:.2}%\n\
         Net Margin: {:.2}%\n\
         Cash Conversion Ratio: {:.2}%\n\
         Gross Profit to Assets: {:.2}%\n\
         P/E Ratio: {:.2}\n\
         Dividend Yield: {:.2}%",
        metrics.roce * 100.0,
        metrics.interest_coverage,
        metrics.gross_margin * 100.0,
        metrics.net_margin * 100.0,
        metrics.cash_conversion_ratio * 100.0,
        metrics.gross_profit_to_assets * 100.0,
        metrics.pe_ratio,
        metrics.dividend_yield * 100.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_evaluation() -> Evaluation {
        Evaluation {
            metrics: MetricSet {
                name: "Example Corp".to_string(),
                country: Some("Canada".to_string()),
                price: 41.5,
                roce: 0.1234,
                interest_coverage: 15.4,
                net_margin: 0.04,
                gross_margin: 0.456,
                cash_conversion_ratio: 0.8,
                gross_profit_to_assets: 0.31,
                pe_ratio: 0.0,
                dividend_yield: 0.0215,
                degraded: vec![MetricKind::PriceEarningsRatio],
            },
            score: Score::new(72),
            profile: "standard".to_string(),
        }
    }

    #[test]
    fn test_formatters() {
        assert_eq!(format_percent(0.1234), "12%");
        assert_eq!(format_percent(-0.056), "-6%");
        assert_eq!(format_multiple(15.4), "15x");
        assert_eq!(format_price(41.5), "$41.50");
        assert_eq!(format_pe(0.0), "N/A");
        assert_eq!(format_pe(18.456), "18.46");
        assert_eq!(format_dividend_yield(0.0), "N/A");
        assert_eq!(format_dividend_yield(0.0215), "2.15%");
        assert_eq!(format_score(Score::new(64)), "64/100");
    }

    #[test]
    fn test_small_negatives_format_without_sign() {
        assert_eq!(format_percent(-0.001), "0%");
        assert_eq!(format_percent(-0.0), "0%");
        assert_eq!(format_multiple(-0.4), "0x");
    }

    #[test]
    fn test_whole_number_formats_round_ties_to_even() {
        assert_eq!(format_percent(0.125), "12%");
        assert_eq!(format_multiple(2.5), "2x");
        assert_eq!(format_multiple(3.5), "4x");
    }

    #[test]
    fn test_score_bands() {
        assert_eq!(score_band(Score::new(80)), ColorBand::Green);
        assert_eq!(score_band(Score::new(79)), ColorBand::Orange);
        assert_eq!(score_band(Score::new(50)), ColorBand::Orange);
        assert_eq!(score_band(Score::new(49)), ColorBand::Red);
    }

    #[test]
    fn test_metric_bands_use_displayed_value() {
        assert_eq!(metric_band(MetricKind::Roce, 0.15), Some(ColorBand::Green));
        // 14.6% displays as 15%
        assert_eq!(metric_band(MetricKind::Roce, 0.146), Some(ColorBand::Green));
        assert_eq!(metric_band(MetricKind::Roce, 0.05), Some(ColorBand::Orange));
        assert_eq!(metric_band(MetricKind::Roce, 0.01), Some(ColorBand::Red));
        assert_eq!(metric_band(MetricKind::InterestCoverage, 3.0), Some(ColorBand::Orange));
        assert_eq!(metric_band(MetricKind::CashConversionRatio, 0.95), Some(ColorBand::Green));
        assert_eq!(metric_band(MetricKind::DividendYield, 0.0), None);
        assert_eq!(metric_band(MetricKind::PriceEarningsRatio, 12.0), None);
    }

    #[test]
    fn test_colorize() {
        assert_eq!(
            colorize("15%", ColorBand::Green),
            r#"<span style="color: #28a745">15%</span>"#
        );
    }

    #[test]
    fn test_plain_report_row() {
        let row = ReportRow::plain("EXM", &sample_evaluation());
        assert_eq!(row.company_name, "Example Corp");
        assert_eq!(row.price, "$41.50");
        assert_eq!(row.roce, "12%");
        assert_eq!(row.interest_coverage, "15x");
        assert_eq!(row.gross_margin, "46%");
        assert_eq!(row.pe_ratio, "N/A");
        assert_eq!(row.dividend_yield, "2.15%");
        assert_eq!(row.score, "72/100");
    }

    #[test]
    fn test_report_row_serializes_with_column_titles() {
        let row = ReportRow::plain("EXM", &sample_evaluation());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["Symbol"], "EXM");
        assert_eq!(json["Cash Conversion Ratio (FCF)"], "80%");
        assert_eq!(json["Gross Profit / Assets"], "31%");
    }

    #[test]
    fn test_html_report_row() {
        let row = ReportRow::html("EXM", &sample_evaluation());
        assert_eq!(row.net_margin, r#"<span style="color: red">4%</span>"#);
        assert_eq!(row.pe_ratio, "N/A");
        assert_eq!(row.score, r#"<span style="color: orange">72/100</span>"#);
    }

    #[test]
    fn test_build_summary() {
        let summary = build_summary(&sample_evaluation().metrics);
        let lines: Vec<&str> = summary.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "ROCE: 12.34%");
        assert_eq!(lines[1], "Interest Coverage: 15.40x");
        assert_eq!(lines[7], "Dividend Yield: 2.15%");
    }
}
