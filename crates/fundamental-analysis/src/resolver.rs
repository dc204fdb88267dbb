//! Canonical-quantity lookup against vendor statements.
//!
//! Vendors label the same line item differently ("Interest Expense",
//! "Interest Expense Non Operating", ...). A [`LabelQuery`] lists the known
//! labels in priority order and optionally a keyword scan used when none of
//! them yields a usable value. Explicit aliases always win over the scan.

use analysis_core::{Cell, ResolvedQuantity, Statement};

/// Last-resort scan over every row label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstringFallback<'a> {
    /// Case-insensitive substring the label must contain.
    pub keyword: &'a str,
    /// Case-insensitive substring that disqualifies a label.
    pub exclude: Option<&'a str>,
}

impl SubstringFallback<'_> {
    pub fn matches(&self, label: &str) -> bool {
        let label = label.to_lowercase();
        if !label.contains(&self.keyword.to_lowercase()) {
            return false;
        }
        match self.exclude {
            Some(exclude) => !label.contains(&exclude.to_lowercase()),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelQuery<'a> {
    /// Exact row labels, highest priority first.
    pub aliases: &'a [&'a str],
    /// Treat zero like a missing cell and keep searching.
    pub require_non_zero: bool,
    pub fallback: Option<SubstringFallback<'a>>,
}

impl<'a> LabelQuery<'a> {
    pub const fn new(aliases: &'a [&'a str]) -> Self {
        Self {
            aliases,
            require_non_zero: false,
            fallback: None,
        }
    }

    pub const fn non_zero(mut self) -> Self {
        self.require_non_zero = true;
        self
    }

    pub const fn with_fallback(mut self, keyword: &'a str, exclude: Option<&'a str>) -> Self {
        self.fallback = Some(SubstringFallback { keyword, exclude });
        self
    }

    fn accepts(&self, value: f64) -> bool {
        !self.require_non_zero || value != 0.0
    }
}

/// Which reporting period a lookup reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Period {
    /// Newest usable value, scanning back through older periods.
    #[default]
    MostRecent,
    /// Exactly this period (0 = most recent); no scanning.
    Exact(usize),
}

/// Resolves `query` to the most recent usable value.
pub fn resolve(statement: &Statement, query: &LabelQuery<'_>) -> ResolvedQuantity {
    resolve_at(statement, query, Period::MostRecent)
}

pub fn resolve_at(statement: &Statement, query: &LabelQuery<'_>, period: Period) -> ResolvedQuantity {
    search(statement, query, |cells| match period {
        Period::MostRecent => cells
            .iter()
            .flatten()
            .copied()
            .find(|v| query.accepts(*v)),
        Period::Exact(index) => cells
            .get(index)
            .copied()
            .flatten()
            .filter(|v| query.accepts(*v)),
    })
}

/// Sums the newest `periods` cells of the first matching row that has any
/// values in that window. Missing cells inside the window are skipped.
pub fn resolve_recent_sum(statement: &Statement, query: &LabelQuery<'_>, periods: usize) -> ResolvedQuantity {
    search(statement, query, |cells| {
        let window: Vec<f64> = cells.iter().take(periods).flatten().copied().collect();
        if window.is_empty() {
            return None;
        }
        let total: f64 = window.iter().sum();
        (total.is_finite() && query.accepts(total)).then_some(total)
    })
}

fn search<F>(statement: &Statement, query: &LabelQuery<'_>, pick: F) -> ResolvedQuantity
where
    F: Fn(&[Cell]) -> Option<f64>,
{
    if statement.is_empty() {
        return ResolvedQuantity::Absent;
    }

    let from_alias = query
        .aliases
        .iter()
        .filter_map(|alias| statement.row(alias))
        .find_map(&pick);
    if let Some(value) = from_alias {
        return ResolvedQuantity::Value(value);
    }

    let Some(fallback) = query.fallback else {
        return ResolvedQuantity::Absent;
    };
    statement
        .rows()
        .filter(|(label, _)| fallback.matches(label))
        .find_map(|(_, cells)| pick(cells))
        .into()
}
