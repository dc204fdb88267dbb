use indexmap::IndexMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// One reported figure. `None` marks a period the vendor left blank or
/// reported as something other than a finite number.
pub type Cell = Option<f64>;

/// A financial statement as reported by a data vendor.
///
/// Rows are line items keyed by their label exactly as reported (case-sensitive,
/// in reported order). Each row holds one value per reporting period, most
/// recent period first. Rows are not required to have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Statement {
    rows: IndexMap<String, Vec<Cell>>,
}

impl Statement {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style row insertion, mostly for fixtures and providers.
    ///
    /// Accepts plain `f64`s or `Option<f64>`s; non-finite values are stored as
    /// missing cells.
    pub fn with_row<I>(mut self, label: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Cell>,
    {
        self.insert_row(label, values.into_iter().map(Into::into).collect());
        self
    }

    /// Inserts or replaces a row. Replacing keeps the row's original position.
    pub fn insert_row(&mut self, label: impl Into<String>, cells: Vec<Cell>) {
        let cells = cells.into_iter().map(normalize).collect();
        self.rows.insert(label.into(), cells);
    }

    pub fn row(&self, label: &str) -> Option<&[Cell]> {
        self.rows.get(label).map(Vec::as_slice)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.rows.contains_key(label)
    }

    /// Iterates rows in reported order.
    pub fn rows(&self) -> impl Iterator<Item = (&str, &[Cell])> {
        self.rows
            .iter()
            .map(|(label, cells)| (label.as_str(), cells.as_slice()))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Number of line items.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Number of reporting periods covered by the longest row.
    pub fn period_count(&self) -> usize {
        self.rows.values().map(Vec::len).max().unwrap_or(0)
    }

    /// A statement with no line items, or with line items but no periods,
    /// carries no data and is treated the same as an absent statement.
    pub fn is_empty(&self) -> bool {
        self.period_count() == 0
    }
}

impl<L: Into<String>> FromIterator<(L, Vec<Cell>)> for Statement {
    fn from_iter<T: IntoIterator<Item = (L, Vec<Cell>)>>(iter: T) -> Self {
        let mut statement = Statement::new();
        for (label, cells) in iter {
            statement.insert_row(label, cells);
        }
        statement
    }
}

impl<'de> Deserialize<'de> for Statement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = IndexMap::<String, Vec<RawCell>>::deserialize(deserializer)?;
        Ok(raw
            .into_iter()
            .map(|(label, cells)| {
                let cells = cells.into_iter().map(RawCell::into_value).collect();
                (label, cells)
            })
            .collect())
    }
}

fn normalize(cell: Cell) -> Cell {
    cell.filter(|v| v.is_finite())
}

/// Whatever a vendor put in a numeric slot. Numbers and numeric strings are
/// kept; anything else (null, "N/A", booleans, nested objects) is missing.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawCell {
    Number(f64),
    Text(String),
    Other(IgnoredAny),
}

impl RawCell {
    fn into_value(self) -> Cell {
        let value = match self {
            RawCell::Number(v) => Some(v),
            RawCell::Text(s) => s.trim().replace(',', "").parse::<f64>().ok(),
            RawCell::Other(_) => None,
        };
        normalize(value)
    }
}

/// Serde helper for optional numeric fields that vendors fill inconsistently.
pub(crate) fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    RawCell::deserialize(deserializer).map(RawCell::into_value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_preserves_row_order() {
        let json = r#"{"Total Revenue": [10, 9], "Operating Income": [3, 2], "Net Income": [1]}"#;
        let statement: Statement = serde_json::from_str(json).unwrap();
        let labels: Vec<&str> = statement.labels().collect();
        assert_eq!(labels, vec!["Total Revenue", "Operating Income", "Net Income"]);
        assert_eq!(statement.period_count(), 2);
    }

    #[test]
    fn test_malformed_cells_become_missing() {
        let json = r#"{"Interest Expense": [null, "N/A", "1,250.5", true, 40]}"#;
        let statement: Statement = serde_json::from_str(json).unwrap();
        assert_eq!(
            statement.row("Interest Expense").unwrap(),
            &[None, None, Some(1250.5), None, Some(40.0)]
        );
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let statement = Statement::new().with_row("Total Assets", [f64::NAN, f64::INFINITY, 5.0]);
        assert_eq!(statement.row("Total Assets").unwrap(), &[None, None, Some(5.0)]);
    }

    #[test]
    fn test_empty_statement() {
        assert!(Statement::new().is_empty());
        let no_periods = Statement::new().with_row("Total Assets", Vec::<f64>::new());
        assert!(no_periods.is_empty());
        assert_eq!(no_periods.len(), 1);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let statement = Statement::new().with_row("Net Income", [1.0]);
        assert!(statement.contains("Net Income"));
        assert!(!statement.contains("net income"));
    }

    #[test]
    fn test_serialize_round_trips_missing_cells_as_null() {
        let statement = Statement::new().with_row("Net Income", [Some(1.0), None]);
        let json = serde_json::to_string(&statement).unwrap();
        assert_eq!(json, r#"{"Net Income":[1.0,null]}"#);
    }
}
