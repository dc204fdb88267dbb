//! Ticker registry backing symbol autocomplete.
//!
//! Loaded once at startup from a CSV with `Symbol`, `Name`, `Market Cap`
//! and `Country` columns. Extra columns are ignored.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

pub const SEARCH_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TickerRecord {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Market Cap", default, deserialize_with = "csv::invalid_option")]
    pub market_cap: Option<f64>,
    #[serde(rename = "Country", default)]
    pub country: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerMatch {
    pub symbol: String,
    pub name: String,
    pub country_short: String,
}

#[derive(Debug, Clone, Default)]
pub struct TickerRegistry {
    records: Vec<TickerRecord>,
}

impl TickerRegistry {
    pub fn new(records: Vec<TickerRecord>) -> Self {
        Self { records }
    }

    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let records = reader
            .deserialize()
            .collect::<Result<Vec<TickerRecord>, _>>()
            .context("Failed to parse ticker CSV")?;
        Ok(Self::new(records))
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open ticker CSV {}", path.display()))?;
        Self::from_reader(file)
    }

    /// A missing file is not fatal: search simply returns nothing.
    pub fn load_or_empty(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!("Ticker CSV {} not found, symbol search disabled", path.display());
            return Ok(Self::default());
        }
        let registry = Self::load(path)?;
        tracing::info!("Loaded {} tickers from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Case-insensitive match on symbol or name. Prefix matches come first,
    /// then substring matches; each group is ordered by market cap, largest
    /// first, with unknown caps last.
    pub fn search(&self, query: &str, limit: usize) -> Vec<TickerMatch> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return Vec::new();
        }

        let mut starts_with = Vec::new();
        let mut contains = Vec::new();
        for record in &self.records {
            let symbol = record.symbol.to_lowercase();
            let name = record.name.to_lowercase();
            if symbol.starts_with(&query) || name.starts_with(&query) {
                starts_with.push(record);
            } else if symbol.contains(&query) || name.contains(&query) {
                contains.push(record);
            }
        }

        by_market_cap_desc(&mut starts_with);
        by_market_cap_desc(&mut contains);

        starts_with
            .into_iter()
            .chain(contains)
            .take(limit)
            .map(|record| TickerMatch {
                symbol: record.symbol.clone(),
                name: record.name.clone(),
                country_short: country_short(record.country.as_deref()),
            })
            .collect()
    }
}

fn by_market_cap_desc(records: &mut [&TickerRecord]) {
    records.sort_by(|a, b| match (a.market_cap, b.market_cap) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

pub fn country_short(country: Option<&str>) -> String {
    match country.map(str::trim) {
        None | Some("") => String::new(),
        Some(c) if c.eq_ignore_ascii_case("canada") => "CAD".to_string(),
        Some(c) if c.eq_ignore_ascii_case("united states") => "USA".to_string(),
        Some(c) => c.chars().take(3).collect::<String>().to_uppercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
Symbol,Name,Market Cap,Country
RY,Royal Bank of Canada,180000000000,Canada
ROK,Rockwell Automation,30000000000,United States
BRK,Broker Holdings,n/a,Germany
AAPL,Apple Inc.,3000000000000,United States
CROX,Crocs Inc.,6000000000,United States
MRO,Marathon Oil,15000000000,
";

    fn registry() -> TickerRegistry {
        TickerRegistry::from_reader(CSV.as_bytes()).unwrap()
    }

    #[test]
    fn test_parses_csv_with_bad_market_cap() {
        let registry = registry();
        assert_eq!(registry.len(), 6);
        let broker = registry.records.iter().find(|r| r.symbol == "BRK").unwrap();
        assert_eq!(broker.market_cap, None);
    }

    #[test]
    fn test_prefix_matches_before_substring_matches() {
        let symbols: Vec<String> = registry()
            .search("ro", SEARCH_LIMIT)
            .into_iter()
            .map(|m| m.symbol)
            .collect();
        // Prefix: RY (name), ROK. Contains: BRK (no cap, last), CROX, MRO.
        assert_eq!(symbols, vec!["RY", "ROK", "MRO", "CROX", "BRK"]);
    }

    #[test]
    fn test_search_is_case_insensitive_and_limited() {
        let matches = registry().search("  RO ", 2);
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].name, "Royal Bank of Canada");
        assert_eq!(matches[0].country_short, "CAD");
        assert_eq!(matches[1].country_short, "USA");
    }

    #[test]
    fn test_empty_query() {
        assert!(registry().search("   ", SEARCH_LIMIT).is_empty());
    }

    #[test]
    fn test_country_short() {
        assert_eq!(country_short(Some("Canada")), "CAD");
        assert_eq!(country_short(Some("united states")), "USA");
        assert_eq!(country_short(Some("Germany")), "GER");
        assert_eq!(country_short(Some("UK")), "UK");
        assert_eq!(country_short(None), "");
    }

    #[test]
    fn test_missing_file_yields_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = TickerRegistry::load_or_empty(&dir.path().join("tickers.csv")).unwrap();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tickers.csv");
        std::fs::write(&path, CSV).unwrap();
        assert_eq!(TickerRegistry::load_or_empty(&path).unwrap().len(), 6);
    }
}
