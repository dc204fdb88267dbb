use analysis_core::{AnalysisError, QuoteSnapshot, Statement, StatementKind, StatementProvider, StatementSet};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use crate::DataSource;

/// Everything stored for one issuer: a quote plus its statement tables.
///
/// On disk this is `{ "quote": {...}, "statements": { "annual_income": {...}, ... } }`.
/// Both sections, and every statement inside `statements`, are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssuerData {
    #[serde(default)]
    pub quote: QuoteSnapshot,
    #[serde(default)]
    pub statements: StatementSet,
}

#[derive(Debug)]
struct CachedIssuer {
    modified: SystemTime,
    data: Arc<IssuerData>,
}

type IssuerSlot = Arc<tokio::sync::Mutex<Option<CachedIssuer>>>;

/// Reads `<root>/<SYMBOL>.json`, one file per issuer.
///
/// A file is parsed once per modification time and shared by every fetch
/// for that symbol, so the six concurrent fetches of one evaluation parse
/// it once. Fetches for the same symbol wait on each other while it loads.
#[derive(Debug, Clone)]
pub struct JsonStatementProvider {
    root: PathBuf,
    cache: Arc<Mutex<HashMap<PathBuf, IssuerSlot>>>,
}

impl JsonStatementProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: Arc::default(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, symbol: &str) -> Result<PathBuf, AnalysisError> {
        let valid = !symbol.is_empty()
            && symbol
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
            && !symbol.starts_with('.');
        if !valid {
            return Err(AnalysisError::InvalidData(format!("Invalid symbol: {symbol:?}")));
        }
        Ok(self.root.join(format!("{}.json", symbol.to_uppercase())))
    }

    fn slot(&self, path: &Path) -> IssuerSlot {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(path.to_path_buf()).or_default())
    }

    async fn load(&self, symbol: &str) -> Result<Arc<IssuerData>, AnalysisError> {
        let path = self.path_for(symbol)?;
        let slot = self.slot(&path);
        let mut cached = slot.lock().await;

        let not_found = |e: std::io::Error| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AnalysisError::SymbolNotFound(symbol.to_string())
            } else {
                e.into()
            }
        };
        let modified = tokio::fs::metadata(&path).await.map_err(not_found)?.modified()?;
        if let Some(entry) = cached.as_ref() {
            if entry.modified == modified {
                return Ok(Arc::clone(&entry.data));
            }
        }

        let raw = tokio::fs::read_to_string(&path).await.map_err(not_found)?;
        let data = Arc::new(serde_json::from_str::<IssuerData>(&raw)?);
        tracing::debug!("Loaded issuer data from {}", path.display());
        *cached = Some(CachedIssuer {
            modified,
            data: Arc::clone(&data),
        });
        Ok(data)
    }
}

#[async_trait]
impl StatementProvider for JsonStatementProvider {
    async fn fetch_statement(&self, symbol: &str, kind: StatementKind) -> Result<Statement, AnalysisError> {
        let data = self.load(symbol).await?;
        Ok(data.statements.get(kind).clone())
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, AnalysisError> {
        Ok(self.load(symbol).await?.quote.clone())
    }
}

/// Fixed issuer data held in memory. Symbols are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStatementProvider {
    issuers: HashMap<String, IssuerData>,
    failing: HashSet<(String, DataSource)>,
}

impl InMemoryStatementProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issuer(mut self, symbol: &str, data: IssuerData) -> Self {
        self.issuers.insert(symbol.to_uppercase(), data);
        self
    }

    /// Makes every fetch of `source` for `symbol` fail with a provider error.
    pub fn with_failure(mut self, symbol: &str, source: DataSource) -> Self {
        self.failing.insert((symbol.to_uppercase(), source));
        self
    }

    fn lookup(&self, symbol: &str, source: DataSource) -> Result<&IssuerData, AnalysisError> {
        let key = symbol.to_uppercase();
        if self.failing.contains(&(key.clone(), source)) {
            return Err(AnalysisError::Provider(format!("{source} unavailable for {key}")));
        }
        self.issuers
            .get(&key)
            .ok_or_else(|| AnalysisError::SymbolNotFound(symbol.to_string()))
    }
}

#[async_trait]
impl StatementProvider for InMemoryStatementProvider {
    async fn fetch_statement(&self, symbol: &str, kind: StatementKind) -> Result<Statement, AnalysisError> {
        let data = self.lookup(symbol, DataSource::Statement(kind))?;
        Ok(data.statements.get(kind).clone())
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<QuoteSnapshot, AnalysisError> {
        Ok(self.lookup(symbol, DataSource::Quote)?.quote.clone())
    }
}
