use anyhow::{anyhow, Context};
use fundamental_analysis::ScoringProfile;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Server settings, read from the environment (after `.env`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// Root of the `<SYMBOL>.json` statement files.
    pub statement_data_dir: PathBuf,
    pub tickers_csv: PathBuf,
    pub scoring_profile: &'static ScoringProfile,
    pub screen_concurrency: usize,
    pub screen_max_symbols: usize,
    pub provider_max_attempts: u32,
    pub provider_retry_backoff: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".to_string(),
            statement_data_dir: PathBuf::from("./data/statements"),
            tickers_csv: PathBuf::from("./tickers.csv"),
            scoring_profile: ScoringProfile::standard(),
            screen_concurrency: 4,
            screen_max_symbols: 100,
            provider_max_attempts: 3,
            provider_retry_backoff: Duration::from_millis(250),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let scoring_profile = match var("SCORING_PROFILE") {
            Some(name) => ScoringProfile::by_name(&name).ok_or_else(|| {
                let known: Vec<&str> = ScoringProfile::all().iter().map(|p| p.name).collect();
                anyhow!("Unknown SCORING_PROFILE '{}' (expected one of: {})", name, known.join(", "))
            })?,
            None => defaults.scoring_profile,
        };

        Ok(Self {
            bind_addr: var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            statement_data_dir: var("STATEMENT_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.statement_data_dir),
            tickers_csv: var("TICKERS_CSV").map(PathBuf::from).unwrap_or(defaults.tickers_csv),
            scoring_profile,
            screen_concurrency: parse_var(&var, "SCREEN_CONCURRENCY", defaults.screen_concurrency)?.max(1),
            screen_max_symbols: parse_var(&var, "SCREEN_MAX_SYMBOLS", defaults.screen_max_symbols)?,
            provider_max_attempts: parse_var(&var, "PROVIDER_MAX_ATTEMPTS", defaults.provider_max_attempts)?.max(1),
            provider_retry_backoff: Duration::from_millis(parse_var(
                &var,
                "PROVIDER_RETRY_BACKOFF_MS",
                defaults.provider_retry_backoff.as_millis() as u64,
            )?),
        })
    }
}

fn parse_var<T>(var: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid value for {key}: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> anyhow::Result<ServerConfig> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:5000");
        assert_eq!(config.statement_data_dir, PathBuf::from("./data/statements"));
        assert_eq!(config.scoring_profile.name, "standard");
        assert_eq!(config.screen_concurrency, 4);
        assert_eq!(config.screen_max_symbols, 100);
        assert_eq!(config.provider_max_attempts, 3);
        assert_eq!(config.provider_retry_backoff, Duration::from_millis(250));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1:8080"),
            ("SCORING_PROFILE", "Margin-Heavy"),
            ("SCREEN_CONCURRENCY", "16"),
            ("PROVIDER_RETRY_BACKOFF_MS", "0"),
            ("TICKERS_CSV", "  "),
        ])
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.scoring_profile.name, "margin-heavy");
        assert_eq!(config.screen_concurrency, 16);
        assert_eq!(config.provider_retry_backoff, Duration::ZERO);
        assert_eq!(config.tickers_csv, PathBuf::from("./tickers.csv"));
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let err = config_from(&[("SCREEN_MAX_SYMBOLS", "lots")]).unwrap_err();
        assert!(err.to_string().contains("SCREEN_MAX_SYMBOLS"));
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let err = config_from(&[("SCORING_PROFILE", "yolo")]).unwrap_err();
        assert!(err.to_string().contains("yolo"));
    }
}
