use analysis_core::AnalysisError;
use std::future::Future;
use std::time::Duration;

/// Caller-side retry for provider fetches.
///
/// Waits `backoff * attempt` between attempts. `SymbolNotFound`,
/// `InvalidData` and `Serialization` errors are final and never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Single attempt, no waiting.
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub async fn run<T, F, Fut>(&self, what: &str, mut operation: F) -> Result<T, AnalysisError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AnalysisError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if !is_retryable(&e) || attempt >= max_attempts => return Err(e),
                Err(e) => {
                    tracing::debug!("{} failed (attempt {}/{}): {}", what, attempt, max_attempts, e);
                    tokio::time::sleep(self.backoff * attempt).await;
                    attempt += 1;
                }
            }
        }
    }
}

fn is_retryable(error: &AnalysisError) -> bool {
    !matches!(
        error,
        AnalysisError::SymbolNotFound(_) | AnalysisError::InvalidData(_) | AnalysisError::Serialization(_)
    )
}
