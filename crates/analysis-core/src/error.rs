use thiserror::Error;

/// Errors raised by statement providers and the layers around the core.
///
/// The metric engine itself never produces these: a failed fetch is turned
/// into an empty statement before evaluation.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
