use thiserror::Error;

/// Failure taxonomy shared by the ledger, the aggregator and the evaluator.
#[derive(Debug, Error)]
pub enum EngagementError {
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Invalid token")]
    InvalidToken,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
}

impl From<anyhow::Error> for EngagementError {
    fn from(e: anyhow::Error) -> Self {
        Self::StoreUnavailable(format!("{e:#}"))
    }
}
