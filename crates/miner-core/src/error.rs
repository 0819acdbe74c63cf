use thiserror::Error;

pub type Result<T> = std::result::Result<T, MinerError>;

#[derive(Debug, Error)]
pub enum MinerError {
    /// Amount was not made of ASCII digits only.
    #[error("invalid amount {0:?}: expected digits only")]
    InvalidAmount(String),

    /// Ticker does not encode to an 8-digit target.
    #[error("invalid currency code {0:?}: expected 3 or 4 letters")]
    InvalidCurrencyCode(String),

    #[error("session has no transactions to mine")]
    EmptySession,

    #[error("invalid search configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to build search worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
