//! Error types

/// Errors surfaced by the game core and its config loaders
#[derive(Debug, thiserror::Error)]
pub enum PlinkoError {
    /// Requested total wager exceeds the current balance
    #[error("insufficient balance: wager of {required} exceeds balance of {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("invalid config: {0}")]
    Config(#[from] serde_json::Error),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
}
