//! Error types for the 3CB solver

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    /// An action outside the legal set was applied. Indicates a bug in the
    /// caller or in a card hook; the engine never repairs state.
    #[error("Illegal action in {phase}: {action}")]
    IllegalAction { phase: String, action: String },

    /// A state-based check found an impossible state (negative counts,
    /// dangling combat reference).
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Unknown card: {0}")]
    UnknownCard(String),

    #[error("Unknown deck: {0}")]
    UnknownDeck(String),

    /// Search hit its node budget; the caller gets a partial bound.
    #[error("Search budget exceeded after {nodes} nodes")]
    BudgetExceeded { nodes: u64 },

    /// A transposition snapshot was built against a different catalog.
    #[error("Snapshot catalog hash {found:#018x} does not match {expected:#018x}")]
    CatalogMismatch { expected: u64, found: u64 },

    #[error("Snapshot format error: {0}")]
    Snapshot(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SolverError>;
