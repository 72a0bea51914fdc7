use thiserror::Error;

/// Errors surfaced by the search engine and its collaborator contracts.
#[derive(Error, Debug)]
pub enum SearchError {
    /// The evaluator/predictor returned output violating its contract
    /// (wrong policy length, non-finite value, negative prior). Never
    /// corrected silently.
    #[error("evaluator contract violation: {0}")]
    BadEvaluation(String),

    /// The game oracle reported no legal action at a non-terminal state.
    #[error("oracle contract violation: no legal moves at a non-terminal state")]
    NoLegalMoves,

    /// The game oracle broke one of its other guarantees (e.g. a legal
    /// action index with no corresponding action).
    #[error("oracle contract violation: {0}")]
    Oracle(String),

    /// A search was requested from a state that is already terminal.
    #[error("cannot search from a terminal state")]
    TerminalRoot,

    /// The simulation budget must be at least 1.
    #[error("invalid simulation budget: {0}")]
    InvalidBudget(usize),

    /// A probability distribution failed validation.
    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    /// A scalar value estimate failed validation.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Convenience Result type shared across the workspace.
pub type Result<T> = std::result::Result<T, SearchError>;
