//! zerosearch-core: game oracle abstraction and shared domain types.
//!
//! This crate defines the narrow interfaces the search engine consumes:
//!
//! - [`Game`]: legal moves, terminal test, transitions, canonicalization
//! - [`Policy`]: probability distribution over actions (sums to 1.0)
//! - [`Value`]: scalar position estimate in [-1, 1]
//! - [`SearchError`]: contract-violation and invalid-input errors

mod error;
mod game;
mod types;

pub use error::{Result, SearchError};
pub use game::{Game, Transition};
pub use types::{Policy, Value};
