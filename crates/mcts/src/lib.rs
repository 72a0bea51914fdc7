//! zerosearch-mcts: Monte Carlo Tree Search guided by a policy/value
//! predictor.
//!
//! Two search variants share the node/tree machinery and the PUCT
//! selection rule:
//!
//! - [`Mcts`] descends real game states through a [`zerosearch_core::Game`]
//!   oracle, flipping perspective between plies and reading ground-truth
//!   outcomes at terminal leaves.
//! - [`LatentMcts`] unrolls an opaque learned state through a
//!   [`LatentModel`], accumulating predicted rewards with discounting.
//!
//! Root visit counts become a move distribution via temperature-scaled
//! policy extraction; Dirichlet root noise is available for self-play
//! exploration.
//!
//! # Example
//!
//! ```
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use zerosearch_core::Game;
//! use zerosearch_mcts::{games::TicTacToe, Mcts, MctsConfig, RolloutEvaluator};
//!
//! let game = TicTacToe;
//! let state = game.initial_state();
//!
//! let rng = ChaCha8Rng::seed_from_u64(42);
//! let evaluator = RolloutEvaluator::new(rng.clone(), 20);
//! let mut mcts = Mcts::new(MctsConfig::with_simulations(100), evaluator, rng);
//!
//! let result = mcts.search(&game, &state).unwrap();
//! assert!((result.policy.iter().sum::<f32>() - 1.0).abs() < 1e-5);
//! println!("best action: {:?}", result.best_action);
//! ```

pub mod config;
pub mod evaluator;
pub mod games;
pub mod latent;
mod node;
pub mod policy;
pub mod search;
mod tree;

pub use config::MctsConfig;
pub use evaluator::{Evaluation, Evaluator, RolloutEvaluator, UniformEvaluator};
pub use latent::{InitialInference, LatentMcts, LatentModel, MinMaxStats, RecurrentInference};
pub use node::{Node, NodeId, NodeStats};
pub use policy::visit_policy;
pub use search::{Mcts, SearchResult, SearchStats};
pub use tree::Tree;
