//! Position evaluation abstraction for the direct-state search variant.
//!
//! The [`Evaluator`] trait is the predictor seam: a learned network, a
//! random-playout baseline, or a fixed stub for tests all plug in here.

use std::cell::RefCell;

use rand::Rng;
use zerosearch_core::{Game, Result, SearchError};

/// Raw evaluation of a position: prior policy over the full action space
/// plus a scalar value estimate.
#[derive(Clone, Debug)]
pub struct Evaluation {
    /// Prior probability per action index; length must equal the game's
    /// action-space size.
    pub policy: Vec<f32>,

    /// Value in [-1, 1] from the perspective of the player to move.
    pub value: f32,
}

impl Evaluation {
    /// Enforces the predictor contract. A wrong-length, negative, or
    /// non-finite output is fatal; the engine never substitutes defaults.
    pub fn validate(&self, num_actions: usize) -> Result<()> {
        if self.policy.len() != num_actions {
            return Err(SearchError::BadEvaluation(format!(
                "policy length {} does not match action space {}",
                self.policy.len(),
                num_actions
            )));
        }
        if self.policy.iter().any(|&p| p < 0.0 || !p.is_finite()) {
            return Err(SearchError::BadEvaluation(
                "policy contains negative or non-finite entries".into(),
            ));
        }
        if !self.value.is_finite() {
            return Err(SearchError::BadEvaluation(format!(
                "value {} is not finite",
                self.value
            )));
        }
        Ok(())
    }
}

/// Maps a canonical game state to (policy, value).
///
/// The engine always hands over the canonical form of the state, so
/// implementations need not know whose turn it is. Policies are masked and
/// renormalized by the engine afterwards; evaluators may return mass on
/// illegal actions.
pub trait Evaluator<G: Game> {
    fn evaluate(&self, game: &G, canonical_state: &G::State) -> Result<Evaluation>;
}

/// Uniform prior, zero value. The weakest well-formed evaluator; useful as
/// a baseline and for exercising the engine without any domain knowledge.
#[derive(Clone, Debug, Default)]
pub struct UniformEvaluator;

impl<G: Game> Evaluator<G> for UniformEvaluator {
    fn evaluate(&self, game: &G, _canonical_state: &G::State) -> Result<Evaluation> {
        let n = game.num_actions();
        Ok(Evaluation {
            policy: vec![1.0 / n as f32; n],
            value: 0.0,
        })
    }
}

/// Uniform prior over legal actions, value from a random playout.
pub struct RolloutEvaluator<R: Rng> {
    // RefCell: evaluate takes &self but the rollout needs the rng.
    rng: RefCell<R>,
    max_rollout_depth: usize,
}

impl<R: Rng> RolloutEvaluator<R> {
    pub fn new(rng: R, max_rollout_depth: usize) -> Self {
        Self {
            rng: RefCell::new(rng),
            max_rollout_depth,
        }
    }

    /// Plays random moves until the game ends or the depth cap is hit.
    /// Returns the outcome from the perspective of the player to move at
    /// the start, 0.0 if the cap was reached first.
    fn rollout<G: Game>(&self, game: &G, start: &G::State) -> f32 {
        let mut state = start.clone();
        let mut depth = 0;

        while !game.is_terminal(&state) && depth < self.max_rollout_depth {
            let actions = game.legal_actions(&state);
            if actions.is_empty() {
                break;
            }
            let pick = self.rng.borrow_mut().gen_range(0..actions.len());
            state = game.apply(&state, actions[pick]).state;
            depth += 1;
        }

        match game.outcome(&state) {
            // Outcome is from the perspective of the player who just moved.
            // Odd depth: the starting player made the last move.
            Some(outcome) if depth % 2 == 1 => outcome,
            Some(outcome) => -outcome,
            None => 0.0,
        }
    }
}

impl<G: Game, R: Rng> Evaluator<G> for RolloutEvaluator<R> {
    fn evaluate(&self, game: &G, canonical_state: &G::State) -> Result<Evaluation> {
        let legal = game.legal_actions(canonical_state);
        let mut policy = vec![0.0; game.num_actions()];
        if !legal.is_empty() {
            let prior = 1.0 / legal.len() as f32;
            for action in &legal {
                policy[game.action_to_index(*action)] = prior;
            }
        }

        let value = self.rollout(game, canonical_state);
        Ok(Evaluation { policy, value })
    }
}
