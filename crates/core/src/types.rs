//! Domain types with enforced invariants.
//!
//! - [`Policy`]: probability distribution over the action space, sums to 1.
//! - [`Value`]: scalar position estimate in [-1, 1].

use crate::{Result, SearchError};

/// Tolerance for policy sum validation.
const SUM_TOLERANCE: f32 = 1e-5;

/// A probability distribution over actions.
///
/// Invariant: all entries are non-negative and sum to 1.0 (±1e-5).
#[derive(Clone, Debug, PartialEq)]
pub struct Policy(Vec<f32>);

impl Policy {
    /// Validates and wraps a distribution.
    pub fn new(probs: Vec<f32>) -> Result<Self> {
        if probs.is_empty() {
            return Err(SearchError::InvalidPolicy("empty policy".into()));
        }
        if probs.iter().any(|&p| p < 0.0 || !p.is_finite()) {
            return Err(SearchError::InvalidPolicy(
                "policy contains negative or non-finite entries".into(),
            ));
        }
        let sum: f32 = probs.iter().sum();
        if (sum - 1.0).abs() > SUM_TOLERANCE {
            return Err(SearchError::InvalidPolicy(format!(
                "policy sums to {sum}, expected 1.0"
            )));
        }
        Ok(Self(probs))
    }

    /// Normalizes raw non-negative weights into a distribution.
    pub fn from_unnormalized(weights: Vec<f32>) -> Result<Self> {
        if weights.iter().any(|&w| w < 0.0 || !w.is_finite()) {
            return Err(SearchError::InvalidPolicy(
                "weights contain negative or non-finite entries".into(),
            ));
        }
        let sum: f32 = weights.iter().sum();
        if sum <= 0.0 {
            return Err(SearchError::InvalidPolicy("all weights are zero".into()));
        }
        Ok(Self(weights.into_iter().map(|w| w / sum).collect()))
    }

    /// Uniform distribution over `n` actions.
    pub fn uniform(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(SearchError::InvalidPolicy(
                "cannot build a uniform policy over 0 actions".into(),
            ));
        }
        Ok(Self(vec![1.0 / n as f32; n]))
    }

    /// Restricts a raw policy to the legal actions and renormalizes.
    ///
    /// Returns the masked distribution and a flag that is true when the
    /// masked mass was zero and the result fell back to a uniform
    /// distribution over legal actions. The mask must contain at least one
    /// legal action.
    pub fn masked(raw: &[f32], mask: &[bool]) -> Result<(Self, bool)> {
        debug_assert_eq!(raw.len(), mask.len());
        let legal = mask.iter().filter(|&&m| m).count();
        if legal == 0 {
            return Err(SearchError::NoLegalMoves);
        }

        let mut probs = vec![0.0; raw.len()];
        let mut sum = 0.0;
        for (i, &m) in mask.iter().enumerate() {
            if m {
                probs[i] = raw[i];
                sum += raw[i];
            }
        }

        if sum > 0.0 {
            for p in &mut probs {
                *p /= sum;
            }
            Ok((Self(probs), false))
        } else {
            // Predictor assigned no mass to any legal move.
            let uniform = 1.0 / legal as f32;
            for (i, &m) in mask.iter().enumerate() {
                probs[i] = if m { uniform } else { 0.0 };
            }
            Ok((Self(probs), true))
        }
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn sum(&self) -> f32 {
        self.0.iter().sum()
    }

    /// Index of the maximum probability; ties go to the lowest index.
    pub fn argmax(&self) -> usize {
        let mut best = 0;
        for (i, &p) in self.0.iter().enumerate() {
            if p > self.0[best] {
                best = i;
            }
        }
        best
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl std::ops::Index<usize> for Policy {
    type Output = f32;

    fn index(&self, index: usize) -> &f32 {
        &self.0[index]
    }
}

/// A scalar position estimate.
///
/// Invariant: in [-1, 1]; +1 means the player to move is winning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Value(f32);

impl Value {
    pub const WIN: Self = Self(1.0);
    pub const LOSS: Self = Self(-1.0);
    pub const DRAW: Self = Self(0.0);

    pub fn new(value: f32) -> Result<Self> {
        if !value.is_finite() || !(-1.0..=1.0).contains(&value) {
            return Err(SearchError::InvalidValue(format!(
                "value {value} outside [-1, 1]"
            )));
        }
        Ok(Self(value))
    }

    /// Clamps into [-1, 1]; use for values that may drift slightly out of
    /// range through floating point accumulation.
    pub fn clamped(value: f32) -> Self {
        Self(value.clamp(-1.0, 1.0))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// The same value from the opponent's perspective.
    pub fn negate(self) -> Self {
        Self(-self.0)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

impl From<Value> for f32 {
    fn from(v: Value) -> f32 {
        v.0
    }
}
