//! Search configuration.

use zerosearch_core::{Result, SearchError};

/// Tunable parameters for a search engine.
#[derive(Clone, Debug)]
pub struct MctsConfig {
    /// Simulations per search call. Must be at least 1.
    pub num_simulations: usize,

    /// Exploration constant base: part of
    /// `c(s) = ln((N(s) + c_base + 1) / c_base) + c_init`.
    pub c_base: f32,

    /// Exploration constant floor in the same formula.
    pub c_init: f32,

    /// Dirichlet noise concentration for root exploration.
    pub dirichlet_alpha: f32,

    /// Fraction of each root prior replaced with Dirichlet noise.
    /// 0 disables root noise entirely.
    pub root_noise_fraction: f32,

    /// Temperature for policy extraction and action sampling.
    /// 0 = greedy, 1 = proportional to visit counts.
    pub temperature: f32,

    /// Move number after which the effective temperature drops to 0.
    /// 0 keeps the configured temperature for the whole game.
    pub temperature_drop_move: usize,

    /// Discount applied per step when backing up values in the latent
    /// (reward-bearing) variant. Ignored by the direct two-player variant.
    pub discount: f32,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            num_simulations: 800,
            c_base: 19652.0,
            c_init: 1.25,
            dirichlet_alpha: 0.3,
            root_noise_fraction: 0.25,
            temperature: 1.0,
            temperature_drop_move: 30,
            discount: 1.0,
        }
    }
}

impl MctsConfig {
    pub fn with_simulations(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            ..Default::default()
        }
    }

    /// Configuration for competitive play: greedy selection, no root noise.
    pub fn for_evaluation(num_simulations: usize) -> Self {
        Self {
            num_simulations,
            root_noise_fraction: 0.0,
            temperature: 0.0,
            temperature_drop_move: 0,
            ..Default::default()
        }
    }

    /// Rejects invalid inputs before any simulation runs.
    pub fn validate(&self) -> Result<()> {
        if self.num_simulations == 0 {
            return Err(SearchError::InvalidBudget(self.num_simulations));
        }
        Ok(())
    }

    /// Whether Dirichlet root noise is enabled.
    pub fn root_noise_enabled(&self) -> bool {
        self.root_noise_fraction > 0.0 && self.dirichlet_alpha > 0.0
    }

    /// Temperature to use at a given move number of a game.
    pub fn effective_temperature(&self, move_number: usize) -> f32 {
        if self.temperature_drop_move > 0 && move_number >= self.temperature_drop_move {
            0.0
        } else {
            self.temperature
        }
    }
}
