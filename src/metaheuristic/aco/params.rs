use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum ParamsError {
    #[error("parameter {0} must be a finite number")]
    NotFinite(&'static str),
    #[error("parameter {0} must not be negative")]
    Negative(&'static str),
    #[error("evaporation rate roh must lie in [0, 1], got {0}")]
    RohOutOfRange(f64),
    #[error("min_pheromone {min} is larger than max_pheromone {max}")]
    InvalidPheromoneBounds { min: f64, max: f64 },
    #[error("zero_distance must be positive, got {0}")]
    NonPositiveZeroDistance(f64),
}

/// Tuning constants of a single run. Immutable once the optimizer is built.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Params {
    /// Exponent applied to the pheromone level of an edge.
    pub alpha: f64,
    /// Exponent applied to the visibility of an edge, baked into the visibility table.
    pub beta: f64,
    /// Evaporation rate per round.
    pub roh: f64,
    /// Pheromone deposit numerator, usually the largest edge weight of the instance.
    pub q: f64,
    pub initial_pheromone: f64,
    pub min_pheromone: f64,
    pub max_pheromone: f64,
    /// Substituted for an edge weight of zero when computing visibility.
    pub zero_distance: f64,
}

impl Params {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        alpha: f64,
        beta: f64,
        roh: f64,
        q: f64,
        initial_pheromone: f64,
        min_pheromone: f64,
        max_pheromone: f64,
        zero_distance: f64,
    ) -> Self {
        Params {
            alpha,
            beta,
            roh,
            q,
            initial_pheromone,
            min_pheromone,
            max_pheromone,
            zero_distance,
        }
    }

    /// Checks that pheromone and visibility values computed from these parameters stay finite.
    pub fn validate(&self) -> Result<(), ParamsError> {
        let named = [
            ("alpha", self.alpha),
            ("beta", self.beta),
            ("roh", self.roh),
            ("q", self.q),
            ("initial_pheromone", self.initial_pheromone),
            ("min_pheromone", self.min_pheromone),
            ("max_pheromone", self.max_pheromone),
            ("zero_distance", self.zero_distance),
        ];
        for (name, value) in named.iter() {
            if !value.is_finite() {
                return Err(ParamsError::NotFinite(*name));
            }
        }

        for (name, value) in [
            ("alpha", self.alpha),
            ("q", self.q),
            ("initial_pheromone", self.initial_pheromone),
            ("min_pheromone", self.min_pheromone),
        ]
        .iter()
        {
            if *value < 0.0 {
                return Err(ParamsError::Negative(*name));
            }
        }

        if !(0.0..=1.0).contains(&self.roh) {
            return Err(ParamsError::RohOutOfRange(self.roh));
        }
        if self.min_pheromone > self.max_pheromone {
            return Err(ParamsError::InvalidPheromoneBounds {
                min: self.min_pheromone,
                max: self.max_pheromone,
            });
        }
        if self.zero_distance <= 0.0 {
            return Err(ParamsError::NonPositiveZeroDistance(self.zero_distance));
        }

        Ok(())
    }
}

impl Default for Params {
    fn default() -> Self {
        Params {
            alpha: 1.0,
            beta: 2.0,
            roh: 0.1,
            q: 1.0,
            initial_pheromone: 1.0,
            min_pheromone: 0.01,
            max_pheromone: 10.0,
            zero_distance: 0.1,
        }
    }
}
