//! Configuration structures for the learning rate sweep
//!
//! This module provides the search configuration consumed by the rate finder and
//! the training configuration used to build the bundled MLP trainable unit. Both
//! can be loaded together from a single JSON file.

use crate::error::{FinderError, Result};
use serde::{Deserialize, Serialize};
use std::fs;

/// Optimizer names accepted by [`TrainingConfig::optimizer`].
pub const VALID_OPTIMIZERS: [&str; 2] = ["sgd", "adam"];

/// Parameters of one learning rate sweep.
///
/// - `lr_start`: first learning rate tried (must be positive)
/// - `lr_multiplier`: geometric growth factor per iteration (must be > 1)
/// - `smoothing`: weight of the previous running mean in the divergence test, in `[0, 1)`
/// - `min_iterations`: number of iterations before stopping is allowed
/// - `max_iterations`: optional hard cap on the sweep length
///
/// # Example
///
/// ```json
/// {
///   "lr_start": 1e-6,
///   "lr_multiplier": 1.1,
///   "smoothing": 0.3,
///   "min_iterations": 20
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub lr_start: f64,
    pub lr_multiplier: f64,
    pub smoothing: f64,
    pub min_iterations: usize,
    pub max_iterations: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            lr_start: 1e-6,
            lr_multiplier: 1.1,
            smoothing: 0.3,
            min_iterations: 20,
            max_iterations: None,
        }
    }
}

impl SearchConfig {
    /// Rejects configurations that would never terminate or would produce
    /// meaningless rates.
    pub fn validate(&self) -> Result<()> {
        if !self.lr_start.is_finite() || self.lr_start <= 0.0 {
            return Err(FinderError::Config(format!(
                "lr_start must be a positive finite number, got {}",
                self.lr_start
            )));
        }

        if !self.lr_multiplier.is_finite() || self.lr_multiplier <= 1.0 {
            return Err(FinderError::Config(format!(
                "lr_multiplier must be finite and greater than 1, got {}",
                self.lr_multiplier
            )));
        }

        if !(0.0..1.0).contains(&self.smoothing) {
            return Err(FinderError::Config(format!(
                "smoothing must be in [0, 1), got {}",
                self.smoothing
            )));
        }

        if let Some(cap) = self.max_iterations {
            if cap == 0 {
                return Err(FinderError::Config(
                    "max_iterations must be at least 1".to_string(),
                ));
            }
            if cap < self.min_iterations {
                return Err(FinderError::Config(format!(
                    "max_iterations ({}) must not be below min_iterations ({})",
                    cap, self.min_iterations
                )));
            }
        }

        Ok(())
    }
}

/// Settings for the bundled MLP trainable unit and its synthetic dataset.
///
/// # Example
///
/// ```json
/// {
///   "optimizer": "adam",
///   "learning_rate": 0.001,
///   "hidden_size": 32,
///   "batch_size": 16,
///   "seed": 7
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Optimizer type: "sgd" or "adam"
    pub optimizer: String,

    /// Learning rate the unit trains with outside of a sweep
    pub learning_rate: f32,

    /// Momentum for SGD (0 or absent disables momentum)
    pub momentum: Option<f32>,

    /// Adam first moment decay rate
    pub beta1: f32,

    /// Adam second moment decay rate
    pub beta2: f32,

    /// Adam numerical stability constant
    pub epsilon: f32,

    /// Width of the hidden dense layer
    pub hidden_size: usize,

    /// Samples per training iteration
    pub batch_size: usize,

    /// Seed for weight initialisation, data synthesis and shuffling
    pub seed: u64,

    /// Number of samples in the synthetic dataset
    pub num_samples: usize,

    /// Features per sample in the synthetic dataset
    pub num_features: usize,

    /// Number of classes in the synthetic dataset
    pub num_classes: usize,

    /// Noise standard deviation around each synthetic class centre
    pub cluster_spread: f32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            optimizer: "adam".to_string(),
            learning_rate: 1e-3,
            momentum: None,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            hidden_size: 32,
            batch_size: 16,
            seed: 42,
            num_samples: 512,
            num_features: 8,
            num_classes: 3,
            cluster_spread: 1.0,
        }
    }
}

impl TrainingConfig {
    /// Check the optimizer name and that sizes and rates are usable.
    pub fn validate(&self) -> Result<()> {
        if !VALID_OPTIMIZERS.contains(&self.optimizer.as_str()) {
            return Err(FinderError::Config(format!(
                "Invalid optimizer '{}'. Must be one of: {}",
                self.optimizer,
                VALID_OPTIMIZERS.join(", ")
            )));
        }

        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(FinderError::Config(
                "learning_rate must be positive".to_string(),
            ));
        }

        if let Some(momentum) = self.momentum {
            if !(0.0..1.0).contains(&momentum) {
                return Err(FinderError::Config(
                    "momentum must be in [0, 1)".to_string(),
                ));
            }
        }

        if !(0.0..1.0).contains(&self.beta1) || !(0.0..1.0).contains(&self.beta2) {
            return Err(FinderError::Config(
                "beta1 and beta2 must be in [0, 1)".to_string(),
            ));
        }

        if self.epsilon <= 0.0 {
            return Err(FinderError::Config("epsilon must be positive".to_string()));
        }

        for (name, value) in [
            ("hidden_size", self.hidden_size),
            ("batch_size", self.batch_size),
            ("num_samples", self.num_samples),
            ("num_features", self.num_features),
        ] {
            if value == 0 {
                return Err(FinderError::Config(format!("{} must be positive", name)));
            }
        }

        if !self.cluster_spread.is_finite() || self.cluster_spread <= 0.0 {
            return Err(FinderError::Config(
                "cluster_spread must be positive".to_string(),
            ));
        }

        if self.num_classes < 2 {
            return Err(FinderError::Config(
                "num_classes must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

/// Complete configuration of one `lr_sweep` run.
///
/// Missing sections fall back to their defaults.
///
/// # Example
///
/// ```json
/// {
///   "search": { "lr_start": 1e-5, "lr_multiplier": 1.2 },
///   "training": { "optimizer": "sgd", "momentum": 0.9 }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub search: SearchConfig,
    pub training: TrainingConfig,
}

impl RunConfig {
    /// Validate both sections, search first.
    pub fn validate(&self) -> Result<()> {
        self.search.validate()?;
        self.training.validate()
    }
}

/// Loads a run configuration from a JSON file.
///
/// Reads the file at `path`, deserializes it into a `RunConfig` and validates
/// both sections.
///
/// # Examples
///
/// ```no_run
/// use lr_finder::config::load_config;
///
/// let cfg = load_config("config/lr_sweep_adam.json").unwrap();
/// assert_eq!(cfg.training.optimizer, "adam");
/// ```
pub fn load_config(path: &str) -> Result<RunConfig> {
    let contents = fs::read_to_string(path)?;
    let config: RunConfig = serde_json::from_str(&contents)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_defaults_are_valid() {
        let config = SearchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.smoothing, 0.3);
        assert_eq!(config.min_iterations, 20);
        assert_eq!(config.max_iterations, None);
    }

    #[test]
    fn test_rejects_non_growing_multiplier() {
        for multiplier in [1.0, 0.5, f64::NAN] {
            let config = SearchConfig {
                lr_multiplier: multiplier,
                ..SearchConfig::default()
            };
            assert!(matches!(config.validate(), Err(FinderError::Config(_))));
        }
    }

    #[test]
    fn test_rejects_bad_smoothing() {
        for smoothing in [-0.1, 1.0, 1.5] {
            let config = SearchConfig {
                smoothing,
                ..SearchConfig::default()
            };
            assert!(config.validate().is_err(), "smoothing {} accepted", smoothing);
        }
    }

    #[test]
    fn test_cap_below_floor_rejected() {
        let config = SearchConfig {
            max_iterations: Some(5),
            ..SearchConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: RunConfig =
            serde_json::from_str(r#"{ "search": { "lr_start": 0.001 } }"#).unwrap();
        assert_eq!(config.search.lr_start, 0.001);
        assert_eq!(config.search.lr_multiplier, 1.1);
        assert_eq!(config.training, TrainingConfig::default());
    }
}
