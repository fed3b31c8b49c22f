//! Optimizer abstractions for parameter updates
//!
//! This module provides the Optimizer trait and implementations used by the MLP
//! trainable unit. Optimizers may carry per-parameter state (momentum, moment
//! estimates, step counters); that state is part of what a rate-finder sweep
//! must snapshot and restore, so it is always held by value and `Clone`.
//!
//! # Available Optimizers
//!
//! - SGD: Stochastic gradient descent, optionally with classical momentum
//! - Adam: Adaptive moment estimation with bias correction
//!
//! # Example
//!
//! ```
//! use lr_finder::optimizers::{Adam, Optimizer};
//!
//! let mut optimizer = Adam::new(0.001, 0.9, 0.999, 1e-8);
//! let mut weights = vec![1.0, 2.0];
//! optimizer.init_state(weights.len());
//! optimizer.update(&mut weights, &[0.1, -0.1]);
//! assert_eq!(optimizer.state_len(), 2);
//! ```

pub mod adam;
pub mod sgd;

pub use adam::Adam;
pub use sgd::SGD;

/// Core trait for optimizers.
///
/// One optimizer instance updates one parameter buffer. Models with several
/// buffers (weights and biases of each layer) hold one instance per buffer.
///
/// # State Management
///
/// Stateful optimizers allocate their buffers either explicitly through
/// [`Optimizer::init_state`] or lazily on the first `update`. Callers that need
/// to capture the state before any update has happened (for example to restore
/// it after a throwaway sweep) call `init_state` first.
pub trait Optimizer {
    /// Update parameters in place using gradients.
    ///
    /// # Panics
    ///
    /// Implementations panic if parameters and gradients have different lengths.
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]);

    /// Allocate zeroed internal state for a parameter buffer of `parameter_len`.
    ///
    /// Does nothing for stateless optimizers, and keeps existing state when it
    /// already has the requested size.
    fn init_state(&mut self, _parameter_len: usize) {}

    /// Number of parameters the internal state currently covers.
    ///
    /// Zero for stateless or not yet initialised optimizers.
    fn state_len(&self) -> usize {
        0
    }

    /// Clear accumulated state (momentum, moment estimates, step counter).
    fn reset(&mut self);

    /// Get the learning rate for this optimizer.
    fn learning_rate(&self) -> f32;

    /// Set the learning rate for this optimizer.
    fn set_learning_rate(&mut self, lr: f32);
}

/// Runtime choice between the optimizers of this module.
///
/// Lets a configuration file pick the optimizer while the MLP unit stays
/// generic over a single concrete type.
#[derive(Debug, Clone, PartialEq)]
pub enum AnyOptimizer {
    Sgd(SGD),
    Adam(Adam),
}

impl From<SGD> for AnyOptimizer {
    fn from(optimizer: SGD) -> Self {
        AnyOptimizer::Sgd(optimizer)
    }
}

impl From<Adam> for AnyOptimizer {
    fn from(optimizer: Adam) -> Self {
        AnyOptimizer::Adam(optimizer)
    }
}

impl Optimizer for AnyOptimizer {
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]) {
        match self {
            AnyOptimizer::Sgd(o) => o.update(parameters, gradients),
            AnyOptimizer::Adam(o) => o.update(parameters, gradients),
        }
    }

    fn init_state(&mut self, parameter_len: usize) {
        match self {
            AnyOptimizer::Sgd(o) => o.init_state(parameter_len),
            AnyOptimizer::Adam(o) => o.init_state(parameter_len),
        }
    }

    fn state_len(&self) -> usize {
        match self {
            AnyOptimizer::Sgd(o) => o.state_len(),
            AnyOptimizer::Adam(o) => o.state_len(),
        }
    }

    fn reset(&mut self) {
        match self {
            AnyOptimizer::Sgd(o) => o.reset(),
            AnyOptimizer::Adam(o) => o.reset(),
        }
    }

    fn learning_rate(&self) -> f32 {
        match self {
            AnyOptimizer::Sgd(o) => o.learning_rate(),
            AnyOptimizer::Adam(o) => o.learning_rate(),
        }
    }

    fn set_learning_rate(&mut self, lr: f32) {
        match self {
            AnyOptimizer::Sgd(o) => o.set_learning_rate(lr),
            AnyOptimizer::Adam(o) => o.set_learning_rate(lr),
        }
    }
}
