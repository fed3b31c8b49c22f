//! Stochastic Gradient Descent (SGD) optimizer implementation
//!
//! Vanilla SGD performs `parameter = parameter - learning_rate * gradient`.
//! With momentum it keeps a velocity buffer per parameter.

use crate::optimizers::Optimizer;

/// Stochastic Gradient Descent optimizer with optional classical momentum.
///
/// Without momentum:
///
/// `w = w - η * g`
///
/// With momentum μ:
///
/// ```text
/// v = μ * v + g
/// w = w - η * v
/// ```
///
/// # Example
///
/// ```
/// use lr_finder::optimizers::{Optimizer, SGD};
///
/// let mut optimizer = SGD::new(0.1);
/// let mut weights = vec![1.0, 2.0, 3.0];
/// optimizer.update(&mut weights, &[0.1, 0.2, 0.3]);
/// assert!((weights[0] - 0.99).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SGD {
    learning_rate: f32,
    momentum: f32,
    /// Velocity buffer, empty until initialised or when momentum is zero
    velocity: Vec<f32>,
}

impl SGD {
    /// Creates a vanilla SGD optimizer.
    pub fn new(learning_rate: f32) -> Self {
        Self::with_momentum(learning_rate, 0.0)
    }

    /// Creates an SGD optimizer with classical momentum (typically 0.9).
    pub fn with_momentum(learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: Vec::new(),
        }
    }

    pub fn momentum(&self) -> f32 {
        self.momentum
    }

    pub fn velocity(&self) -> &[f32] {
        &self.velocity
    }
}

impl Optimizer for SGD {
    /// # Panics
    ///
    /// Panics if `parameters` and `gradients` have different lengths.
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]) {
        assert_eq!(
            parameters.len(),
            gradients.len(),
            "Parameters and gradients must have the same length"
        );

        if self.momentum == 0.0 {
            for (param, grad) in parameters.iter_mut().zip(gradients.iter()) {
                *param -= self.learning_rate * grad;
            }
            return;
        }

        self.init_state(parameters.len());
        for ((param, grad), v) in parameters
            .iter_mut()
            .zip(gradients.iter())
            .zip(self.velocity.iter_mut())
        {
            *v = self.momentum * *v + grad;
            *param -= self.learning_rate * *v;
        }
    }

    fn init_state(&mut self, parameter_len: usize) {
        if self.momentum != 0.0 && self.velocity.len() != parameter_len {
            self.velocity = vec![0.0; parameter_len];
        }
    }

    fn state_len(&self) -> usize {
        self.velocity.len()
    }

    fn reset(&mut self) {
        self.velocity.clear();
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sgd_update() {
        let mut optimizer = SGD::new(0.1);
        let mut params = vec![1.0, 2.0, 3.0];
        let grads = vec![0.1, 0.2, 0.3];

        optimizer.update(&mut params, &grads);

        assert!((params[0] - 0.99).abs() < 1e-6);
        assert!((params[1] - 1.98).abs() < 1e-6);
        assert!((params[2] - 2.97).abs() < 1e-6);
    }

    #[test]
    fn test_vanilla_sgd_has_no_state() {
        let mut optimizer = SGD::new(0.1);
        optimizer.init_state(4);
        optimizer.update(&mut [1.0, 1.0, 1.0, 1.0], &[1.0, 1.0, 1.0, 1.0]);
        assert_eq!(optimizer.state_len(), 0);
    }

    #[test]
    fn test_momentum_accumulates_velocity() {
        let mut optimizer = SGD::with_momentum(0.1, 0.9);
        let mut params = vec![1.0];

        optimizer.update(&mut params, &[1.0]);
        // v = 1.0, w = 1.0 - 0.1
        assert!((params[0] - 0.9).abs() < 1e-6);

        optimizer.update(&mut params, &[1.0]);
        // v = 0.9 + 1.0 = 1.9, w = 0.9 - 0.19
        assert!((params[0] - 0.71).abs() < 1e-6);
        assert!((optimizer.velocity()[0] - 1.9).abs() < 1e-6);
    }

    #[test]
    fn test_init_state_allocates_zeroed_velocity() {
        let mut optimizer = SGD::with_momentum(0.01, 0.9);
        assert_eq!(optimizer.state_len(), 0);
        optimizer.init_state(3);
        assert_eq!(optimizer.velocity(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_reset_clears_velocity() {
        let mut optimizer = SGD::with_momentum(0.01, 0.9);
        optimizer.update(&mut [1.0, 2.0], &[0.5, 0.5]);
        optimizer.reset();
        assert_eq!(optimizer.state_len(), 0);
    }

    #[test]
    #[should_panic(expected = "Parameters and gradients must have the same length")]
    fn test_sgd_mismatched_lengths() {
        let mut optimizer = SGD::new(0.01);
        let mut params = vec![1.0, 2.0];
        let grads = vec![0.1, 0.2, 0.3];
        optimizer.update(&mut params, &grads);
    }
}
