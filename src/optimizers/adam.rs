//! Adam (Adaptive Moment Estimation) optimizer implementation

use crate::optimizers::Optimizer;

/// Adam (Adaptive Moment Estimation) optimizer.
///
/// Maintains two moving averages per parameter and a step counter used for
/// bias correction:
///
/// ```text
/// m_t = β1 * m_{t-1} + (1 - β1) * gradient
/// v_t = β2 * v_{t-1} + (1 - β2) * gradient²
/// m_hat = m_t / (1 - β1^t)
/// v_hat = v_t / (1 - β2^t)
/// parameter = parameter - α * m_hat / (√v_hat + ε)
/// ```
///
/// All of `m`, `v` and `t` influence future updates, so all three belong to the
/// state a snapshot has to capture.
///
/// # Reference
///
/// Kingma, D. P., & Ba, J. (2014). Adam: A method for stochastic optimization.
/// arXiv preprint arXiv:1412.6980.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    /// First moment estimates (momentum)
    m: Vec<f32>,
    /// Second moment estimates (adaptive learning rate)
    v: Vec<f32>,
    /// Time step counter for bias correction
    t: usize,
}

impl Adam {
    /// Creates a new Adam optimizer.
    ///
    /// # Examples
    ///
    /// ```
    /// use lr_finder::optimizers::{Adam, Optimizer};
    ///
    /// let optimizer = Adam::new(0.001, 0.9, 0.999, 1e-8);
    /// assert_eq!(optimizer.learning_rate(), 0.001);
    /// ```
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m: Vec::new(),
            v: Vec::new(),
            t: 0,
        }
    }

    /// Number of updates applied since construction or the last reset.
    pub fn step_count(&self) -> usize {
        self.t
    }

    /// First and second moment buffers.
    pub fn moments(&self) -> (&[f32], &[f32]) {
        (&self.m, &self.v)
    }
}

impl Optimizer for Adam {
    /// # Panics
    ///
    /// Panics if `parameters` and `gradients` have different lengths.
    fn update(&mut self, parameters: &mut [f32], gradients: &[f32]) {
        assert_eq!(
            parameters.len(),
            gradients.len(),
            "Parameters and gradients must have the same length"
        );

        self.init_state(parameters.len());

        self.t += 1;

        // β^t has long underflowed to zero by i32::MAX, so saturating is exact.
        let exponent = i32::try_from(self.t).unwrap_or(i32::MAX);
        let bias_correction1 = 1.0 - self.beta1.powi(exponent);
        let bias_correction2 = 1.0 - self.beta2.powi(exponent);

        for i in 0..parameters.len() {
            self.m[i] = self.beta1 * self.m[i] + (1.0 - self.beta1) * gradients[i];
            self.v[i] = self.beta2 * self.v[i] + (1.0 - self.beta2) * gradients[i] * gradients[i];

            let m_hat = self.m[i] / bias_correction1;
            let v_hat = self.v[i] / bias_correction2;

            parameters[i] -= self.learning_rate * m_hat / (v_hat.sqrt() + self.epsilon);
        }
    }

    fn init_state(&mut self, parameter_len: usize) {
        if self.m.len() != parameter_len {
            self.m = vec![0.0; parameter_len];
            self.v = vec![0.0; parameter_len];
        }
    }

    fn state_len(&self) -> usize {
        self.m.len()
    }

    fn reset(&mut self) {
        self.m.clear();
        self.v.clear();
        self.t = 0;
    }

    fn learning_rate(&self) -> f32 {
        self.learning_rate
    }

    fn set_learning_rate(&mut self, lr: f32) {
        self.learning_rate = lr;
    }
}
