//! Learning rate schedule trait and the exponential sweep ramp
//!
//! The rate finder does not decay the learning rate; it grows it geometrically
//! from a tiny starting value until the loss blows up. The ramp is expressed as
//! an `LRScheduler` so the sweep's rate sequence can be tested on its own.

/// Core trait for learning rate schedules.
///
/// A schedule reports the rate for the current step and advances one step at a
/// time. Rates are f64 so that long geometric sequences stay exact enough to
/// compare consecutive values.
///
/// # Example
///
/// ```ignore
/// let mut schedule = ExponentialRamp::new(1e-6, 1.1);
///
/// for _ in 0..num_iterations {
///     let lr = schedule.get_lr();
///     // ... run one iteration at `lr` ...
///     schedule.step();
/// }
///
/// schedule.reset();
/// ```
pub trait LRScheduler {
    /// Get the learning rate for the current step.
    fn get_lr(&self) -> f64;

    /// Advance to the next step.
    fn step(&mut self);

    /// Return to the initial rate and step 0.
    fn reset(&mut self);

    /// Number of `step` calls since construction or the last `reset`.
    fn current_step(&self) -> usize;
}

/// Exponentially increasing learning rate.
///
/// Each `step` multiplies the current rate by `factor`:
///
/// `lr_{k+1} = lr_k * factor`
///
/// The multiplication is applied to the previous rate rather than computed as
/// `initial_lr * factor^k`, so every pair of consecutive rates differs by exactly
/// one floating-point multiplication.
///
/// # Example
///
/// ```
/// use lr_finder::utils::lr_scheduler::{ExponentialRamp, LRScheduler};
///
/// let mut ramp = ExponentialRamp::new(1e-6, 1.1);
/// ramp.step();
/// assert!((ramp.get_lr() - 1.1e-6).abs() < 1e-18);
/// ```
#[derive(Debug, Clone)]
pub struct ExponentialRamp {
    initial_lr: f64,
    factor: f64,
    current_step: usize,
    current_lr: f64,
}

impl ExponentialRamp {
    /// Creates a ramp starting at `initial_lr` and growing by `factor` per step.
    ///
    /// Callers are expected to pass `initial_lr > 0` and `factor > 1`; see
    /// [`crate::config::SearchConfig::validate`].
    pub fn new(initial_lr: f64, factor: f64) -> Self {
        Self {
            initial_lr,
            factor,
            current_step: 0,
            current_lr: initial_lr,
        }
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl LRScheduler for ExponentialRamp {
    fn get_lr(&self) -> f64 {
        self.current_lr
    }

    fn step(&mut self) {
        self.current_step += 1;
        self.current_lr *= self.factor;
    }

    fn reset(&mut self) {
        self.current_step = 0;
        self.current_lr = self.initial_lr;
    }

    fn current_step(&self) -> usize {
        self.current_step
    }
}
