//! Smoothed divergence test for a learning rate sweep.

/// Decides when a sweep's loss has clearly diverged.
///
/// Feed it every iteration's loss in order. It keeps the first loss, a running
/// mean and an iteration count:
///
/// ```text
/// mean_1 = loss_1
/// mean_k = (1 - smoothing) * loss_k + smoothing * mean_{k-1}
/// stop_k = k >= min_iterations && (mean_k > 2 * loss_1 || mean_k is NaN)
/// ```
///
/// `smoothing` weights the previous mean, not the new sample: the larger it is,
/// the more the mean follows history.
///
/// Non-finite losses go through the recurrence unchanged. Once the mean is NaN
/// every later mean is NaN too, which no `>` comparison can detect, so a NaN
/// mean counts as divergent. An infinite mean is caught by the comparison.
///
/// A criterion belongs to exactly one sweep; create a new one per sweep so the
/// first loss of an earlier sweep cannot leak in.
///
/// # Example
///
/// ```
/// use lr_finder::StoppingCriterion;
///
/// let mut criterion = StoppingCriterion::new(0.3, 3);
/// let stops: Vec<bool> = [1.0, 1.0, 1.0, 3.0]
///     .iter()
///     .map(|&loss| criterion.evaluate(loss))
///     .collect();
/// assert_eq!(stops, vec![false, false, false, true]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct StoppingCriterion {
    smoothing: f64,
    min_iterations: usize,
    first_loss: Option<f64>,
    running_mean: f64,
    iteration_count: usize,
}

impl StoppingCriterion {
    pub const DEFAULT_SMOOTHING: f64 = 0.3;
    pub const DEFAULT_MIN_ITERATIONS: usize = 20;

    /// Divergence factor relative to the first loss.
    pub const DIVERGENCE_FACTOR: f64 = 2.0;

    /// Create a criterion for one sweep.
    ///
    /// # Arguments
    ///
    /// * `smoothing` - Weight of the previous mean, in `[0, 1)`
    /// * `min_iterations` - No stop is reported before this many losses
    pub fn new(smoothing: f64, min_iterations: usize) -> Self {
        Self {
            smoothing,
            min_iterations,
            first_loss: None,
            running_mean: 0.0,
            iteration_count: 0,
        }
    }

    /// Consume the next loss; `true` means the sweep should stop.
    pub fn evaluate(&mut self, loss: f64) -> bool {
        let first = match self.first_loss {
            Some(first) => first,
            None => {
                self.first_loss = Some(loss);
                self.running_mean = loss;
                self.iteration_count = 1;
                return false;
            }
        };

        self.iteration_count += 1;
        self.running_mean = (1.0 - self.smoothing) * loss + self.smoothing * self.running_mean;

        self.iteration_count >= self.min_iterations
            && (self.running_mean.is_nan()
                || self.running_mean > Self::DIVERGENCE_FACTOR * first)
    }

    /// Loss of the first `evaluate` call, if any.
    pub fn first_loss(&self) -> Option<f64> {
        self.first_loss
    }

    /// Current smoothed loss.
    ///
    /// Equals the first loss after one call and `0.0` before any call.
    ///
    /// # Examples
    ///
    /// ```
    /// use lr_finder::StoppingCriterion;
    ///
    /// let mut criterion = StoppingCriterion::new(0.5, 10);
    /// criterion.evaluate(2.0);
    /// criterion.evaluate(4.0);
    /// assert_eq!(criterion.running_mean(), 3.0);
    /// ```
    pub fn running_mean(&self) -> f64 {
        self.running_mean
    }

    /// Number of losses consumed so far, the first one included.
    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    /// Weight kept by the running mean on each update.
    pub fn smoothing(&self) -> f64 {
        self.smoothing
    }

    /// Iterations that must be seen before a stop can be reported.
    pub fn min_iterations(&self) -> usize {
        self.min_iterations
    }
}

impl Default for StoppingCriterion {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SMOOTHING, Self::DEFAULT_MIN_ITERATIONS)
    }
}
