//! Trainable unit contract.

use crate::error::Result;

/// A model plus optimizer plus data source that can run single training
/// iterations and capture/restore its complete mutable state.
///
/// The finder passes the learning rate explicitly on every call instead of
/// mutating a rate held by the unit between calls.
///
/// # Contract
///
/// - `run_iteration(Some(rate), _)` applies `rate` before computing the step.
///   `None` keeps the unit's configured rate.
/// - `run_iteration(_, false)` runs the forward and backward passes so lazily
///   created state gets initialised, but does not change any parameter.
/// - The loss is returned only once it has been fully computed.
/// - Each call consumes one batch from a data source that never runs dry.
/// - `snapshot_state` captures everything that affects future training
///   outputs: parameters, optimizer accumulators and step counters, and the
///   configured learning rate. A snapshot of parameters alone is not enough.
/// - `restore_state` either restores the snapshot completely or fails; it must
///   not leave the unit partially restored without reporting it.
pub trait TrainableUnit {
    /// Opaque deep copy of the unit's state.
    type Snapshot;

    /// Run one training iteration and return its loss.
    fn run_iteration(&mut self, rate: Option<f64>, apply_update: bool) -> Result<f64>;

    /// Force lazy initialisation of parameters and optimizer state.
    ///
    /// The default runs one iteration without an update and discards its loss.
    fn ensure_initialized(&mut self) -> Result<()> {
        self.run_iteration(None, false).map(|_| ())
    }

    fn snapshot_state(&self) -> Result<Self::Snapshot>;

    /// Restore a snapshot taken from this unit. Consumes the snapshot.
    fn restore_state(&mut self, snapshot: Self::Snapshot) -> Result<()>;
}
