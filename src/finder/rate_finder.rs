//! Rate finder: drives one exponential learning rate sweep.
//!
//! The sweep runs against live training state. The unit is initialised and
//! snapshotted first, trained at a geometrically growing rate until the
//! stopping criterion fires, and then restored from the snapshot whether the
//! sweep succeeded or not.

use crate::config::SearchConfig;
use crate::error::{FinderError, Result};
use crate::finder::stopping::StoppingCriterion;
use crate::finder::trace::ResultTrace;
use crate::finder::unit::TrainableUnit;
use crate::utils::lr_scheduler::{ExponentialRamp, LRScheduler};

/// Runs learning rate sweeps against one trainable unit.
///
/// The finder holds the unit mutably for its whole lifetime, so nothing else
/// can touch the unit's state between snapshot and restore.
///
/// # Example
///
/// ```ignore
/// let mut finder = RateFinder::new(&mut unit, SearchConfig::default());
/// let trace = finder.find()?;
/// trace.write_json("logs/lr_sweep.json")?;
/// ```
pub struct RateFinder<'a, U: TrainableUnit> {
    unit: &'a mut U,
    config: SearchConfig,
}

impl<'a, U: TrainableUnit> RateFinder<'a, U> {
    /// Borrow `unit` for sweeps; the configuration is validated by `find`.
    pub fn new(unit: &'a mut U, config: SearchConfig) -> Self {
        Self { unit, config }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Run one sweep with the configured search parameters.
    pub fn find(&mut self) -> Result<ResultTrace> {
        let config = self.config.clone();
        self.run(&config)
    }

    /// Run one sweep with explicit start rate, multiplier and smoothing.
    ///
    /// `min_iterations` and `max_iterations` come from the finder's
    /// configuration. The stored configuration is left unchanged.
    pub fn find_with(
        &mut self,
        lr_start: f64,
        lr_multiplier: f64,
        smoothing: f64,
    ) -> Result<ResultTrace> {
        let config = SearchConfig {
            lr_start,
            lr_multiplier,
            smoothing,
            ..self.config.clone()
        };
        self.run(&config)
    }

    fn run(&mut self, config: &SearchConfig) -> Result<ResultTrace> {
        config.validate()?;

        tracing::info!(
            lr_start = config.lr_start,
            lr_multiplier = config.lr_multiplier,
            smoothing = config.smoothing,
            min_iterations = config.min_iterations,
            max_iterations = ?config.max_iterations,
            "Starting learning rate sweep"
        );

        self.unit.ensure_initialized()?;
        let snapshot = self.unit.snapshot_state()?;

        match self.sweep(config) {
            Ok(trace) => {
                self.unit.restore_state(snapshot).map_err(restore_failure)?;
                tracing::info!(
                    iterations = trace.len(),
                    final_lr = ?trace.last().map(|p| p.learning_rate),
                    "Learning rate sweep finished, unit state restored"
                );
                Ok(trace)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Sweep iteration failed, restoring unit state");
                if let Err(restore_err) = self.unit.restore_state(snapshot) {
                    tracing::error!(
                        iteration_error = %err,
                        restore_error = %restore_err,
                        "Unit state could not be restored after a failed sweep"
                    );
                    return Err(restore_failure(restore_err));
                }
                Err(err)
            }
        }
    }

    fn sweep(&mut self, config: &SearchConfig) -> Result<ResultTrace> {
        let mut criterion = StoppingCriterion::new(config.smoothing, config.min_iterations);
        let mut schedule = ExponentialRamp::new(config.lr_start, config.lr_multiplier);
        let mut trace = ResultTrace::new();

        loop {
            let rate = schedule.get_lr();
            let loss = self.unit.run_iteration(Some(rate), true)?;
            trace.push(rate, loss);

            let stop = criterion.evaluate(loss);
            tracing::debug!(
                iteration = criterion.iteration_count(),
                learning_rate = rate,
                loss,
                running_mean = criterion.running_mean(),
                "Sweep iteration"
            );

            if stop {
                break;
            }
            if config.max_iterations == Some(trace.len()) {
                tracing::warn!(
                    iterations = trace.len(),
                    learning_rate = rate,
                    "Iteration cap reached before the loss diverged"
                );
                break;
            }

            schedule.step();
        }

        Ok(trace)
    }
}

fn restore_failure(err: FinderError) -> FinderError {
    match err {
        FinderError::Restore(_) => err,
        other => FinderError::Restore(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    /// Unit whose loss sequence is scripted and whose "state" is one counter.
    struct ScriptedUnit {
        losses: Vec<f64>,
        cursor: usize,
        updates: usize,
        initialised: bool,
        rates_seen: Vec<Option<f64>>,
        restored: usize,
    }

    impl ScriptedUnit {
        fn new(losses: Vec<f64>) -> Self {
            Self {
                losses,
                cursor: 0,
                updates: 0,
                initialised: false,
                rates_seen: Vec::new(),
                restored: 0,
            }
        }
    }

    impl TrainableUnit for ScriptedUnit {
        type Snapshot = usize;

        fn run_iteration(&mut self, rate: Option<f64>, apply_update: bool) -> Result<f64> {
            self.rates_seen.push(rate);
            if !apply_update {
                self.initialised = true;
                return Ok(99.0);
            }
            let loss = self.losses[self.cursor.min(self.losses.len() - 1)];
            self.cursor += 1;
            self.updates += 1;
            Ok(loss)
        }

        fn snapshot_state(&self) -> Result<usize> {
            assert!(self.initialised, "snapshot taken before initialisation");
            Ok(self.updates)
        }

        fn restore_state(&mut self, snapshot: usize) -> Result<()> {
            self.updates = snapshot;
            self.restored += 1;
            Ok(())
        }
    }

    #[test]
    fn test_scenario_stops_on_fourth_call() {
        let mut unit = ScriptedUnit::new(vec![1.0, 1.0, 1.0, 3.0, 3.0]);
        let config = SearchConfig {
            min_iterations: 3,
            ..SearchConfig::default()
        };
        let trace = RateFinder::new(&mut unit, config).find().unwrap();

        assert_eq!(trace.len(), 4);
        assert_eq!(trace.losses(), vec![1.0, 1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_noop_iteration_runs_first_and_is_not_recorded() {
        let mut unit = ScriptedUnit::new(vec![1.0, 5.0]);
        let config = SearchConfig {
            min_iterations: 2,
            ..SearchConfig::default()
        };
        let trace = RateFinder::new(&mut unit, config).find().unwrap();

        assert_eq!(unit.rates_seen[0], None);
        assert!(unit.rates_seen[1..].iter().all(|r| r.is_some()));
        assert!(trace.losses().iter().all(|&l| l != 99.0));
    }

    #[test]
    fn test_state_restored_after_sweep() {
        let mut unit = ScriptedUnit::new(vec![1.0, 1.0, 10.0]);
        let config = SearchConfig {
            min_iterations: 2,
            ..SearchConfig::default()
        };
        RateFinder::new(&mut unit, config).find().unwrap();

        assert_eq!(unit.updates, 0);
        assert_eq!(unit.restored, 1);
    }

    #[test]
    fn test_find_with_overrides_rates() {
        let mut unit = ScriptedUnit::new(vec![1.0; 4]);
        let config = SearchConfig {
            min_iterations: 1,
            max_iterations: Some(4),
            ..SearchConfig::default()
        };
        let mut finder = RateFinder::new(&mut unit, config);
        let trace = finder.find_with(0.01, 2.0, 0.5).unwrap();

        assert_eq!(finder.config().lr_start, 1e-6);
        let rates = trace.rates();
        assert_eq!(rates.len(), 4);
        assert_relative_eq!(rates[3], 0.08, max_relative = 1e-12);
    }

    #[test]
    fn test_invalid_config_touches_nothing() {
        let mut unit = ScriptedUnit::new(vec![1.0]);
        let config = SearchConfig {
            lr_multiplier: 1.0,
            ..SearchConfig::default()
        };
        let result = RateFinder::new(&mut unit, config).find();

        assert!(matches!(result, Err(FinderError::Config(_))));
        assert!(unit.rates_seen.is_empty());
    }
}
