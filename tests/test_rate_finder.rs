//! Tests for the rate finder sweep
//!
//! This file tests RateFinder against scripted trainable units:
//! - Geometric rate progression
//! - Trace length and stopping
//! - Iteration cap
//! - State restoration after success and after failure
//! - Restore failures

use approx::assert_relative_eq;
use lr_finder::config::SearchConfig;
use lr_finder::{FinderError, RateFinder, Result, TrainableUnit};

/// Unit whose losses follow a script and whose state is one weight that
/// every update moves by the applied rate.
struct ScriptedUnit {
    losses: Vec<f64>,
    cursor: usize,
    weight: f64,
    initialised: bool,
    fail_at: Option<usize>,
    fail_restore: bool,
    calls: Vec<(Option<f64>, bool)>,
}

impl ScriptedUnit {
    fn new(losses: Vec<f64>) -> Self {
        Self {
            losses,
            cursor: 0,
            weight: 1.0,
            initialised: false,
            fail_at: None,
            fail_restore: false,
            calls: Vec::new(),
        }
    }

    fn failing_at(mut self, update: usize) -> Self {
        self.fail_at = Some(update);
        self
    }

    fn with_broken_restore(mut self) -> Self {
        self.fail_restore = true;
        self
    }

    fn updates(&self) -> usize {
        self.calls.iter().filter(|(_, apply)| *apply).count()
    }
}

impl TrainableUnit for ScriptedUnit {
    type Snapshot = f64;

    fn run_iteration(&mut self, rate: Option<f64>, apply_update: bool) -> Result<f64> {
        self.calls.push((rate, apply_update));
        if !apply_update {
            self.initialised = true;
            return Ok(0.0);
        }
        if self.fail_at == Some(self.updates()) {
            return Err(FinderError::Unit("scripted failure".to_string()));
        }
        self.weight -= rate.unwrap_or(0.0);
        let loss = self.losses[self.cursor.min(self.losses.len() - 1)];
        self.cursor += 1;
        Ok(loss)
    }

    fn snapshot_state(&self) -> Result<f64> {
        if !self.initialised {
            return Err(FinderError::Unit("snapshot before initialisation".to_string()));
        }
        Ok(self.weight)
    }

    fn restore_state(&mut self, snapshot: f64) -> Result<()> {
        if self.fail_restore {
            return Err(FinderError::Unit("restore refused".to_string()));
        }
        self.weight = snapshot;
        Ok(())
    }
}

/// Losses that stay flat and then climb steeply.
fn flat_then_rising(flat: usize) -> Vec<f64> {
    let mut losses = vec![1.0; flat];
    losses.extend((1..=50).map(|i| 1.0 + i as f64));
    losses
}

// ============================================================================
// Rate Progression Tests
// ============================================================================

mod rate_progression_tests {
    use super::*;

    #[test]
    fn test_rates_are_geometric() {
        let mut unit = ScriptedUnit::new(flat_then_rising(40));
        let config = SearchConfig {
            lr_start: 3e-5,
            lr_multiplier: 1.3,
            ..SearchConfig::default()
        };
        let trace = RateFinder::new(&mut unit, config).find().unwrap();

        let rates = trace.rates();
        assert!(rates.len() > 20);
        assert_eq!(rates[0], 3e-5);
        for pair in rates.windows(2) {
            assert_relative_eq!(pair[1] / pair[0], 1.3, max_relative = 1e-12);
        }
    }

    #[test]
    fn test_scenario_rates() {
        let mut unit = ScriptedUnit::new(vec![1.0, 1.0, 1.0, 3.0, 3.0]);
        let config = SearchConfig {
            lr_start: 1e-6,
            lr_multiplier: 1.1,
            smoothing: 0.3,
            min_iterations: 3,
            max_iterations: None,
        };
        let trace = RateFinder::new(&mut unit, config).find().unwrap();

        let expected = [1e-6, 1.1e-6, 1.21e-6, 1.331e-6];
        assert_eq!(trace.len(), expected.len());
        for (rate, want) in trace.rates().iter().zip(expected.iter()) {
            assert_relative_eq!(*rate, *want, max_relative = 1e-12);
        }
        assert_eq!(trace.losses(), vec![1.0, 1.0, 1.0, 3.0]);
    }

    #[test]
    fn test_every_sweep_iteration_gets_an_explicit_rate() {
        let mut unit = ScriptedUnit::new(flat_then_rising(5));
        let config = SearchConfig {
            min_iterations: 3,
            ..SearchConfig::default()
        };
        let trace = RateFinder::new(&mut unit, config).find().unwrap();

        assert_eq!(unit.calls[0], (None, false));
        let applied: Vec<Option<f64>> = unit.calls[1..].iter().map(|(r, _)| *r).collect();
        let recorded: Vec<Option<f64>> = trace.rates().into_iter().map(Some).collect();
        assert_eq!(applied, recorded);
    }
}

// ============================================================================
// Termination Tests
// ============================================================================

mod termination_tests {
    use super::*;

    #[test]
    fn test_trace_reaches_min_iterations() {
        // Diverges immediately, so only the floor holds the sweep open.
        let losses: Vec<f64> = (0..100).map(|i| 1.0 + 10.0 * i as f64).collect();
        for min_iterations in [1, 2, 5, 20, 37] {
            let mut unit = ScriptedUnit::new(losses.clone());
            let config = SearchConfig {
                min_iterations,
                ..SearchConfig::default()
            };
            let trace = RateFinder::new(&mut unit, config).find().unwrap();
            assert_eq!(trace.len(), min_iterations.max(2));
        }
    }

    #[test]
    fn test_cap_ends_a_flat_sweep() {
        let mut unit = ScriptedUnit::new(vec![1.0]);
        let config = SearchConfig {
            min_iterations: 10,
            max_iterations: Some(30),
            ..SearchConfig::default()
        };
        let trace = RateFinder::new(&mut unit, config).find().unwrap();

        assert_eq!(trace.len(), 30);
        assert_eq!(unit.updates(), 30);
    }

    #[test]
    fn test_nan_loss_ends_sweep_at_floor() {
        let mut losses = vec![1.0, 1.0];
        losses.push(f64::NAN);
        let mut unit = ScriptedUnit::new(losses);
        let config = SearchConfig {
            min_iterations: 6,
            max_iterations: Some(1000),
            ..SearchConfig::default()
        };
        let trace = RateFinder::new(&mut unit, config).find().unwrap();

        assert_eq!(trace.len(), 6);
        assert!(trace.last().unwrap().loss.is_nan());
    }

    #[test]
    fn test_cap_below_floor_rejected() {
        let mut unit = ScriptedUnit::new(vec![1.0]);
        let config = SearchConfig {
            min_iterations: 10,
            max_iterations: Some(5),
            ..SearchConfig::default()
        };
        let result = RateFinder::new(&mut unit, config).find();

        assert!(matches!(result, Err(FinderError::Config(_))));
        assert!(unit.calls.is_empty());
    }
}

// ============================================================================
// Restoration Tests
// ============================================================================

mod restoration_tests {
    use super::*;

    #[test]
    fn test_weight_restored_after_sweep() {
        let mut unit = ScriptedUnit::new(flat_then_rising(25));
        let trace = RateFinder::new(&mut unit, SearchConfig::default())
            .find()
            .unwrap();

        assert!(trace.len() >= 20);
        assert_eq!(unit.weight, 1.0);
    }

    #[test]
    fn test_repeated_sweeps_see_same_state() {
        let mut unit = ScriptedUnit::new(vec![1.0]);
        let config = SearchConfig {
            min_iterations: 5,
            max_iterations: Some(8),
            ..SearchConfig::default()
        };
        let mut finder = RateFinder::new(&mut unit, config);
        let first = finder.find().unwrap();
        let second = finder.find_with(1e-6, 1.1, 0.3).unwrap();

        assert_eq!(first, second);
        assert_eq!(unit.weight, 1.0);
    }

    #[test]
    fn test_failed_iteration_restores_and_propagates() {
        let mut unit = ScriptedUnit::new(vec![1.0]).failing_at(7);
        let result = RateFinder::new(&mut unit, SearchConfig::default()).find();

        match result {
            Err(FinderError::Unit(msg)) => assert_eq!(msg, "scripted failure"),
            other => panic!("expected unit error, got {:?}", other),
        }
        assert_eq!(unit.weight, 1.0);
    }

    #[test]
    fn test_restore_failure_is_fatal() {
        let mut unit = ScriptedUnit::new(flat_then_rising(20)).with_broken_restore();
        let result = RateFinder::new(&mut unit, SearchConfig::default()).find();

        let err = result.unwrap_err();
        assert!(err.is_restore_failure());
    }

    #[test]
    fn test_restore_failure_after_failed_iteration_reported() {
        let mut unit = ScriptedUnit::new(vec![1.0])
            .failing_at(3)
            .with_broken_restore();
        let result = RateFinder::new(&mut unit, SearchConfig::default()).find();

        assert!(matches!(result, Err(FinderError::Restore(_))));
    }
}
