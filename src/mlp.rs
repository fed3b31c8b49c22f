//! Two-layer dense classifier exposed as a [`TrainableUnit`].
//!
//! Network: `input → Dense → ReLU → Dense → softmax`, trained with mean
//! softmax cross-entropy on batches drawn from a [`BatchStream`]. The layers
//! are created lazily from the dataset width, either by `ensure_initialized`
//! or by the first iteration, and each parameter buffer (hidden weights, hidden biases, output weights, output
//! biases) gets its own optimizer cloned from a prototype.

use crate::config::TrainingConfig;
use crate::data::{Batch, BatchStream, CyclicSampler, Dataset};
use crate::error::{FinderError, Result};
use crate::finder::TrainableUnit;
use crate::layers::{DenseLayer, Layer};
use crate::optimizers::{Adam, AnyOptimizer, Optimizer, SGD};
use crate::utils::{relu_backward_inplace, relu_inplace, softmax_cross_entropy};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Number of parameter buffers in the network.
const PARAM_GROUPS: usize = 4;

/// Parameters and optimizer state of an initialised network.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpState<O> {
    pub hidden: DenseLayer,
    pub output: DenseLayer,
    /// One optimizer per parameter buffer, in `param_groups` order
    /// (hidden layer first).
    pub optimizers: Vec<O>,
}

/// Full copy of an [`MlpUnit`]'s training state.
///
/// `state` is `None` when the snapshot was taken before the lazy
/// initialisation ran.
#[derive(Debug, Clone, PartialEq)]
pub struct MlpSnapshot<O> {
    pub state: Option<MlpState<O>>,
    pub learning_rate: f64,
    pub steps: usize,
    pub sampler: CyclicSampler,
}

/// MLP classifier plus optimizer plus data stream.
///
/// # Example
///
/// ```
/// use lr_finder::data::{BatchStream, Dataset};
/// use lr_finder::mlp::MlpUnit;
/// use lr_finder::optimizers::SGD;
/// use lr_finder::{RateFinder, config::SearchConfig};
///
/// let dataset = Dataset::synthetic_blobs(64, 4, 2, 1).unwrap();
/// let stream = BatchStream::new(dataset, 8, 1).unwrap();
/// let mut unit = MlpUnit::new(stream, 16, SGD::with_momentum(0.01, 0.9), 0.01, 1);
///
/// let config = SearchConfig { lr_start: 1e-4, lr_multiplier: 1.5, max_iterations: Some(200), ..SearchConfig::default() };
/// let trace = RateFinder::new(&mut unit, config).find().unwrap();
/// assert!(trace.len() >= 20);
/// assert_eq!(unit.step_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MlpUnit<O: Optimizer + Clone> {
    stream: BatchStream,
    hidden_size: usize,
    seed: u64,
    learning_rate: f64,
    prototype: O,
    state: Option<MlpState<O>>,
    steps: usize,
}

impl<O: Optimizer + Clone> MlpUnit<O> {
    /// Create an uninitialised unit. `seed` drives weight initialisation.
    pub fn new(
        stream: BatchStream,
        hidden_size: usize,
        optimizer: O,
        learning_rate: f64,
        seed: u64,
    ) -> Self {
        Self {
            stream,
            hidden_size,
            seed,
            learning_rate,
            prototype: optimizer,
            state: None,
            steps: 0,
        }
    }

    /// Rate used by the last update, or the configured rate before any.
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Number of parameter updates applied.
    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// Whether the layers have been built.
    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// Layers and per-group optimizers, once built.
    pub fn state(&self) -> Option<&MlpState<O>> {
        self.state.as_ref()
    }

    /// Batch source the unit trains on.
    pub fn stream(&self) -> &BatchStream {
        &self.stream
    }

    /// One ordinary training step at the unit's own learning rate.
    pub fn train_step(&mut self) -> Result<f64> {
        self.run_iteration(None, true)
    }

    /// Mean loss on `batch` without touching any state.
    pub fn evaluate_loss(&self, batch: &Batch) -> Result<f64> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| FinderError::Unit("network is not initialised".to_string()))?;
        self.check_batch(state, batch)?;

        let (_, mut logits) = forward(state, batch);
        let classes = state.output.output_size();
        let mut delta = vec![0.0f32; logits.len()];
        let loss = softmax_cross_entropy(&mut logits, &batch.labels, batch.size(), classes, &mut delta);
        Ok(loss as f64)
    }

    fn num_classes(&self) -> usize {
        self.stream.dataset().num_classes()
    }

    fn build_state(&self, num_features: usize) -> MlpState<O> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let hidden = DenseLayer::new(num_features, self.hidden_size, &mut rng);
        let output = DenseLayer::new(self.hidden_size, self.num_classes(), &mut rng);

        let sizes = hidden
            .param_group_sizes()
            .into_iter()
            .chain(output.param_group_sizes());
        let optimizers = sizes
            .map(|len| {
                let mut optimizer = self.prototype.clone();
                optimizer.set_learning_rate(self.learning_rate as f32);
                optimizer.init_state(len);
                optimizer
            })
            .collect();

        tracing::debug!(
            num_features,
            hidden_size = self.hidden_size,
            num_classes = self.num_classes(),
            "Initialised MLP parameters and optimizer state"
        );

        MlpState {
            hidden,
            output,
            optimizers,
        }
    }

    fn check_batch(&self, state: &MlpState<O>, batch: &Batch) -> Result<()> {
        if batch.num_features != state.hidden.input_size() {
            return Err(FinderError::Unit(format!(
                "batch has {} features but the network expects {}",
                batch.num_features,
                state.hidden.input_size()
            )));
        }
        if batch.size() == 0 {
            return Err(FinderError::Unit("empty batch".to_string()));
        }
        if batch.features.len() != batch.size() * batch.num_features {
            return Err(FinderError::Unit(format!(
                "batch holds {} feature values for {} rows of {}",
                batch.features.len(),
                batch.size(),
                batch.num_features
            )));
        }
        let classes = state.output.output_size();
        if let Some(&label) = batch.labels.iter().find(|&&label| label >= classes) {
            return Err(FinderError::Unit(format!(
                "label {} out of range for {} classes",
                label, classes
            )));
        }
        Ok(())
    }

    fn check_snapshot(&self, snapshot: &MlpSnapshot<O>) -> Result<()> {
        if snapshot.sampler.len() != self.stream.dataset().len() {
            return Err(FinderError::Restore(format!(
                "snapshot sampler covers {} samples, dataset has {}",
                snapshot.sampler.len(),
                self.stream.dataset().len()
            )));
        }

        let Some(saved) = &snapshot.state else {
            return Ok(());
        };

        let expected = (
            self.stream.dataset().num_features(),
            self.hidden_size,
            self.num_classes(),
        );
        let found = (
            saved.hidden.input_size(),
            saved.hidden.output_size(),
            saved.output.output_size(),
        );
        if found != expected || saved.output.input_size() != self.hidden_size {
            return Err(FinderError::Restore(format!(
                "snapshot network shape {:?} does not match {:?}",
                found, expected
            )));
        }

        if saved.optimizers.len() != PARAM_GROUPS {
            return Err(FinderError::Restore(format!(
                "snapshot holds {} optimizers, expected {}",
                saved.optimizers.len(),
                PARAM_GROUPS
            )));
        }

        let sizes = saved
            .hidden
            .param_group_sizes()
            .into_iter()
            .chain(saved.output.param_group_sizes());
        for (i, (optimizer, len)) in saved.optimizers.iter().zip(sizes).enumerate() {
            let state_len = optimizer.state_len();
            if state_len != 0 && state_len != len {
                return Err(FinderError::Restore(format!(
                    "optimizer {} state covers {} parameters, buffer has {}",
                    i, state_len, len
                )));
            }
        }

        Ok(())
    }
}

impl<O: Optimizer + Clone> TrainableUnit for MlpUnit<O> {
    type Snapshot = MlpSnapshot<O>;

    fn run_iteration(&mut self, rate: Option<f64>, apply_update: bool) -> Result<f64> {
        let rate = rate.unwrap_or(self.learning_rate);
        // Optimizers run in f32, so the rate has to survive the narrowing.
        let learning_rate = rate as f32;
        if !learning_rate.is_finite() || learning_rate <= 0.0 {
            return Err(FinderError::Unit(format!(
                "learning rate must be positive and finite in f32, got {}",
                rate
            )));
        }
        self.learning_rate = rate;

        let batch = self.stream.next_batch();
        if self.state.is_none() {
            self.state = Some(self.build_state(batch.num_features));
        }

        let mut state = match self.state.take() {
            Some(state) => state,
            None => return Err(FinderError::Unit("network is not initialised".to_string())),
        };
        if let Err(err) = self.check_batch(&state, &batch) {
            self.state = Some(state);
            return Err(err);
        }

        let rows = batch.size();
        let classes = state.output.output_size();
        let (hidden_act, mut logits) = forward(&state, &batch);

        let mut delta = vec![0.0f32; rows * classes];
        let loss = softmax_cross_entropy(&mut logits, &batch.labels, rows, classes, &mut delta);

        let mut grad_hidden = vec![0.0f32; hidden_act.len()];
        state.output.backward(&hidden_act, &delta, &mut grad_hidden, rows);
        relu_backward_inplace(&mut grad_hidden, &hidden_act);
        let mut grad_input = vec![0.0f32; batch.features.len()];
        state
            .hidden
            .backward(&batch.features, &grad_hidden, &mut grad_input, rows);

        if apply_update {
            let MlpState {
                hidden,
                output,
                optimizers,
            } = &mut state;
            let groups = hidden.param_groups().into_iter().chain(output.param_groups());
            for ((params, grads), optimizer) in groups.zip(optimizers.iter_mut()) {
                optimizer.set_learning_rate(learning_rate);
                optimizer.update(params, grads);
            }
            self.steps += 1;
        }

        self.state = Some(state);
        Ok(loss as f64)
    }

    /// Builds the network from the dataset width without drawing a batch, so
    /// the stream position and stored gradients are left as they are.
    fn ensure_initialized(&mut self) -> Result<()> {
        if self.state.is_none() {
            self.state = Some(self.build_state(self.stream.dataset().num_features()));
        }
        Ok(())
    }

    fn snapshot_state(&self) -> Result<MlpSnapshot<O>> {
        Ok(MlpSnapshot {
            state: self.state.clone(),
            learning_rate: self.learning_rate,
            steps: self.steps,
            sampler: self.stream.sampler().clone(),
        })
    }

    fn restore_state(&mut self, snapshot: MlpSnapshot<O>) -> Result<()> {
        self.check_snapshot(&snapshot)?;

        let MlpSnapshot {
            state,
            learning_rate,
            steps,
            sampler,
        } = snapshot;
        self.stream
            .set_sampler(sampler)
            .map_err(|e| FinderError::Restore(e.to_string()))?;
        self.state = state;
        self.learning_rate = learning_rate;
        self.steps = steps;
        Ok(())
    }
}

impl MlpUnit<AnyOptimizer> {
    /// Build a unit on a synthetic dataset from a training configuration.
    pub fn from_config(config: &TrainingConfig) -> Result<Self> {
        config.validate()?;

        let dataset = Dataset::synthetic_blobs_with_spread(
            config.num_samples,
            config.num_features,
            config.num_classes,
            config.cluster_spread,
            config.seed,
        )?;
        let stream = BatchStream::new(dataset, config.batch_size, config.seed)?;

        let optimizer: AnyOptimizer = match config.optimizer.as_str() {
            "sgd" => SGD::with_momentum(config.learning_rate, config.momentum.unwrap_or(0.0)).into(),
            "adam" => Adam::new(
                config.learning_rate,
                config.beta1,
                config.beta2,
                config.epsilon,
            )
            .into(),
            other => {
                return Err(FinderError::Config(format!("unknown optimizer '{}'", other)));
            }
        };

        Ok(Self::new(
            stream,
            config.hidden_size,
            optimizer,
            config.learning_rate as f64,
            config.seed,
        ))
    }
}

/// Returns the hidden activations (post-ReLU) and the output logits.
fn forward<O>(state: &MlpState<O>, batch: &Batch) -> (Vec<f32>, Vec<f32>) {
    let rows = batch.size();
    let mut hidden_act = vec![0.0f32; rows * state.hidden.output_size()];
    state.hidden.forward(&batch.features, &mut hidden_act, rows);
    relu_inplace(&mut hidden_act);

    let mut logits = vec![0.0f32; rows * state.output.output_size()];
    state.output.forward(&hidden_act, &mut logits, rows);
    (hidden_act, logits)
}
