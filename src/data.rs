//! Data pipeline: in-memory datasets and an infinite batch stream.
//!
//! A learning rate sweep runs until the loss diverges, not until the data runs
//! out, so every training iteration must be able to draw a batch.
//!
//! * **[`Dataset`]**: features and class labels held in memory.
//! * **[`CyclicSampler`]**: endless stream of shuffled indices; reshuffles and
//!   restarts whenever a pass over the data is exhausted.
//! * **[`BatchStream`]**: gathers fixed-size batches from a dataset through a
//!   cyclic sampler.

use crate::error::{FinderError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Labelled samples stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    features: Vec<f32>,
    labels: Vec<usize>,
    num_features: usize,
    num_classes: usize,
}

impl Dataset {
    /// Noise scale used by [`Dataset::synthetic_blobs`].
    pub const DEFAULT_SPREAD: f32 = 1.0;

    /// Build a dataset, checking that the buffers agree with each other.
    pub fn new(
        features: Vec<f32>,
        labels: Vec<usize>,
        num_features: usize,
        num_classes: usize,
    ) -> Result<Self> {
        if labels.is_empty() {
            return Err(FinderError::Data("dataset has no samples".to_string()));
        }
        if num_features == 0 {
            return Err(FinderError::Data("num_features must be positive".to_string()));
        }
        if features.len() != labels.len() * num_features {
            return Err(FinderError::Data(format!(
                "expected {} feature values for {} samples, got {}",
                labels.len() * num_features,
                labels.len(),
                features.len()
            )));
        }
        if let Some(&bad) = labels.iter().find(|&&label| label >= num_classes) {
            return Err(FinderError::Data(format!(
                "label {} out of range for {} classes",
                bad, num_classes
            )));
        }

        Ok(Self {
            features,
            labels,
            num_features,
            num_classes,
        })
    }

    /// Deterministic clustered classification data with the default spread.
    ///
    /// See [`Dataset::synthetic_blobs_with_spread`].
    pub fn synthetic_blobs(
        num_samples: usize,
        num_features: usize,
        num_classes: usize,
        seed: u64,
    ) -> Result<Self> {
        Self::synthetic_blobs_with_spread(
            num_samples,
            num_features,
            num_classes,
            Self::DEFAULT_SPREAD,
            seed,
        )
    }

    /// Deterministic clustered classification data.
    ///
    /// Each class gets a random centre in `[-2, 2]^num_features`; samples are
    /// their class centre plus per-feature noise with standard deviation
    /// `spread` (a sum of three uniforms on `[-spread, spread]`). At the
    /// default spread neighbouring clusters overlap, so the achievable loss
    /// stays above zero. Labels cycle through the classes.
    ///
    /// # Arguments
    ///
    /// * `num_samples` - Number of rows
    /// * `num_features` - Values per row
    /// * `num_classes` - Number of clusters, at least 1
    /// * `spread` - Noise standard deviation, positive and finite
    /// * `seed` - Seed for centres and noise
    ///
    /// # Examples
    ///
    /// ```
    /// use lr_finder::data::Dataset;
    ///
    /// let tight = Dataset::synthetic_blobs_with_spread(30, 2, 3, 0.1, 7).unwrap();
    /// assert_eq!(tight.len(), 30);
    /// assert!(Dataset::synthetic_blobs_with_spread(30, 2, 3, 0.0, 7).is_err());
    /// ```
    pub fn synthetic_blobs_with_spread(
        num_samples: usize,
        num_features: usize,
        num_classes: usize,
        spread: f32,
        seed: u64,
    ) -> Result<Self> {
        if num_classes == 0 {
            return Err(FinderError::Data("num_classes must be positive".to_string()));
        }
        if !spread.is_finite() || spread <= 0.0 {
            return Err(FinderError::Data(format!(
                "spread must be positive and finite, got {}",
                spread
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let centres: Vec<f32> = (0..num_classes * num_features)
            .map(|_| rng.random_range(-2.0f32..2.0))
            .collect();

        let mut features = Vec::with_capacity(num_samples * num_features);
        let mut labels = Vec::with_capacity(num_samples);
        for i in 0..num_samples {
            let label = i % num_classes;
            let centre = &centres[label * num_features..(label + 1) * num_features];
            for &c in centre {
                let noise: f32 = (0..3).map(|_| rng.random_range(-1.0f32..1.0)).sum();
                features.push(c + spread * noise);
            }
            labels.push(label);
        }

        Self::new(features, labels, num_features, num_classes)
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Values per sample.
    pub fn num_features(&self) -> usize {
        self.num_features
    }

    /// Number of distinct labels; every label is below this.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Row-major feature buffer of `len() * num_features()` values.
    pub fn features(&self) -> &[f32] {
        &self.features
    }

    /// Class index of each row.
    pub fn labels(&self) -> &[usize] {
        &self.labels
    }

    /// Copy the samples at `indices` into a new batch, in order.
    ///
    /// # Panics
    ///
    /// Panics if an index is out of range.
    pub fn gather(&self, indices: &[usize]) -> Batch {
        let stride = self.num_features;
        let mut features = Vec::with_capacity(indices.len() * stride);
        let mut labels = Vec::with_capacity(indices.len());
        for &idx in indices {
            features.extend_from_slice(&self.features[idx * stride..(idx + 1) * stride]);
            labels.push(self.labels[idx]);
        }
        Batch {
            features,
            labels,
            num_features: stride,
        }
    }
}

/// One minibatch: `labels.len()` rows of `num_features` values.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub features: Vec<f32>,
    pub labels: Vec<usize>,
    pub num_features: usize,
}

impl Batch {
    /// Number of rows in the batch.
    pub fn size(&self) -> usize {
        self.labels.len()
    }
}

/// Infinite stream of shuffled indices over `0..len`.
///
/// Every pass (epoch) visits each index exactly once in a fresh random order.
/// `next()` never returns `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CyclicSampler {
    order: Vec<usize>,
    position: usize,
    epoch: usize,
    rng: StdRng,
}

impl CyclicSampler {
    /// Create a sampler over `0..len` whose first pass is already shuffled.
    ///
    /// # Arguments
    ///
    /// * `len` - Size of the index range, at least 1
    /// * `seed` - Seed of the shuffle RNG
    ///
    /// # Examples
    ///
    /// ```
    /// use lr_finder::data::CyclicSampler;
    ///
    /// let mut sampler = CyclicSampler::new(3, 1).unwrap();
    /// let mut pass: Vec<usize> = (0..3).map(|_| sampler.next_index()).collect();
    /// pass.sort();
    /// assert_eq!(pass, vec![0, 1, 2]);
    /// assert!(CyclicSampler::new(0, 1).is_err());
    /// ```
    pub fn new(len: usize, seed: u64) -> Result<Self> {
        if len == 0 {
            return Err(FinderError::Data(
                "cannot sample from an empty index range".to_string(),
            ));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut rng);

        Ok(Self {
            order,
            position: 0,
            epoch: 0,
            rng,
        })
    }

    /// Size of the index range.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Number of completed passes over the index range.
    pub fn epoch(&self) -> usize {
        self.epoch
    }

    /// Next index, reshuffling when a pass is exhausted.
    pub fn next_index(&mut self) -> usize {
        if self.position == self.order.len() {
            self.order.shuffle(&mut self.rng);
            self.position = 0;
            self.epoch += 1;
        }
        let idx = self.order[self.position];
        self.position += 1;
        idx
    }
}

impl Iterator for CyclicSampler {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        Some(self.next_index())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Endless source of fixed-size batches.
///
/// Batches may straddle an epoch boundary; the sampler simply continues into
/// the next shuffled pass.
#[derive(Debug, Clone)]
pub struct BatchStream {
    dataset: Dataset,
    sampler: CyclicSampler,
    batch_size: usize,
    scratch: Vec<usize>,
}

impl BatchStream {
    /// Wrap `dataset` in an endless stream.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Samples to draw from, not empty
    /// * `batch_size` - Rows per batch, at least 1; may exceed the dataset size
    /// * `seed` - Seed of the sampler's shuffle RNG
    pub fn new(dataset: Dataset, batch_size: usize, seed: u64) -> Result<Self> {
        if batch_size == 0 {
            return Err(FinderError::Data("batch_size must be positive".to_string()));
        }
        let sampler = CyclicSampler::new(dataset.len(), seed)?;
        Ok(Self {
            dataset,
            sampler,
            batch_size,
            scratch: Vec::with_capacity(batch_size),
        })
    }

    /// Underlying samples.
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Rows per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn epoch(&self) -> usize {
        self.sampler.epoch()
    }

    /// Current sampling position, including the shuffle RNG.
    pub fn sampler(&self) -> &CyclicSampler {
        &self.sampler
    }

    /// Rewind or advance the stream to a previously captured sampler.
    pub fn set_sampler(&mut self, sampler: CyclicSampler) -> Result<()> {
        if sampler.len() != self.dataset.len() {
            return Err(FinderError::Data(format!(
                "sampler covers {} indices but the dataset has {} samples",
                sampler.len(),
                self.dataset.len()
            )));
        }
        self.sampler = sampler;
        Ok(())
    }

    /// Draw the next batch; never runs dry.
    pub fn next_batch(&mut self) -> Batch {
        self.scratch.clear();
        for _ in 0..self.batch_size {
            let idx = self.sampler.next_index();
            self.scratch.push(idx);
        }
        self.dataset.gather(&self.scratch)
    }
}

impl Iterator for BatchStream {
    type Item = Batch;

    fn next(&mut self) -> Option<Batch> {
        Some(self.next_batch())
    }
}
