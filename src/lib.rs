//! Learning Rate Finder
//!
//! This library runs a short, throwaway training sweep with an exponentially
//! increasing learning rate, records the loss at every step, and stops once the
//! smoothed loss clearly diverges. The model's training state is snapshotted
//! before the sweep and restored afterwards, so the sweep can be run against
//! live training state.
//!
//! # Modules
//!
//! - `finder`: Trainable unit contract, stopping criterion, result trace, rate finder
//! - `mlp`: A dense two-layer classifier implementing the trainable unit contract
//! - `layers`: Layer trait and the dense layer
//! - `optimizers`: Optimizer trait and implementations (SGD, Adam)
//! - `data`: In-memory datasets and the infinite cyclic batch stream
//! - `utils`: Activation/loss functions and the exponential learning-rate ramp
//! - `config`: Search and training configuration structures
//! - `error`: Crate error type

pub mod config;
pub mod data;
pub mod error;
pub mod finder;
pub mod layers;
pub mod mlp;
pub mod optimizers;
pub mod utils;

pub use error::{FinderError, Result};
pub use finder::{RateFinder, ResultTrace, StoppingCriterion, SweepPoint, TrainableUnit};
