//! Shared utilities for the trainable unit and the rate finder
//!
//! This module provides activation and loss functions used by the MLP unit,
//! and the learning rate schedule the finder sweeps with.

pub mod activations;
pub mod lr_scheduler;

pub use activations::{relu_backward_inplace, relu_inplace, softmax_cross_entropy, softmax_rows};
pub use lr_scheduler::{ExponentialRamp, LRScheduler};
