//! The learning rate range test.
//!
//! * **[`TrainableUnit`]**: what the finder needs from a model: one training
//!   iteration at an explicit rate, and snapshot/restore of its full state.
//! * **[`StoppingCriterion`]**: smoothed divergence test over the loss stream.
//! * **[`ResultTrace`]**: ordered `(learning_rate, loss)` points of one sweep.
//! * **[`RateFinder`]**: runs the sweep and restores the unit afterwards.

pub mod rate_finder;
pub mod stopping;
pub mod trace;
pub mod unit;

pub use rate_finder::RateFinder;
pub use stopping::StoppingCriterion;
pub use trace::{ResultTrace, SweepPoint};
pub use unit::TrainableUnit;
