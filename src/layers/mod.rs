//! Layer abstractions
//!
//! This module provides the Layer trait and the dense layer the MLP unit is
//! built from.

mod r#trait;
pub mod dense;

pub use dense::DenseLayer;
pub use r#trait::Layer;
