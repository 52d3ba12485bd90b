//! Variation and selection operators

pub mod crossover;
pub mod mutation;
pub mod selection;
pub mod traits;

pub use crossover::{DebVariation, DeVariation};
pub use traits::{Objective, Variation};
