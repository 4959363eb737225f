//! Difficulty-intensity estimation

mod estimator;


pub use estimator::*;
