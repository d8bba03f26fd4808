//! Batch Strategy Module
//!
//! - Parallel: reformat many documents across a Rayon thread pool

pub mod parallel;

pub use parallel::{format_one, format_parallel};
