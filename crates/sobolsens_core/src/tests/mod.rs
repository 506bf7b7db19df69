//! Integration tests for the sensitivity estimator
//!
//! Tests are organized by topic:
//! - `estimator` - Index estimates, cursor behavior, overrides and failures
//! - `batching` - Merging partial sums and thread-count independence
//! - `models` - Reference models with analytic indices
//! - `sweep` - CoV sweeps and their output file

mod batching;
mod sweep;
