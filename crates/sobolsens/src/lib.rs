//! Command-line front end for pick-and-freeze sensitivity analysis
//!
//! Scenarios are YAML files naming a built-in model, its constants and an
//! estimator configuration. The binary runs single estimates or CoV sweeps
//! over them.

pub mod logging;
pub mod report;
pub mod scenario;

pub use logging::init_logging;
pub use report::EstimateReport;
pub use scenario::{ModelKind, Scenario, ScenarioError, SweepSettings};
