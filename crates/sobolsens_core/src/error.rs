use std::fmt;
use std::path::PathBuf;

/// Errors detected while validating an estimator configuration or a call override
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    ZeroDimension,
    /// The Monte Carlo sample count must be at least one
    InsufficientSamples,
    ZeroBatchSize,
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    InvalidVariance {
        index: usize,
        variance: f64,
    },
    InvalidMean {
        index: usize,
        mean: f64,
    },
    IndexOutOfRange {
        index: usize,
        dimension: usize,
    },
    InvalidCov(f64),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroDimension => write!(f, "dimension must be positive"),
            ConfigError::InsufficientSamples => {
                write!(f, "at least one Monte Carlo sample is required")
            }
            ConfigError::ZeroBatchSize => write!(f, "batch size must be positive"),
            ConfigError::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{what} has length {actual}, expected {expected}"),
            ConfigError::InvalidVariance { index, variance } => {
                write!(
                    f,
                    "parameter {index} has invalid variance {variance} (must be finite and >= 0)"
                )
            }
            ConfigError::InvalidMean { index, mean } => {
                write!(f, "parameter {index} has non-finite mean {mean}")
            }
            ConfigError::IndexOutOfRange { index, dimension } => {
                write!(f, "parameter index {index} out of range for dimension {dimension}")
            }
            ConfigError::InvalidCov(cov) => {
                write!(f, "coefficient of variation {cov} must be finite and >= 0")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Errors raised by a low-discrepancy or pseudo-random sequence
#[derive(Debug, Clone, PartialEq)]
pub enum SequenceError {
    ZeroDimension,
    IndexOutOfRange { index: usize, dimension: usize },
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceError::ZeroDimension => write!(f, "sequence dimension must be positive"),
            SequenceError::IndexOutOfRange { index, dimension } => {
                write!(
                    f,
                    "coordinate {index} out of range for sequence of dimension {dimension}"
                )
            }
        }
    }
}

impl std::error::Error for SequenceError {}

/// Errors raised by an inverse-transform sampler
#[derive(Debug, Clone, PartialEq)]
pub enum SamplingError {
    InvalidDistributionParameters {
        distribution: &'static str,
        mean: f64,
        variance: f64,
        reason: &'static str,
    },
    /// Inverse transforms are only defined on the open interval (0, 1)
    UniformOutOfRange(f64),
}

impl fmt::Display for SamplingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingError::InvalidDistributionParameters {
                distribution,
                mean,
                variance,
                reason,
            } => {
                write!(
                    f,
                    "invalid {distribution} parameters (mean={mean}, variance={variance}): {reason}"
                )
            }
            SamplingError::UniformOutOfRange(u) => {
                write!(f, "uniform draw {u} is outside the open interval (0, 1)")
            }
        }
    }
}

impl std::error::Error for SamplingError {}

/// Which of the four per-iteration model evaluations produced a bad value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    /// `f = model(x1)`
    Base,
    /// `f2 = model(x2)`
    Independent,
    /// `m1 = model(arg1)`
    Picked,
    /// `m2 = model(arg2)`
    Frozen,
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Evaluation::Base => "model(x1)",
            Evaluation::Independent => "model(x2)",
            Evaluation::Picked => "model(arg1)",
            Evaluation::Frozen => "model(arg2)",
        };
        f.write_str(name)
    }
}

/// Errors returned by a sensitivity estimation call
#[derive(Debug, Clone, PartialEq)]
pub enum EstimateError {
    Config(ConfigError),
    Sequence(SequenceError),
    Sampling {
        parameter: usize,
        source: SamplingError,
    },
    ModelEvaluationFailed {
        sample: u64,
        evaluation: Evaluation,
        value: f64,
    },
    /// Normalization was requested but the estimated model variance is not positive
    DegenerateVariance(f64),
    /// Estimation was cancelled by user request
    Cancelled,
}

impl fmt::Display for EstimateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EstimateError::Config(e) => write!(f, "invalid configuration: {e}"),
            EstimateError::Sequence(e) => write!(f, "{e}"),
            EstimateError::Sampling { parameter, source } => {
                write!(f, "sampling parameter {parameter} failed: {source}")
            }
            EstimateError::ModelEvaluationFailed {
                sample,
                evaluation,
                value,
            } => write!(
                f,
                "{evaluation} returned non-finite value {value} at sample {sample}"
            ),
            EstimateError::DegenerateVariance(v) => {
                write!(f, "cannot normalize indices by model variance {v}")
            }
            EstimateError::Cancelled => write!(f, "estimation cancelled"),
        }
    }
}

impl std::error::Error for EstimateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EstimateError::Config(e) => Some(e),
            EstimateError::Sequence(e) => Some(e),
            EstimateError::Sampling { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for EstimateError {
    fn from(err: ConfigError) -> Self {
        EstimateError::Config(err)
    }
}

impl From<SequenceError> for EstimateError {
    fn from(err: SequenceError) -> Self {
        EstimateError::Sequence(err)
    }
}

/// Errors returned by the coefficient-of-variation sweep
#[derive(Debug)]
pub enum SweepError {
    Estimate(EstimateError),
    OutputIo {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl fmt::Display for SweepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweepError::Estimate(e) => write!(f, "{e}"),
            SweepError::OutputIo { path, source } => {
                write!(f, "unable to write sweep output {}: {source}", path.display())
            }
        }
    }
}

impl std::error::Error for SweepError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SweepError::Estimate(e) => Some(e),
            SweepError::OutputIo { source, .. } => Some(source),
        }
    }
}

impl From<EstimateError> for SweepError {
    fn from(err: EstimateError) -> Self {
        SweepError::Estimate(err)
    }
}

impl From<ConfigError> for SweepError {
    fn from(err: ConfigError) -> Self {
        SweepError::Estimate(EstimateError::Config(err))
    }
}
