//! Coefficient-of-variation sweep.
//!
//! For each CoV value `c` every parameter gets the variance `(mean · c)²`
//! (subject to the estimator's [`VarianceOverrideScope`]) and two estimates are
//! run: one on the configured index set, keeping its total index, and one on
//! the complement, keeping its lower index.
//!
//! [`VarianceOverrideScope`]: crate::config::VarianceOverrideScope

use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, SweepError};
use crate::estimator::SensitivityEstimator;
use crate::model::Model;
use crate::sampler::InverseTransform;
use crate::sequence::Sequence;

/// One point of a CoV sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CovSweepRow {
    pub cov: f64,
    /// Total index of the configured index set
    pub total_index: f64,
    /// Lower index of the complement of the configured index set
    pub complement_lower_index: f64,
    /// Model variance from the configured-set run
    pub model_variance: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CovSweepResults {
    pub rows: Vec<CovSweepRow>,
}

impl CovSweepResults {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Write `cov total lower variance` rows, one per line.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SweepError> {
        let path = path.as_ref();
        let io_err = |source| SweepError::OutputIo {
            path: path.to_path_buf(),
            source,
        };

        let file = File::create(path).map_err(io_err)?;
        let mut writer = BufWriter::new(file);
        write!(writer, "{self}").map_err(io_err)?;
        writer.flush().map_err(io_err)?;

        tracing::info!(path = %path.display(), rows = self.rows.len(), "wrote CoV sweep");
        Ok(())
    }
}

impl fmt::Display for CovSweepResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.rows {
            writeln!(
                f,
                "{} {} {} {}",
                row.cov, row.total_index, row.complement_lower_index, row.model_variance
            )?;
        }
        Ok(())
    }
}

/// Run the sweep over `covs` in order.
///
/// An empty `covs` runs a single point at the configured
/// [`EstimatorConfig::cov`]. All CoV values are checked before the first
/// estimate runs.
///
/// [`EstimatorConfig::cov`]: crate::config::EstimatorConfig::cov
pub fn cov_sweep<M, Q, S>(
    estimator: &mut SensitivityEstimator<'_, M, Q, S>,
    covs: &[f64],
) -> Result<CovSweepResults, SweepError>
where
    M: Model + ?Sized,
    Q: Sequence,
    S: InverseTransform,
{
    let config = estimator.config();
    let configured = [config.cov];
    let covs = if covs.is_empty() { &configured[..] } else { covs };
    let overrides = covs
        .iter()
        .map(|&cov| config.cov_overrides(cov))
        .collect::<Result<Vec<_>, ConfigError>>()?;
    let complement = config.index_set.complement(config.dimension);

    tracing::info!(points = covs.len(), "starting CoV sweep");

    let mut results = CovSweepResults::default();
    for (&cov, overrides) in covs.iter().zip(overrides) {
        let own = estimator.estimate(&overrides)?;

        // The lower index of an empty group is identically zero, and an empty
        // override would fall back to the configured set.
        let complement_lower_index = if complement.is_empty() {
            0.0
        } else {
            estimator
                .estimate(&overrides.with_index_set(complement.clone()))?
                .lower_index
        };

        tracing::debug!(cov, total_index = own.total_index, "CoV point complete");
        results.rows.push(CovSweepRow {
            cov,
            total_index: own.total_index,
            complement_lower_index,
            model_variance: own.model_variance,
        });
    }

    Ok(results)
}
