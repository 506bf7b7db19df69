//! Scenario files: a model choice, its constants and an estimator configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sobolsens_core::model::{BlackScholesCall, IshigamiModel, LinearModel};
use sobolsens_core::{
    CovSweepResults, Distribution, DistributionParams, EstimateError, EstimateOverrides,
    EstimatorConfig, IndexSet, Model, SensitivityEstimator, SensitivityResult, SweepError,
    cov_sweep,
};

/// Built-in models a scenario can refer to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Weighted sum, constants are the weights
    Linear,
    /// Ishigami function, constants are `[a, b]`
    Ishigami,
    /// European call, parameters `[spot, vol]`, constants `[strike, rate, maturity]`
    BlackScholes,
}

impl ModelKind {
    pub fn model(&self) -> &'static dyn Model {
        match self {
            ModelKind::Linear => &LinearModel,
            ModelKind::Ishigami => &IshigamiModel,
            ModelKind::BlackScholes => &BlackScholesCall,
        }
    }

    /// Check that `dimension` parameters and `constants` fit the model.
    fn check(&self, dimension: usize, constants: &[f64]) -> Result<(), String> {
        match self {
            ModelKind::Linear if constants.len() != dimension => Err(format!(
                "linear model needs one weight per parameter ({dimension}), got {}",
                constants.len()
            )),
            ModelKind::Ishigami if dimension != 3 => {
                Err(format!("ishigami model takes 3 parameters, got {dimension}"))
            }
            ModelKind::Ishigami if constants.len() > 2 => Err(format!(
                "ishigami model takes at most 2 constants, got {}",
                constants.len()
            )),
            ModelKind::BlackScholes if dimension != 2 => Err(format!(
                "black-scholes model takes 2 parameters (spot, vol), got {dimension}"
            )),
            ModelKind::BlackScholes if constants.len() != 3 => Err(format!(
                "black-scholes model needs constants [strike, rate, maturity], got {}",
                constants.len()
            )),
            _ => Ok(()),
        }
    }
}

/// CoV sweep settings stored with a scenario
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSettings {
    pub covs: Vec<f64>,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub model: ModelKind,
    #[serde(default)]
    pub constants: Vec<f64>,
    pub estimator: EstimatorConfig,
    #[serde(default)]
    pub sweep: SweepSettings,
}

/// Error types for scenario loading and checking
#[derive(Debug)]
pub enum ScenarioError {
    Io(String),
    Parse(String),
    Serialize(String),
    Invalid(String),
}

impl std::fmt::Display for ScenarioError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScenarioError::Io(msg) => write!(f, "IO error: {}", msg),
            ScenarioError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ScenarioError::Serialize(msg) => write!(f, "Serialization error: {}", msg),
            ScenarioError::Invalid(msg) => write!(f, "Invalid scenario: {}", msg),
        }
    }
}

impl std::error::Error for ScenarioError {}

impl Scenario {
    /// Load from YAML string. A missing `dimension` is taken from the
    /// number of parameters.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_saphyr::Error> {
        let mut scenario: Scenario = serde_saphyr::from_str(yaml)?;
        if scenario.estimator.dimension == 0 {
            scenario.estimator.dimension = scenario.estimator.parameters.len();
        }
        Ok(scenario)
    }

    /// Save to YAML string
    pub fn to_yaml(&self) -> Result<String, serde_saphyr::ser::Error> {
        serde_saphyr::to_string(self)
    }

    /// Read and check a scenario file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ScenarioError::Io(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let scenario = Self::from_yaml(&content)
            .map_err(|e| ScenarioError::Parse(format!("Failed to parse scenario: {}", e)))?;
        scenario.validate()?;

        tracing::info!(
            path = %path.display(),
            model = ?scenario.model,
            dimension = scenario.estimator.dimension,
            "loaded scenario"
        );
        Ok(scenario)
    }

    pub fn save(&self, path: &Path) -> Result<(), ScenarioError> {
        let yaml = self.to_yaml().map_err(|e| {
            ScenarioError::Serialize(format!("Failed to serialize scenario: {}", e))
        })?;
        fs::write(path, yaml).map_err(|e| {
            ScenarioError::Io(format!("Failed to write {}: {}", path.display(), e))
        })
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.estimator
            .validate()
            .map_err(|e| ScenarioError::Invalid(e.to_string()))?;
        self.model
            .check(self.estimator.dimension, &self.constants)
            .map_err(ScenarioError::Invalid)
    }

    fn estimator(&self) -> Result<SensitivityEstimator<'_, dyn Model>, EstimateError> {
        SensitivityEstimator::new(self.model.model(), &self.constants, self.estimator.clone())
    }

    /// Run one estimate with the given overrides.
    pub fn estimate(
        &self,
        overrides: &EstimateOverrides,
    ) -> Result<SensitivityResult, EstimateError> {
        self.estimator()?.estimate(overrides)
    }

    /// Run a CoV sweep over `covs`, or over the estimator's `cov` when empty.
    pub fn sweep(&self, covs: &[f64]) -> Result<CovSweepResults, SweepError> {
        let mut estimator = self.estimator()?;
        cov_sweep(&mut estimator, covs)
    }

    /// Ishigami scenario used as the `init` template.
    #[must_use]
    pub fn example() -> Self {
        let parameters = vec![DistributionParams::new(0.0, IshigamiModel::UNIFORM_VARIANCE); 3];
        Self {
            model: ModelKind::Ishigami,
            constants: vec![IshigamiModel::DEFAULT_A, IshigamiModel::DEFAULT_B],
            estimator: EstimatorConfig::new(IndexSet::from([0]), parameters, 10_000)
                .with_distribution(Distribution::Uniform)
                .with_cov(0.1),
            sweep: SweepSettings {
                covs: vec![0.05, 0.1, 0.2],
                output: None,
            },
        }
    }
}
