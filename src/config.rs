//! Estimator tunables and application configuration
//!
//! Store directory resolution order:
//! 1. Command-line argument
//! 2. `BASELINE_STORE_DIR` environment variable
//! 3. `store_dir` in the TOML config file
//! 4. `./baselines`

use std::path::{Path, PathBuf};

use anyhow::{ensure, Context};
use serde::Deserialize;

pub const STORE_DIR_ENV: &str = "BASELINE_STORE_DIR";
pub const CONFIG_ENV: &str = "BASELINE_CONFIG";
pub const DEFAULT_STORE_DIR: &str = "baselines";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Samples required to establish a new baseline
    pub min_samples: usize,
    /// Lower bound for every stored standard deviation
    pub std_dev_floor: f64,
    pub max_confidence: f64,
    /// Ceiling on the sample-count part of the confidence score
    pub max_sample_confidence: f64,
    pub confidence_per_sample: f64,
    /// Cap on the existing baseline's share in a merge
    pub max_existing_weight: f64,
    /// |z| above which an emotion counts as atypical for the user
    pub atypical_deviation: f64,
    pub atypical_scale: f64,
    pub typical_scale: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            min_samples: 3,
            std_dev_floor: 0.1,
            max_confidence: 0.95,
            max_sample_confidence: 0.9,
            confidence_per_sample: 0.1,
            max_existing_weight: 0.8,
            atypical_deviation: 1.0,
            atypical_scale: 1.2,
            typical_scale: 0.9,
        }
    }
}

impl EstimatorConfig {
    /// Reject settings that would let a baseline break its invariants.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.min_samples >= 3,
            "min_samples must be at least 3, got {}",
            self.min_samples
        );
        ensure!(
            self.std_dev_floor.is_finite() && self.std_dev_floor > 0.0,
            "std_dev_floor must be positive, got {}",
            self.std_dev_floor
        );
        ensure!(
            (0.0..=1.0).contains(&self.max_existing_weight),
            "max_existing_weight must be within [0, 1], got {}",
            self.max_existing_weight
        );
        ensure!(
            self.max_confidence > 0.0 && self.max_confidence <= 1.0,
            "max_confidence must be within (0, 1], got {}",
            self.max_confidence
        );
        ensure!(
            self.max_sample_confidence > 0.0 && self.max_sample_confidence <= 1.0,
            "max_sample_confidence must be within (0, 1], got {}",
            self.max_sample_confidence
        );
        ensure!(
            self.confidence_per_sample.is_finite() && self.confidence_per_sample > 0.0,
            "confidence_per_sample must be positive, got {}",
            self.confidence_per_sample
        );
        ensure!(
            self.atypical_deviation.is_finite() && self.atypical_deviation >= 0.0,
            "atypical_deviation must be non-negative, got {}",
            self.atypical_deviation
        );
        for (name, scale) in [
            ("atypical_scale", self.atypical_scale),
            ("typical_scale", self.typical_scale),
        ] {
            ensure!(
                scale.is_finite() && scale > 0.0,
                "{name} must be positive, got {scale}"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub store_dir: Option<PathBuf>,
    pub estimator: EstimatorConfig,
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(content).context("invalid baseline config")?;
        config.estimator.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load from the explicit path, else from `BASELINE_CONFIG`, else defaults.
    pub fn resolve(cli_path: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = cli_path {
            return Self::load(path);
        }
        match std::env::var_os(CONFIG_ENV) {
            Some(path) => Self::load(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn store_dir(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(dir) = cli_arg {
            return dir.to_path_buf();
        }
        if let Some(dir) = std::env::var_os(STORE_DIR_ENV) {
            return PathBuf::from(dir);
        }
        self.store_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORE_DIR))
    }
}
