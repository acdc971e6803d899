//! Pipeline configuration
//!
//! A [`PipelineConfig`] is built once at startup (from defaults, a JSON file
//! or the builder) and handed by reference to every stage. Nothing in the
//! crate reads process-wide constants.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Number of records per split
pub const DEFAULT_NUM_ORBIT: usize = 98_304;

/// Divisor applied to every derived value
pub const DEFAULT_SCALER: f64 = 20.0;

/// Default data root
pub const DEFAULT_DATA_ROOT: &str = "./data";

/// Samples written per generated trajectory (plus the initial state row)
pub const DEFAULT_SAMPLES_PER_FILE: usize = 100;

/// Simulated time between two consecutive samples
pub const DEFAULT_SAMPLE_STEP: f64 = 0.4;

/// Central mass of the two-body problem
pub const DEFAULT_MASS: f64 = 1.0;

/// Half of the available cores, at least one
#[must_use]
pub fn default_num_threads() -> usize {
    (num_cpus::get() / 2).max(1)
}

/// Named partition of records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    /// Training records
    Train,
    /// Validation records
    Validation,
    /// Test records
    Test,
}

impl Split {
    /// All splits in processing order
    pub const ALL: [Self; 3] = [Self::Train, Self::Validation, Self::Test];

    /// Directory / file-name component
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Validation => "validation",
            Self::Test => "test",
        }
    }

    /// RNG seed used when generating this split's initial states
    #[must_use]
    pub const fn seed(self) -> u64 {
        match self {
            Self::Train => 101,
            Self::Validation => 102,
            Self::Test => 104,
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Split {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Self::Train),
            "validation" => Ok(Self::Validation),
            "test" => Ok(Self::Test),
            other => Err(Error::UnknownSplit(other.to_string())),
        }
    }
}

/// Which derived table a file holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Scaled state at step `i`
    Input,
    /// Scaled change from step `i` to `i + 1`
    Output,
}

impl TableKind {
    /// Both kinds, input first
    pub const ALL: [Self; 2] = [Self::Input, Self::Output];

    /// File-name prefix
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl fmt::Display for TableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TableKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "input" => Ok(Self::Input),
            "output" => Ok(Self::Output),
            other => Err(Error::UnknownKind(other.to_string())),
        }
    }
}

/// Immutable settings shared by all stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    data_root: PathBuf,
    num_orbit: usize,
    scaler: f64,
    num_threads: usize,
    samples_per_file: usize,
    sample_step: f64,
    mass: f64,
    write_parquet: bool,
    splits: Vec<Split>,
    kinds: Vec<TableKind>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from(DEFAULT_DATA_ROOT),
            num_orbit: DEFAULT_NUM_ORBIT,
            scaler: DEFAULT_SCALER,
            num_threads: default_num_threads(),
            samples_per_file: DEFAULT_SAMPLES_PER_FILE,
            sample_step: DEFAULT_SAMPLE_STEP,
            mass: DEFAULT_MASS,
            write_parquet: false,
            splits: Split::ALL.to_vec(),
            kinds: TableKind::ALL.to_vec(),
        }
    }
}

impl PipelineConfig {
    /// Create a new config builder starting from the defaults
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Load a JSON config file; absent fields keep their defaults
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, is not valid JSON, or
    /// fails [`validate`](Self::validate)
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("invalid config {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first offending field
    pub fn validate(&self) -> Result<()> {
        if self.num_orbit == 0 {
            return Err(Error::Config("num_orbit must be positive".to_string()));
        }
        if self.num_threads == 0 {
            return Err(Error::Config("num_threads must be positive".to_string()));
        }
        if !self.scaler.is_finite() || self.scaler == 0.0 {
            return Err(Error::Config(format!(
                "scaler must be finite and non-zero, got {}",
                self.scaler
            )));
        }
        if self.samples_per_file == 0 {
            return Err(Error::Config("samples_per_file must be positive".to_string()));
        }
        if !(self.sample_step.is_finite() && self.sample_step > 0.0) {
            return Err(Error::Config(format!(
                "sample_step must be positive, got {}",
                self.sample_step
            )));
        }
        if !(self.mass.is_finite() && self.mass > 0.0) {
            return Err(Error::Config(format!("mass must be positive, got {}", self.mass)));
        }
        if self.splits.is_empty() {
            return Err(Error::Config("at least one split is required".to_string()));
        }
        if self.kinds.is_empty() {
            return Err(Error::Config("at least one table kind is required".to_string()));
        }
        Ok(())
    }

    /// Filesystem root holding split directories and concatenated files
    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }

    /// Records per split, ids `0..num_orbit`
    #[must_use]
    pub const fn num_orbit(&self) -> usize {
        self.num_orbit
    }

    /// Normalization divisor
    #[must_use]
    pub const fn scaler(&self) -> f64 {
        self.scaler
    }

    /// Worker count for every stage's pool
    #[must_use]
    pub const fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Samples per generated trajectory
    #[must_use]
    pub const fn samples_per_file(&self) -> usize {
        self.samples_per_file
    }

    /// Simulated time between samples
    #[must_use]
    pub const fn sample_step(&self) -> f64 {
        self.sample_step
    }

    /// Central mass
    #[must_use]
    pub const fn mass(&self) -> f64 {
        self.mass
    }

    /// Whether Stage B also writes Parquet copies
    #[must_use]
    pub const fn write_parquet(&self) -> bool {
        self.write_parquet
    }

    /// Splits processed by every stage
    #[must_use]
    pub fn splits(&self) -> &[Split] {
        &self.splits
    }

    /// Table kinds concatenated by Stage B
    #[must_use]
    pub fn kinds(&self) -> &[TableKind] {
        &self.kinds
    }

    /// Copy of this config with another data root
    #[must_use]
    pub fn with_data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.data_root = data_root.into();
        self
    }

    /// Copy of this config restricted to `splits`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `splits` is empty
    pub fn with_splits(mut self, splits: Vec<Split>) -> Result<Self> {
        self.splits = splits;
        self.validate()?;
        Ok(self)
    }

    /// Copy of this config restricted to `kinds`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `kinds` is empty
    pub fn with_kinds(mut self, kinds: Vec<TableKind>) -> Result<Self> {
        self.kinds = kinds;
        self.validate()?;
        Ok(self)
    }
}

/// Builder for [`PipelineConfig`]
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the data root
    #[must_use]
    pub fn data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.config.data_root = data_root.into();
        self
    }

    /// Set the number of records per split
    #[must_use]
    pub fn num_orbit(mut self, num_orbit: usize) -> Self {
        self.config.num_orbit = num_orbit;
        self
    }

    /// Set the normalization divisor
    #[must_use]
    pub fn scaler(mut self, scaler: f64) -> Self {
        self.config.scaler = scaler;
        self
    }

    /// Set the worker count
    #[must_use]
    pub fn num_threads(mut self, num_threads: usize) -> Self {
        self.config.num_threads = num_threads;
        self
    }

    /// Set the samples per generated trajectory
    #[must_use]
    pub fn samples_per_file(mut self, samples_per_file: usize) -> Self {
        self.config.samples_per_file = samples_per_file;
        self
    }

    /// Set the simulated time between samples
    #[must_use]
    pub fn sample_step(mut self, sample_step: f64) -> Self {
        self.config.sample_step = sample_step;
        self
    }

    /// Set the central mass
    #[must_use]
    pub fn mass(mut self, mass: f64) -> Self {
        self.config.mass = mass;
        self
    }

    /// Enable Parquet copies of concatenated tables
    #[must_use]
    pub fn write_parquet(mut self, write_parquet: bool) -> Self {
        self.config.write_parquet = write_parquet;
        self
    }

    /// Restrict the splits processed
    #[must_use]
    pub fn splits(mut self, splits: Vec<Split>) -> Self {
        self.config.splits = splits;
        self
    }

    /// Restrict the table kinds Stage B concatenates
    #[must_use]
    pub fn kinds(mut self, kinds: Vec<TableKind>) -> Self {
        self.config.kinds = kinds;
        self
    }

    /// Build and validate the config
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if any value is out of range
    pub fn build(self) -> Result<PipelineConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
