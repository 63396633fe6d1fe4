//! TOML configuration for training and sampling runs.
//!
//! Every field has a default, so an empty file (or no file at all) describes the
//! MNIST setup: 784 visible units, 500 hidden units, 50 Gibbs sweeps per update and
//! mini-batches of 10. CLI flags override whatever the file says.

use crate::dataset::DEFAULT_BINARIZE_THRESHOLD;
use crate::error::RbmError;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level structure of a configuration file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RbmConfig {
    /// Number of visible units; must match the training data width.
    pub n_visible: usize,
    /// Number of hidden units.
    pub n_hidden: usize,
    /// Gradient ascent step size.
    pub learning_rate: f64,
    /// Gibbs sweeps on the negative chain per update.
    pub chain_length: usize,
    /// Training examples per mini-batch.
    pub batch_size: usize,
    /// Carry the negative chain across updates instead of restarting it.
    pub persistent_chain: bool,
    /// Intensities at or above this value are treated as on.
    pub binarize_threshold: u32,
    /// Seed for reproducible runs.
    pub random_seed: Option<u64>,
    /// Text parameter file read on resume/sampling and written on checkpoint/exit.
    pub parameters_path: PathBuf,
    /// Labelled CSV table with the training examples.
    pub training_data_path: PathBuf,
    /// Stop after this many updates; `None` trains until interrupted.
    pub max_rounds: Option<usize>,
    /// Output settings for the `sample` command.
    pub sampling: SamplingConfig,
}

/// Settings for drawing a grid of model samples.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SamplingConfig {
    /// Tiles per image row.
    pub grid_columns: usize,
    /// Tile rows.
    pub grid_rows: usize,
    /// Units per tile row.
    pub tile_width: usize,
    /// Pixels per unit side.
    pub pixel_size: usize,
    /// Gibbs sweeps per independent chain.
    pub gibbs_steps: usize,
    /// Image file; the format follows the extension.
    pub output_path: PathBuf,
}

impl Default for RbmConfig {
    fn default() -> Self {
        RbmConfig {
            n_visible: 784,
            n_hidden: 500,
            learning_rate: 0.001,
            chain_length: 50,
            batch_size: 10,
            persistent_chain: false,
            binarize_threshold: DEFAULT_BINARIZE_THRESHOLD,
            random_seed: None,
            parameters_path: PathBuf::from("parameters.dat"),
            training_data_path: PathBuf::from("mnist_train.csv"),
            max_rounds: None,
            sampling: SamplingConfig::default(),
        }
    }
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            grid_columns: 10,
            grid_rows: 10,
            tile_width: 28,
            pixel_size: 5,
            gibbs_steps: 50,
            output_path: PathBuf::from("output.bmp"),
        }
    }
}

impl RbmConfig {
    /// Parses a configuration from TOML text and validates it.
    ///
    /// # Errors
    ///
    /// - `RbmError::Config` - If the text is not valid TOML for this structure
    /// - `RbmError::InvalidInput` - If a value is out of range
    pub fn from_toml_str(text: &str) -> Result<Self, RbmError> {
        let config: RbmConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    ///
    /// # Errors
    ///
    /// - `RbmError::Io` - If the file cannot be read
    /// - `RbmError::Config` / `RbmError::InvalidInput` - See [`RbmConfig::from_toml_str`]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RbmError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        tracing::info!(path = %path.display(), "Loaded config");
        Ok(config)
    }

    /// Checks that every size and rate is usable.
    pub fn validate(&self) -> Result<(), RbmError> {
        let counts = [
            (self.n_visible, "n_visible"),
            (self.n_hidden, "n_hidden"),
            (self.chain_length, "chain_length"),
            (self.batch_size, "batch_size"),
            (self.sampling.grid_columns, "sampling.grid_columns"),
            (self.sampling.grid_rows, "sampling.grid_rows"),
            (self.sampling.tile_width, "sampling.tile_width"),
            (self.sampling.pixel_size, "sampling.pixel_size"),
        ];
        if let Some((_, name)) = counts.iter().find(|(value, _)| *value == 0) {
            return Err(RbmError::InvalidInput(format!(
                "{} must be greater than 0",
                name
            )));
        }

        if self.learning_rate <= 0.0 || !self.learning_rate.is_finite() {
            return Err(RbmError::InvalidInput(format!(
                "learning_rate must be positive and finite, got {}",
                self.learning_rate
            )));
        }

        if self.max_rounds == Some(0) {
            return Err(RbmError::InvalidInput(
                "max_rounds must be greater than 0 when set".to_string(),
            ));
        }

        Ok(())
    }
}
