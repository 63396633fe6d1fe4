use super::helper_function::{seeded_rng, validate_layer_sizes, validate_state_length};
use crate::error::RbmError;
use crate::math::{sigmoid, softplus};
use ndarray::{Array1, Array2, ArrayBase, ArrayView1, Axis, Data, Ix1};
use rand_distr::{Distribution, Normal};
use rayon::prelude::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Threshold for parallelization of conditional activations.
/// When the weight matrix holds fewer entries than this, activations are computed sequentially.
const ACTIVATION_PARALLEL_THRESHOLD: usize = 16_384;

/// Restricted Boltzmann Machine with binary visible and hidden units.
///
/// The model is a bipartite energy-based graph: every visible unit is coupled to every
/// hidden unit and there are no connections inside a layer. The weight matrix is stored
/// as a single contiguous row-major buffer of shape `(n_visible, n_hidden)`, so
/// `weights[[i, j]]` couples visible unit `i` to hidden unit `j`.
///
/// # Fields
///
/// - `visible_biases` - One bias per visible unit
/// - `hidden_biases` - One bias per hidden unit
/// - `weights` - Dense visible-to-hidden coupling matrix
///
/// # Examples
/// ```rust
/// use rustyrbm::rbm::Rbm;
/// use ndarray::array;
///
/// let model = Rbm::new(4, 2).unwrap();
/// assert_eq!(model.n_visible(), 4);
/// assert_eq!(model.n_hidden(), 2);
///
/// // A zero model gives every configuration the same energy
/// let energy = model
///     .energy(&array![true, false, true, false], &array![true, true])
///     .unwrap();
/// assert_eq!(energy, 0.0);
///
/// // Parameters can be written as plain text and read back
/// let text = model.serialize();
/// let restored = Rbm::deserialize(&text, 4, 2).unwrap();
/// assert_eq!(model, restored);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rbm {
    visible_biases: Array1<f64>,
    hidden_biases: Array1<f64>,
    weights: Array2<f64>,
}

impl Rbm {
    /// Creates a model with all biases and weights set to zero.
    ///
    /// # Parameters
    ///
    /// - `n_visible` - Number of visible units (must be greater than 0)
    /// - `n_hidden` - Number of hidden units (must be greater than 0)
    ///
    /// # Returns
    ///
    /// - `Result<Self, RbmError>` - A zero-initialized model
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If either layer size is 0
    pub fn new(n_visible: usize, n_hidden: usize) -> Result<Self, RbmError> {
        validate_layer_sizes(n_visible, n_hidden)?;

        Ok(Rbm {
            visible_biases: Array1::zeros(n_visible),
            hidden_biases: Array1::zeros(n_hidden),
            weights: Array2::zeros((n_visible, n_hidden)),
        })
    }

    /// Creates a model with zero biases and small Gaussian weights.
    ///
    /// Weights are drawn from `Normal(0, std_dev)`, which breaks the symmetry between
    /// hidden units that a zero initialization leaves in place.
    ///
    /// # Parameters
    ///
    /// - `n_visible` - Number of visible units (must be greater than 0)
    /// - `n_hidden` - Number of hidden units (must be greater than 0)
    /// - `std_dev` - Standard deviation of the weight distribution (finite, non-negative)
    /// - `random_seed` - Optional seed for reproducible initialization
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If a layer is empty or `std_dev` is invalid
    pub fn with_random_weights(
        n_visible: usize,
        n_hidden: usize,
        std_dev: f64,
        random_seed: Option<u64>,
    ) -> Result<Self, RbmError> {
        let mut model = Rbm::new(n_visible, n_hidden)?;

        let normal = Normal::new(0.0, std_dev).map_err(|e| {
            RbmError::InvalidInput(format!("Invalid weight standard deviation {}: {}", std_dev, e))
        })?;
        let mut rng = seeded_rng(random_seed);

        model.weights = Array2::from_shape_simple_fn((n_visible, n_hidden), || {
            normal.sample(&mut rng)
        });

        Ok(model)
    }

    /// Builds a model from existing parameter arrays.
    ///
    /// # Parameters
    ///
    /// - `visible_biases` - Bias vector of length V
    /// - `hidden_biases` - Bias vector of length H
    /// - `weights` - Matrix of shape `(V, H)`
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If the shapes are inconsistent, a layer is empty or a
    ///   parameter is NaN or infinite
    pub fn from_parameters(
        visible_biases: Array1<f64>,
        hidden_biases: Array1<f64>,
        weights: Array2<f64>,
    ) -> Result<Self, RbmError> {
        validate_layer_sizes(visible_biases.len(), hidden_biases.len())?;

        if weights.dim() != (visible_biases.len(), hidden_biases.len()) {
            return Err(RbmError::InvalidInput(format!(
                "Weight matrix has shape {:?}, expected ({}, {})",
                weights.dim(),
                visible_biases.len(),
                hidden_biases.len()
            )));
        }

        let all_finite = visible_biases
            .iter()
            .chain(hidden_biases.iter())
            .chain(weights.iter())
            .all(|value| value.is_finite());
        if !all_finite {
            return Err(RbmError::InvalidInput(
                "Model parameters must be finite".to_string(),
            ));
        }

        Ok(Rbm {
            visible_biases,
            hidden_biases,
            // Keep the buffer row-major regardless of how the caller laid it out
            weights: weights.as_standard_layout().into_owned(),
        })
    }

    /// Number of visible units.
    pub fn n_visible(&self) -> usize {
        self.visible_biases.len()
    }

    /// Number of hidden units.
    pub fn n_hidden(&self) -> usize {
        self.hidden_biases.len()
    }

    // Getters
    get_field_ref!(get_visible_biases, visible_biases, &Array1<f64>);
    get_field_ref!(get_hidden_biases, hidden_biases, &Array1<f64>);
    get_field_ref!(get_weights, weights, &Array2<f64>);

    /// Mutable access to all parameters at once, used by the trainer to apply an update.
    pub(super) fn parameters_mut(
        &mut self,
    ) -> (&mut Array1<f64>, &mut Array1<f64>, &mut Array2<f64>) {
        (
            &mut self.visible_biases,
            &mut self.hidden_biases,
            &mut self.weights,
        )
    }

    /// Computes the energy of a joint binary configuration.
    ///
    /// `E(v, h) = -Σ_i a_i v_i - Σ_j b_j h_j - Σ_i Σ_j v_i W_ij h_j`
    ///
    /// Lower energy corresponds to higher probability under the model.
    ///
    /// # Parameters
    ///
    /// - `visible` - Visible configuration of length V
    /// - `hidden` - Hidden configuration of length H
    ///
    /// # Returns
    ///
    /// - `Ok(f64)` - The energy of the configuration
    /// - `Err(RbmError::InvalidInput)` - If a vector has the wrong length
    pub fn energy<S1, S2>(
        &self,
        visible: &ArrayBase<S1, Ix1>,
        hidden: &ArrayBase<S2, Ix1>,
    ) -> Result<f64, RbmError>
    where
        S1: Data<Elem = bool>,
        S2: Data<Elem = bool>,
    {
        validate_state_length(visible.len(), self.n_visible(), "Visible")?;
        validate_state_length(hidden.len(), self.n_hidden(), "Hidden")?;

        let v = visible.mapv(f64::from);
        let h = hidden.mapv(f64::from);

        Ok(-self.visible_biases.dot(&v) - self.hidden_biases.dot(&h) - v.dot(&self.weights.dot(&h)))
    }

    /// Computes the free energy of a visible configuration, with the hidden layer summed out.
    ///
    /// `F(v) = -Σ_i a_i v_i - Σ_j softplus(b_j + Σ_i v_i W_ij)`
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If `visible` has the wrong length
    pub fn free_energy<S>(&self, visible: &ArrayBase<S, Ix1>) -> Result<f64, RbmError>
    where
        S: Data<Elem = bool>,
    {
        let activations = self.hidden_activations(visible)?;
        let v = visible.mapv(f64::from);

        Ok(-self.visible_biases.dot(&v) - activations.mapv(softplus).sum())
    }

    /// Pre-sigmoid input of every hidden unit given a visible configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(Array1<f64>)` - `b_j + Σ_i v_i W_ij` for each hidden unit `j`
    /// - `Err(RbmError::InvalidInput)` - If `visible` has the wrong length
    pub fn hidden_activations<S>(&self, visible: &ArrayBase<S, Ix1>) -> Result<Array1<f64>, RbmError>
    where
        S: Data<Elem = bool>,
    {
        validate_state_length(visible.len(), self.n_visible(), "Visible")?;
        let v = visible.mapv(f64::from);

        Ok(lane_activations(&self.weights, Axis(1), &self.hidden_biases, &v))
    }

    /// Pre-sigmoid input of every visible unit given a hidden configuration.
    ///
    /// # Returns
    ///
    /// - `Ok(Array1<f64>)` - `a_i + Σ_j h_j W_ij` for each visible unit `i`
    /// - `Err(RbmError::InvalidInput)` - If `hidden` has the wrong length
    pub fn visible_activations<S>(&self, hidden: &ArrayBase<S, Ix1>) -> Result<Array1<f64>, RbmError>
    where
        S: Data<Elem = bool>,
    {
        validate_state_length(hidden.len(), self.n_hidden(), "Hidden")?;
        let h = hidden.mapv(f64::from);

        Ok(lane_activations(&self.weights, Axis(0), &self.visible_biases, &h))
    }

    /// Probability of each hidden unit being on, `P(h_j = 1 | v)`.
    pub fn hidden_probabilities<S>(&self, visible: &ArrayBase<S, Ix1>) -> Result<Array1<f64>, RbmError>
    where
        S: Data<Elem = bool>,
    {
        Ok(self.hidden_activations(visible)?.mapv_into(sigmoid))
    }

    /// Probability of each visible unit being on, `P(v_i = 1 | h)`.
    pub fn visible_probabilities<S>(&self, hidden: &ArrayBase<S, Ix1>) -> Result<Array1<f64>, RbmError>
    where
        S: Data<Elem = bool>,
    {
        Ok(self.visible_activations(hidden)?.mapv_into(sigmoid))
    }

    /// Writes the parameters as whitespace-separated decimal text.
    ///
    /// The output has three lines: the visible biases, the hidden biases, then the
    /// weight matrix in row-major order. Dimensions are not stored; the reader must
    /// know them.
    pub fn serialize(&self) -> String {
        format!(
            "{}\n{}\n{}\n",
            join_values(self.visible_biases.iter()),
            join_values(self.hidden_biases.iter()),
            join_values(self.weights.iter())
        )
    }

    /// Reads parameters written by [`Rbm::serialize`].
    ///
    /// Every token is parsed and counted before the model is built, so a malformed blob
    /// never yields a partially filled model. Line breaks carry no meaning.
    ///
    /// # Parameters
    ///
    /// - `text` - Serialized parameters
    /// - `n_visible` - Number of visible units the blob was written for
    /// - `n_hidden` - Number of hidden units the blob was written for
    ///
    /// # Errors
    ///
    /// - `RbmError::Format` - If a token is not a finite number or the token count is not `V + H + V*H`
    /// - `RbmError::InvalidInput` - If a layer size is 0
    pub fn deserialize(text: &str, n_visible: usize, n_hidden: usize) -> Result<Self, RbmError> {
        validate_layer_sizes(n_visible, n_hidden)?;
        let expected = n_visible + n_hidden + n_visible * n_hidden;

        let mut values = text
            .split_whitespace()
            .enumerate()
            .map(|(idx, token)| -> Result<f64, RbmError> {
                let value = token.parse::<f64>().map_err(|e| {
                    RbmError::Format(format!("Value #{} ('{}') is not a number: {}", idx, token, e))
                })?;
                if !value.is_finite() {
                    return Err(RbmError::Format(format!(
                        "Value #{} ('{}') is not finite",
                        idx, token
                    )));
                }
                Ok(value)
            })
            .collect::<Result<Vec<f64>, RbmError>>()?;

        if values.len() != expected {
            return Err(RbmError::Format(format!(
                "Expected {} values for a {}x{} model, found {}",
                expected,
                n_visible,
                n_hidden,
                values.len()
            )));
        }

        let weights = values.split_off(n_visible + n_hidden);
        let hidden_biases = values.split_off(n_visible);

        let weights = Array2::from_shape_vec((n_visible, n_hidden), weights)
            .map_err(|e| RbmError::Format(format!("Failed to shape weight matrix: {}", e)))?;

        Rbm::from_parameters(Array1::from_vec(values), Array1::from_vec(hidden_biases), weights)
    }

    /// Writes the text parameter format to a file.
    ///
    /// The snapshot is written to a sibling `*.tmp` file first and then renamed over the
    /// target, so readers never observe a half-written file.
    ///
    /// # Errors
    ///
    /// - `RbmError::Io` - If the file cannot be written or renamed
    pub fn save_parameters<P: AsRef<Path>>(&self, path: P) -> Result<(), RbmError> {
        let path = path.as_ref();
        replace_file(path, |tmp| Ok(fs::write(tmp, self.serialize())?))?;

        tracing::debug!(path = %path.display(), "Parameters written");
        Ok(())
    }

    /// Reads a text parameter file written by [`Rbm::save_parameters`].
    ///
    /// # Errors
    ///
    /// - `RbmError::Io` - If the file cannot be read
    /// - `RbmError::Format` - If the contents do not describe a `n_visible x n_hidden` model
    pub fn load_parameters<P: AsRef<Path>>(
        path: P,
        n_visible: usize,
        n_hidden: usize,
    ) -> Result<Self, RbmError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let model = Rbm::deserialize(&text, n_visible, n_hidden)?;

        tracing::info!(path = %path.display(), n_visible, n_hidden, "Parameters loaded");
        Ok(model)
    }

    /// Saves the model as a self-describing JSON document.
    ///
    /// # Errors
    ///
    /// - `RbmError::Io` - If the file cannot be created
    /// - `RbmError::Json` - If serialization fails
    pub fn save_to_json<P: AsRef<Path>>(&self, path: P) -> Result<(), RbmError> {
        replace_file(path.as_ref(), |tmp| {
            let mut writer = BufWriter::new(File::create(tmp)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
            Ok(())
        })
    }

    /// Loads a model saved with [`Rbm::save_to_json`].
    ///
    /// # Errors
    ///
    /// - `RbmError::Io` - If the file cannot be opened
    /// - `RbmError::Json` - If the document is not a valid model
    /// - `RbmError::Format` - If the stored arrays have inconsistent shapes or non-finite values
    pub fn load_from_json<P: AsRef<Path>>(path: P) -> Result<Self, RbmError> {
        let reader = BufReader::new(File::open(path.as_ref())?);
        let raw: Rbm = serde_json::from_reader(reader)?;

        Rbm::from_parameters(raw.visible_biases, raw.hidden_biases, raw.weights)
            .map_err(|e| RbmError::Format(e.to_string()))
    }
}

/// Computes `bias[k] + lane_k · state` for every lane of `weights` along `axis`.
///
/// Lanes along `Axis(1)` are weight columns (one per hidden unit), lanes along `Axis(0)`
/// are weight rows (one per visible unit). Each lane is independent, so large matrices
/// are split across the rayon pool.
fn lane_activations(
    weights: &Array2<f64>,
    axis: Axis,
    biases: &Array1<f64>,
    state: &Array1<f64>,
) -> Array1<f64> {
    let activation = |(k, lane): (usize, ArrayView1<f64>)| biases[k] + lane.dot(state);

    let values: Vec<f64> = if weights.len() >= ACTIVATION_PARALLEL_THRESHOLD {
        weights
            .axis_iter(axis)
            .into_par_iter()
            .enumerate()
            .map(activation)
            .collect()
    } else {
        weights.axis_iter(axis).enumerate().map(activation).collect()
    };

    Array1::from_vec(values)
}

fn join_values<'a>(values: impl Iterator<Item = &'a f64>) -> String {
    values
        .map(|value| value.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

fn temporary_sibling(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Writes a `*.tmp` sibling with `write`, then renames it over `path`.
///
/// The sibling is removed again if writing or renaming fails.
fn replace_file<F>(path: &Path, write: F) -> Result<(), RbmError>
where
    F: FnOnce(&Path) -> Result<(), RbmError>,
{
    let tmp = temporary_sibling(path);

    let result = write(&tmp).and_then(|()| Ok(fs::rename(&tmp, path)?));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }

    result
}
