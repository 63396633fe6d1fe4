/// A macro that generates a getter method for any `Copy` field.
///
/// # Parameters
///
/// - `$method_name` - The name of the getter method (e.g., get_learning_rate)
/// - `$field_name` - The name of the field to access (e.g., learning_rate)
/// - `$return_type` - The return type of the getter method
macro_rules! get_field {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name
        }
    };
}

/// A macro that generates a public getter method returning a reference to a field.
///
/// # Parameters
///
/// - `$method_name` - The identifier for the generated getter method name
/// - `$field_name` - The identifier of the struct field to access
/// - `$return_type` - The reference type returned (e.g., `&Array1<f64>`)
macro_rules! get_field_ref {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - A reference to the `", stringify!($field_name), "` field")]
        pub fn $method_name(&self) -> $return_type {
            &self.$field_name
        }
    };
}

/// A macro that generates a public getter method returning an `Option` field as `Option<&T>`.
///
/// # Parameters
///
/// - `$method_name` - The identifier for the generated getter method name
/// - `$field_name` - The identifier of the `Option` field to access
/// - `$return_type` - The type expression for the return value (e.g., `Option<&State>`)
macro_rules! get_field_as_ref {
    ($method_name:ident, $field_name:ident, $return_type:ty) => {
        #[doc = concat!("Gets the `", stringify!($field_name), "` field.\n\n")]
        #[doc = "# Returns\n\n"]
        #[doc = concat!("* `", stringify!($return_type), "` - The value of the `", stringify!($field_name), "` field as a reference")]
        pub fn $method_name(&self) -> $return_type {
            self.$field_name.as_ref()
        }
    };
}

/// Error type shared by every module of the crate.
///
/// `RbmError` distinguishes malformed parameter files (`Format`), unusable inputs or
/// hyperparameters (`InvalidInput`) and malformed training tables (`Ingestion`), and
/// wraps the I/O, JSON, image and TOML errors raised underneath.
pub mod error;

/// Numeric helpers used by the model and the trainer.
///
/// # Functions
/// - `sigmoid` - Logistic function, saturating to exactly 0 or 1 for extreme inputs
/// - `softplus` - Overflow-free `ln(1 + e^z)`, used by the free energy
/// - `hamming_distance` / `normalized_hamming_distance` - Disagreement between binary vectors
///
/// # Example
/// ```rust
/// use rustyrbm::math::{normalized_hamming_distance, sigmoid};
/// use ndarray::array;
///
/// assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
/// let d = normalized_hamming_distance(&array![true, false], &array![true, true]).unwrap();
/// assert_eq!(d, 0.5);
/// ```
pub mod math;

/// The Restricted Boltzmann Machine: model, Gibbs sampler and contrastive divergence trainer.
///
/// # Components
///
/// ## Model
/// - **Rbm**: visible biases, hidden biases and a row-major `V x H` weight matrix, with
///   energy, free energy and conditional probabilities of either layer
/// - Plain text parameter files (`serialize` / `deserialize`) and JSON snapshots
///
/// ## Sampler
/// - **alternating_gibbs_step**: one block Gibbs sweep, hidden given visible then visible
///   given hidden, with one independent uniform draw per unit
/// - **JointState**: a visible/hidden configuration that can be advanced step by step
/// - **sample_independent_chains**: many independent chains in parallel
///
/// ## Trainer
/// - **ContrastiveDivergence**: mini-batch CD-K updates with an optional persistent chain
/// - **UpdateReport**: the mini-batch of one update and its reconstruction errors
///
/// # Key Features
/// - **Parallel Processing**: Rayon-based per-unit parallelism above a size threshold
/// - **Reproducibility**: seeded runs produce identical chains regardless of thread count
/// - **All-or-nothing updates**: statistics are complete before any parameter is written
///
/// # Examples
/// ```rust
/// use rustyrbm::rbm::*;
/// use ndarray::Array2;
///
/// let training_set = Array2::from_shape_fn((8, 6), |(_, i)| i % 2 == 0);
/// let mut model = Rbm::new(6, 3).unwrap();
/// let mut trainer = ContrastiveDivergence::new(0.1, 1, 4, Some(1)).unwrap();
///
/// let report = trainer.update(&mut model, &training_set).unwrap();
/// assert_eq!(report.get_batch_indices().len(), 4);
///
/// let samples = sample_independent_chains(&model, 3, 10, Some(2)).unwrap();
/// assert_eq!(samples.len(), 3);
/// ```
pub mod rbm;

/// Loading binary training sets from labelled intensity tables.
///
/// # Data Format
/// Comma-separated rows in the MNIST CSV layout: one header line, then one example per
/// line with the label in the first column followed by integer intensities on a 0-255
/// scale. Intensities at or above a threshold (128 by default) become `true`.
///
/// # Example
/// ```rust,no_run
/// use rustyrbm::dataset::{load_binarized_csv, DEFAULT_BINARIZE_THRESHOLD};
///
/// let training_set = load_binarized_csv("mnist_train.csv", 784, DEFAULT_BINARIZE_THRESHOLD).unwrap();
/// println!("{} examples", training_set.nrows());
/// ```
pub mod dataset;

/// Rendering sampled visible states as a tiled grayscale image.
pub mod visualization;

/// Long-running training loop with stop and checkpoint requests.
///
/// Requests arrive through a `TrainingControl` handle, which can be fed by process
/// signals (`SIGINT` stops, `SIGUSR1` checkpoints) or by any other thread. They are
/// only honoured between two updates.
pub mod control;

/// TOML configuration shared by the command-line tool.
pub mod config;

/// `tracing` subscriber setup for the command-line tool.
pub mod logging;

/// A convenience module that re-exports the most commonly used types and functions.
///
/// # Examples
/// ```rust
/// use rustyrbm::prelude::*;
///
/// let model = Rbm::new(4, 2).unwrap();
/// assert_eq!(model.n_hidden(), 2);
/// ```
pub mod prelude;

#[cfg(test)]
mod test;
