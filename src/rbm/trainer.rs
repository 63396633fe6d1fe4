use super::helper_function::{
    seeded_rng, validate_learning_rate, validate_positive_count, validate_training_set,
};
use super::model::Rbm;
use super::sampler::JointState;
use crate::error::RbmError;
use crate::math::{normalized_hamming_distance, sigmoid};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix2, Zip};
use rand::Rng;
use rand::rngs::StdRng;

/// Threshold for parallelization of the parameter update.
/// When the weight matrix holds fewer entries than this, statistics and updates are
/// computed sequentially.
const TRAINER_PARALLEL_THRESHOLD: usize = 16_384;

/// Outcome of one contrastive divergence update.
///
/// # Fields
///
/// - `batch_indices` - Training-set rows drawn for the mini-batch, in draw order
/// - `reconstruction_errors` - For each mini-batch example, the fraction of visible
///   units on which the negative chain disagrees with the example
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateReport {
    batch_indices: Vec<usize>,
    reconstruction_errors: Array1<f64>,
}

impl UpdateReport {
    get_field_ref!(get_batch_indices, batch_indices, &[usize]);
    get_field_ref!(get_reconstruction_errors, reconstruction_errors, &Array1<f64>);

    /// Mean of the per-example reconstruction errors.
    pub fn mean_reconstruction_error(&self) -> f64 {
        self.reconstruction_errors.mean().unwrap_or(0.0)
    }
}

/// Mini-batch contrastive divergence trainer.
///
/// One call to [`ContrastiveDivergence::update`] performs a single stochastic gradient
/// ascent step on an approximation of the log-likelihood:
///
/// 1. A negative chain is initialized with uniform random bits and advanced by
///    `chain_length` Gibbs sweeps to approximate a sample from the model.
/// 2. `batch_size` training examples are drawn uniformly with replacement.
/// 3. Hidden units are sampled for every mini-batch example (the positive phase).
/// 4. Biases and weights move by `learning_rate` times the difference between the
///    positive statistics and the negative chain statistics.
///
/// By default the negative chain is rebuilt from random bits on every call. With
/// `persistent_chain` enabled, the chain left by one call seeds the next one.
///
/// # Fields
///
/// - `learning_rate` - Step size of the gradient ascent
/// - `chain_length` - Gibbs sweeps run on the negative chain per update (K)
/// - `batch_size` - Number of training examples per mini-batch (M)
/// - `persistent_chain` - Whether the negative chain is carried across updates
/// - `random_seed` - Optional seed for reproducible training
/// - `n_updates` - Number of updates applied so far
///
/// # Examples
/// ```rust
/// use rustyrbm::rbm::{ContrastiveDivergence, Rbm};
/// use ndarray::Array2;
///
/// let mut model = Rbm::new(4, 2).unwrap();
/// let pattern = [true, true, false, false];
/// let training_set = Array2::from_shape_fn((20, 4), |(_, i)| pattern[i]);
///
/// let mut trainer = ContrastiveDivergence::new(0.1, 1, 5, Some(42)).unwrap();
/// for _ in 0..100 {
///     trainer.update(&mut model, &training_set).unwrap();
/// }
///
/// let biases = model.get_visible_biases();
/// assert!(biases[0] > 0.0 && biases[2] < 0.0);
/// ```
#[derive(Debug, Clone)]
pub struct ContrastiveDivergence {
    learning_rate: f64,
    chain_length: usize,
    batch_size: usize,
    persistent_chain: bool,
    random_seed: Option<u64>,
    rng: StdRng,
    chain: Option<JointState>,
    n_updates: usize,
}

impl Default for ContrastiveDivergence {
    /// implement Default for ContrastiveDivergence
    ///
    /// # Default Values
    ///
    /// - `learning_rate` - 0.001
    /// - `chain_length` - 50
    /// - `batch_size` - 10
    /// - `persistent_chain` - false
    /// - `random_seed` - None
    fn default() -> Self {
        ContrastiveDivergence {
            learning_rate: 0.001,
            chain_length: 50,
            batch_size: 10,
            persistent_chain: false,
            random_seed: None,
            rng: seeded_rng(None),
            chain: None,
            n_updates: 0,
        }
    }
}

impl ContrastiveDivergence {
    /// Creates a new trainer with the specified hyperparameters.
    ///
    /// # Parameters
    ///
    /// - `learning_rate` - Step size (must be positive and finite)
    /// - `chain_length` - Gibbs sweeps per update (must be greater than 0)
    /// - `batch_size` - Mini-batch size (must be greater than 0, may exceed the training-set size)
    /// - `random_seed` - Optional seed for reproducible training
    ///
    /// # Returns
    ///
    /// - `Result<Self, RbmError>` - A new trainer if the hyperparameters are valid
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If any hyperparameter is out of range
    pub fn new(
        learning_rate: f64,
        chain_length: usize,
        batch_size: usize,
        random_seed: Option<u64>,
    ) -> Result<Self, RbmError> {
        validate_learning_rate(learning_rate)?;
        validate_positive_count(chain_length, "chain_length")?;
        validate_positive_count(batch_size, "batch_size")?;

        Ok(ContrastiveDivergence {
            learning_rate,
            chain_length,
            batch_size,
            persistent_chain: false,
            random_seed,
            rng: seeded_rng(random_seed),
            chain: None,
            n_updates: 0,
        })
    }

    /// Enables or disables carrying the negative chain across updates.
    pub fn with_persistent_chain(mut self, persistent_chain: bool) -> Self {
        self.persistent_chain = persistent_chain;
        self
    }

    // Getters
    get_field!(get_learning_rate, learning_rate, f64);
    get_field!(get_chain_length, chain_length, usize);
    get_field!(get_batch_size, batch_size, usize);
    get_field!(get_persistent_chain, persistent_chain, bool);
    get_field!(get_random_seed, random_seed, Option<u64>);
    get_field!(get_n_updates, n_updates, usize);
    get_field_as_ref!(get_negative_chain, chain, Option<&JointState>);

    /// Changes the step size used by subsequent updates.
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If `learning_rate` is not positive and finite
    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<(), RbmError> {
        validate_learning_rate(learning_rate)?;
        self.learning_rate = learning_rate;
        Ok(())
    }

    /// Performs one mini-batch contrastive divergence update on `model`.
    ///
    /// All statistics are gathered before any parameter is written: if this returns an
    /// error the model is untouched, and if it succeeds every bias and weight has been
    /// updated.
    ///
    /// # Parameters
    ///
    /// - `model` - Model updated in place
    /// - `training_set` - Binary matrix with one example per row and one column per visible unit
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateReport)` - The mini-batch that was used and its reconstruction errors
    /// - `Err(RbmError::InvalidInput)` - If the training set is empty or its width differs from the model
    ///
    /// # Performance
    ///
    /// Statistics and parameter writes are split across the rayon pool when the weight
    /// matrix holds at least 16384 entries. Each worker owns whole rows of the weight
    /// matrix, so no two workers write the same parameter.
    pub fn update<S>(
        &mut self,
        model: &mut Rbm,
        training_set: &ArrayBase<S, Ix2>,
    ) -> Result<UpdateReport, RbmError>
    where
        S: Data<Elem = bool>,
    {
        validate_training_set(training_set, model.n_visible())?;

        let n_visible = model.n_visible();
        let n_hidden = model.n_hidden();
        let parallel = n_visible * n_hidden >= TRAINER_PARALLEL_THRESHOLD;

        // Negative phase
        let mut chain = match self.chain.take() {
            Some(state)
                if self.persistent_chain
                    && state.visible.len() == n_visible
                    && state.hidden.len() == n_hidden =>
            {
                state
            }
            _ => JointState::random(n_visible, n_hidden, &mut self.rng),
        };
        chain.run(model, self.chain_length, &mut self.rng)?;

        // Mini-batch, drawn with replacement
        let n_examples = training_set.nrows();
        let batch_indices: Vec<usize> = (0..self.batch_size)
            .map(|_| self.rng.random_range(0..n_examples))
            .collect();
        let batch = training_set
            .select(Axis(0), &batch_indices)
            .mapv(f64::from);

        // Positive phase
        let positive_hidden = self.sample_positive_hidden(model, &batch, parallel);

        let negative_visible = chain.visible.mapv(f64::from);
        let negative_hidden = chain.hidden.mapv(f64::from);

        let visible_gradient = batch
            .mean_axis(Axis(0))
            .ok_or_else(|| RbmError::InvalidInput("Mini-batch is empty".to_string()))?
            - &negative_visible;
        let hidden_gradient = positive_hidden
            .mean_axis(Axis(0))
            .ok_or_else(|| RbmError::InvalidInput("Mini-batch is empty".to_string()))?
            - &negative_hidden;

        let mut weight_gradient = batch.t().dot(&positive_hidden) / self.batch_size as f64;
        weight_gradient -= &negative_visible
            .view()
            .insert_axis(Axis(1))
            .dot(&negative_hidden.view().insert_axis(Axis(0)));

        let reconstruction_errors = batch_indices
            .iter()
            .map(|&idx| normalized_hamming_distance(&chain.visible, &training_set.row(idx)))
            .collect::<Result<Array1<f64>, RbmError>>()?;

        // Every statistic is ready; from here on nothing can fail
        let learning_rate = self.learning_rate;
        let (visible_biases, hidden_biases, weights) = model.parameters_mut();

        visible_biases.scaled_add(learning_rate, &visible_gradient);
        hidden_biases.scaled_add(learning_rate, &hidden_gradient);

        let rows = Zip::from(weights.rows_mut()).and(weight_gradient.rows());
        if parallel {
            rows.par_for_each(|mut row, gradient| row.scaled_add(learning_rate, &gradient));
        } else {
            rows.for_each(|mut row, gradient| row.scaled_add(learning_rate, &gradient));
        }

        for (sample, (&idx, &error)) in batch_indices
            .iter()
            .zip(reconstruction_errors.iter())
            .enumerate()
        {
            tracing::debug!(
                sample,
                example = idx,
                bits_wrong = (error * n_visible as f64).round() as usize,
                error,
                "Minibatch reconstruction"
            );
        }

        self.n_updates += 1;
        self.chain = Some(chain);

        let report = UpdateReport {
            batch_indices,
            reconstruction_errors,
        };
        tracing::debug!(
            update = self.n_updates,
            mean_error = report.mean_reconstruction_error(),
            "Contrastive divergence update applied"
        );

        Ok(report)
    }

    /// Runs `n_updates` consecutive updates with a progress bar.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<UpdateReport>)` - One report per update, in order
    /// - `Err(RbmError)` - The first error raised by [`ContrastiveDivergence::update`]
    pub fn fit<S>(
        &mut self,
        model: &mut Rbm,
        training_set: &ArrayBase<S, Ix2>,
        n_updates: usize,
    ) -> Result<Vec<UpdateReport>, RbmError>
    where
        S: Data<Elem = bool>,
    {
        validate_positive_count(n_updates, "n_updates")?;
        validate_training_set(training_set, model.n_visible())?;

        let progress_bar = ProgressBar::new(n_updates as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} | Error: {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );

        let mut reports = Vec::with_capacity(n_updates);
        for _ in 0..n_updates {
            let report = self.update(model, training_set)?;
            progress_bar.set_message(format!("{:.4}", report.mean_reconstruction_error()));
            progress_bar.inc(1);
            reports.push(report);
        }

        let final_error = reports
            .last()
            .map(UpdateReport::mean_reconstruction_error)
            .unwrap_or(0.0);
        progress_bar.finish_with_message(format!("{:.4}", final_error));

        tracing::info!(
            n_updates,
            total_updates = self.n_updates,
            final_error,
            "Contrastive divergence training finished"
        );

        Ok(reports)
    }

    /// Samples the hidden layer for every mini-batch example.
    ///
    /// Returns an `M x H` matrix of 0/1 values. Draws are taken before the parallel pass
    /// so each unit of each example consumes its own uniform number.
    fn sample_positive_hidden(&mut self, model: &Rbm, batch: &Array2<f64>, parallel: bool) -> Array2<f64> {
        let draws = Array2::from_shape_simple_fn((batch.nrows(), model.n_hidden()), || {
            self.rng.random::<f64>()
        });

        let mut hidden = batch.dot(model.get_weights());
        hidden += model.get_hidden_biases();

        let sample = |unit: &mut f64, &u: &f64| *unit = if u < sigmoid(*unit) { 1.0 } else { 0.0 };
        let units = Zip::from(&mut hidden).and(&draws);
        if parallel {
            units.par_for_each(sample);
        } else {
            units.for_each(sample);
        }

        hidden
    }
}
