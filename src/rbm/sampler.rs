use super::helper_function::{seeded_rng, validate_positive_count, validate_state_length};
use super::model::Rbm;
use crate::error::RbmError;
use ndarray::{Array1, Zip};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::{IntoParallelIterator, ParallelIterator};

/// A joint binary configuration of the visible and hidden layers.
///
/// Joint states are ephemeral: they exist while a chain is being sampled or while
/// the trainer collects statistics, and are never stored with the model.
///
/// # Fields
///
/// - `visible` - One bit per visible unit
/// - `hidden` - One bit per hidden unit
#[derive(Debug, Clone, PartialEq)]
pub struct JointState {
    pub visible: Array1<bool>,
    pub hidden: Array1<bool>,
}

impl JointState {
    /// Creates a state with every unit off.
    pub fn zeros(n_visible: usize, n_hidden: usize) -> Self {
        JointState {
            visible: Array1::from_elem(n_visible, false),
            hidden: Array1::from_elem(n_hidden, false),
        }
    }

    /// Creates a state where every unit is an independent fair coin flip.
    ///
    /// # Parameters
    ///
    /// - `n_visible` - Number of visible units
    /// - `n_hidden` - Number of hidden units
    /// - `rng` - Source of randomness
    pub fn random<R: Rng>(n_visible: usize, n_hidden: usize, rng: &mut R) -> Self {
        let visible = Array1::from_shape_simple_fn(n_visible, || rng.random::<bool>());
        let hidden = Array1::from_shape_simple_fn(n_hidden, || rng.random::<bool>());

        JointState { visible, hidden }
    }

    /// Advances the state by one full Gibbs sweep, see [`alternating_gibbs_step`].
    pub fn gibbs_step<R: Rng>(&mut self, model: &Rbm, rng: &mut R) -> Result<(), RbmError> {
        alternating_gibbs_step(model, &mut self.visible, &mut self.hidden, rng)
    }

    /// Runs `steps` consecutive Gibbs sweeps on this state.
    ///
    /// # Errors
    ///
    /// - `RbmError::InvalidInput` - If the state does not match the model dimensions
    pub fn run<R: Rng>(
        &mut self,
        model: &Rbm,
        steps: usize,
        rng: &mut R,
    ) -> Result<(), RbmError> {
        for _ in 0..steps {
            self.gibbs_step(model, rng)?;
        }

        Ok(())
    }
}

/// Performs one block Gibbs sweep: hidden given visible, then visible given hidden.
///
/// Units within a layer are conditionally independent given the other layer, so each
/// half-step updates its whole layer at once. The hidden half-step completes before
/// the visible half-step reads it.
///
/// Every unit consumes exactly one uniform draw. The draws for a half-step are taken
/// from `rng` in unit order before the layer is updated, so a seeded generator gives the
/// same chain regardless of how the activations are split across threads.
///
/// # Parameters
///
/// - `model` - Model providing biases and weights
/// - `visible` - Visible state of length V, replaced in place
/// - `hidden` - Hidden state of length H, replaced in place
/// - `rng` - Source of uniform draws
///
/// # Returns
///
/// - `Ok(())` - The sweep completed and both states were updated
/// - `Err(RbmError::InvalidInput)` - If a state does not match the model; nothing is modified
///
/// # Examples
/// ```rust
/// use rustyrbm::rbm::{Rbm, alternating_gibbs_step};
/// use ndarray::Array1;
/// use rand::SeedableRng;
/// use rand::rngs::StdRng;
///
/// let model = Rbm::new(6, 3).unwrap();
/// let mut visible = Array1::from_elem(6, false);
/// let mut hidden = Array1::from_elem(3, false);
/// let mut rng = StdRng::seed_from_u64(7);
///
/// alternating_gibbs_step(&model, &mut visible, &mut hidden, &mut rng).unwrap();
/// ```
pub fn alternating_gibbs_step<R: Rng>(
    model: &Rbm,
    visible: &mut Array1<bool>,
    hidden: &mut Array1<bool>,
    rng: &mut R,
) -> Result<(), RbmError> {
    validate_state_length(visible.len(), model.n_visible(), "Visible")?;
    validate_state_length(hidden.len(), model.n_hidden(), "Hidden")?;

    let hidden_probabilities = model.hidden_probabilities(&*visible)?;
    sample_layer(hidden, &hidden_probabilities, rng);

    let visible_probabilities = model.visible_probabilities(&*hidden)?;
    sample_layer(visible, &visible_probabilities, rng);

    Ok(())
}

/// Sets each unit to `draw < p` using one fresh uniform draw per unit.
pub(super) fn sample_layer<R: Rng>(
    state: &mut Array1<bool>,
    probabilities: &Array1<f64>,
    rng: &mut R,
) {
    let draws = Array1::from_shape_simple_fn(probabilities.len(), || rng.random::<f64>());

    Zip::from(state)
        .and(probabilities)
        .and(&draws)
        .for_each(|unit, &p, &u| *unit = u < p);
}

/// Draws visible samples from independent, randomly initialized Gibbs chains.
///
/// Each chain starts from uniform random bits, runs `steps` sweeps and contributes its
/// final visible state. Chains run in parallel and each owns a generator seeded from
/// a master stream, so the result is reproducible for a fixed `random_seed`.
///
/// # Parameters
///
/// - `model` - Model to sample from
/// - `n_chains` - Number of samples to produce (must be greater than 0)
/// - `steps` - Gibbs sweeps per chain
/// - `random_seed` - Optional seed for the master stream
///
/// # Returns
///
/// - `Ok(Vec<Array1<bool>>)` - One visible state per chain, in chain order
/// - `Err(RbmError::InvalidInput)` - If `n_chains` is 0
pub fn sample_independent_chains(
    model: &Rbm,
    n_chains: usize,
    steps: usize,
    random_seed: Option<u64>,
) -> Result<Vec<Array1<bool>>, RbmError> {
    validate_positive_count(n_chains, "n_chains")?;

    let mut master = seeded_rng(random_seed);
    let seeds: Vec<u64> = (0..n_chains).map(|_| master.next_u64()).collect();

    let samples = seeds
        .into_par_iter()
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = JointState::random(model.n_visible(), model.n_hidden(), &mut rng);
            state.run(model, steps, &mut rng)?;
            Ok(state.visible)
        })
        .collect::<Result<Vec<Array1<bool>>, RbmError>>()?;

    tracing::debug!(n_chains, steps, "Independent chains sampled");
    Ok(samples)
}
