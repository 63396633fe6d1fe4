use crate::error::RbmError;
use ndarray::{ArrayBase, Data, Ix2};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng, rng};

/// Validates that both layers of a model have at least one unit.
///
/// # Parameters
///
/// - `n_visible` - Number of visible units
/// - `n_hidden` - Number of hidden units
///
/// # Returns
///
/// - `Ok(())` - If both sizes are greater than 0
/// - `Err(RbmError::InvalidInput)` - If either layer is empty
pub fn validate_layer_sizes(n_visible: usize, n_hidden: usize) -> Result<(), RbmError> {
    if n_visible == 0 || n_hidden == 0 {
        return Err(RbmError::InvalidInput(format!(
            "Model needs at least one visible and one hidden unit, got {} visible and {} hidden",
            n_visible, n_hidden
        )));
    }

    Ok(())
}

/// Validates that a state vector has the length of the layer it belongs to.
///
/// # Parameters
///
/// - `actual` - Length of the provided vector
/// - `expected` - Number of units in the layer
/// - `layer` - Layer name used in the error message
///
/// # Returns
///
/// - `Ok(())` - If the lengths agree
/// - `Err(RbmError::InvalidInput)` - If they do not
pub fn validate_state_length(actual: usize, expected: usize, layer: &str) -> Result<(), RbmError> {
    if actual != expected {
        return Err(RbmError::InvalidInput(format!(
            "{} state has length {}, model expects {}",
            layer, actual, expected
        )));
    }

    Ok(())
}

/// Validates that the learning rate parameter is positive and finite.
///
/// # Parameters
///
/// * `learning_rate` - The learning rate value to validate
///
/// # Returns
///
/// - `Ok(())` - If the learning rate is valid (positive and finite)
/// - `Err(RbmError::InvalidInput)` - If the learning rate is non-positive, NaN, or infinite
pub fn validate_learning_rate(learning_rate: f64) -> Result<(), RbmError> {
    if learning_rate <= 0.0 || !learning_rate.is_finite() {
        return Err(RbmError::InvalidInput(format!(
            "learning_rate must be positive and finite, got {}",
            learning_rate
        )));
    }

    Ok(())
}

/// Validates that a count-like hyperparameter is greater than zero.
pub fn validate_positive_count(value: usize, name: &str) -> Result<(), RbmError> {
    if value == 0 {
        return Err(RbmError::InvalidInput(format!(
            "{} must be greater than 0",
            name
        )));
    }

    Ok(())
}

/// Performs validation checks on a binary training set.
///
/// This function validates that:
/// - The training set contains at least one example
/// - Every example has exactly one value per visible unit
///
/// # Parameters
///
/// - `training_set` - Binary matrix with one example per row
/// - `n_visible` - Number of visible units of the model being trained
///
/// # Returns
///
/// - `Ok(())` - If all validation checks pass
/// - `Err(RbmError::InvalidInput)` - If any validation check fails
pub fn validate_training_set<S>(
    training_set: &ArrayBase<S, Ix2>,
    n_visible: usize,
) -> Result<(), RbmError>
where
    S: Data<Elem = bool>,
{
    if training_set.nrows() == 0 {
        return Err(RbmError::InvalidInput(
            "Training set is empty".to_string(),
        ));
    }

    if training_set.ncols() != n_visible {
        return Err(RbmError::InvalidInput(format!(
            "Training examples have {} values, model has {} visible units",
            training_set.ncols(),
            n_visible
        )));
    }

    Ok(())
}

/// Creates the random generator driving a sampler or trainer.
///
/// A fixed seed gives a reproducible stream; without one the generator is seeded from
/// the thread-local generator.
pub fn seeded_rng(random_seed: Option<u64>) -> StdRng {
    match random_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::seed_from_u64(rng().next_u64()),
    }
}
