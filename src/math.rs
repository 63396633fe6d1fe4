use crate::error::RbmError;
use ndarray::{ArrayBase, Data, Ix1};

/// Inputs beyond this magnitude saturate the sigmoid to exactly 0 or 1.
const SIGMOID_SATURATION: f64 = 500.0;

/// Computes the logistic sigmoid for a scalar input.
///
/// The sigmoid maps any real number into the interval [0, 1] with clipping
/// for extreme values to preserve numerical stability.
///
/// # Parameters
///
/// - `z` - Input value to transform
///
/// # Returns
///
/// - `f64` - Sigmoid output in the range [0, 1]
///
/// # Examples
/// ```rust
/// use rustyrbm::math::sigmoid;
///
/// let value = sigmoid(0.0);
/// assert!((value - 0.5).abs() < 1e-12);
/// assert_eq!(sigmoid(1e6), 1.0);
/// ```
#[inline]
pub fn sigmoid(z: f64) -> f64 {
    if z > SIGMOID_SATURATION {
        return 1.0;
    } else if z < -SIGMOID_SATURATION {
        return 0.0;
    }

    1.0 / (1.0 + (-z).exp())
}

/// Computes `ln(1 + e^z)` without overflowing for large `z`.
///
/// # Parameters
///
/// - `z` - Input value
///
/// # Returns
///
/// - `f64` - The softplus of `z`
#[inline]
pub fn softplus(z: f64) -> f64 {
    z.max(0.0) + (-z.abs()).exp().ln_1p()
}

/// Counts the positions at which two binary vectors differ.
///
/// # Parameters
///
/// - `a` - First binary vector
/// - `b` - Second binary vector
///
/// # Returns
///
/// - `Ok(usize)` - Number of differing positions
/// - `Err(RbmError::InvalidInput)` - If the vectors have different lengths
///
/// # Examples
/// ```rust
/// use ndarray::array;
/// use rustyrbm::math::hamming_distance;
///
/// let a = array![true, false, true, true];
/// let b = array![true, true, false, true];
/// assert_eq!(hamming_distance(&a, &b).unwrap(), 2);
/// ```
pub fn hamming_distance<S1, S2>(
    a: &ArrayBase<S1, Ix1>,
    b: &ArrayBase<S2, Ix1>,
) -> Result<usize, RbmError>
where
    S1: Data<Elem = bool>,
    S2: Data<Elem = bool>,
{
    if a.len() != b.len() {
        return Err(RbmError::InvalidInput(format!(
            "Cannot compare binary vectors of different lengths: {} and {}",
            a.len(),
            b.len()
        )));
    }

    Ok(a.iter().zip(b.iter()).filter(|(x, y)| x != y).count())
}

/// Hamming distance divided by the vector length, in [0, 1].
///
/// Two empty vectors have a distance of 0.
pub fn normalized_hamming_distance<S1, S2>(
    a: &ArrayBase<S1, Ix1>,
    b: &ArrayBase<S2, Ix1>,
) -> Result<f64, RbmError>
where
    S1: Data<Elem = bool>,
    S2: Data<Elem = bool>,
{
    let bits_wrong = hamming_distance(a, b)?;
    if a.is_empty() {
        return Ok(0.0);
    }
    Ok(bits_wrong as f64 / a.len() as f64)
}
