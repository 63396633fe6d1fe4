use super::*;
use crate::math::*;

#[test]
fn test_sigmoid_known_values() {
    assert_abs_diff_eq!(sigmoid(0.0), 0.5, epsilon = 1e-15);
    assert_abs_diff_eq!(sigmoid(2.0), 1.0 / (1.0 + (-2.0f64).exp()), epsilon = 1e-15);
    // sigmoid(-x) = 1 - sigmoid(x)
    for &x in &[0.1, 1.0, 3.5, 10.0] {
        assert_abs_diff_eq!(sigmoid(-x), 1.0 - sigmoid(x), epsilon = 1e-12);
    }
}

#[test]
fn test_sigmoid_extreme_inputs() {
    assert_eq!(sigmoid(1e6), 1.0);
    assert_eq!(sigmoid(-1e6), 0.0);
    assert_eq!(sigmoid(f64::INFINITY), 1.0);
    assert_eq!(sigmoid(f64::NEG_INFINITY), 0.0);
    assert!(sigmoid(-499.0).is_finite());
    assert!(sigmoid(-499.0) >= 0.0);
}

#[test]
fn test_softplus() {
    assert_abs_diff_eq!(softplus(0.0), 2.0f64.ln(), epsilon = 1e-15);
    assert_abs_diff_eq!(softplus(1.5), (1.0 + 1.5f64.exp()).ln(), epsilon = 1e-12);
    // No overflow for large inputs
    assert_abs_diff_eq!(softplus(1000.0), 1000.0, epsilon = 1e-9);
    assert!(softplus(-1000.0) >= 0.0);
}

#[test]
fn test_hamming_distance() {
    let a = array![true, true, false, false, true];
    let b = array![true, false, false, true, true];

    assert_eq!(hamming_distance(&a, &b).unwrap(), 2);
    assert_eq!(hamming_distance(&a, &a).unwrap(), 0);
    assert_abs_diff_eq!(normalized_hamming_distance(&a, &b).unwrap(), 0.4);
}

#[test]
fn test_hamming_distance_length_mismatch() {
    let a = array![true, false];
    let b = array![true, false, true];

    assert!(matches!(
        hamming_distance(&a, &b),
        Err(RbmError::InvalidInput(_))
    ));
    assert!(matches!(
        normalized_hamming_distance(&a, &b),
        Err(RbmError::InvalidInput(_))
    ));
}

#[test]
fn test_normalized_hamming_distance_empty() {
    let a = Array1::<bool>::from_elem(0, false);
    assert_eq!(normalized_hamming_distance(&a, &a).unwrap(), 0.0);
}
