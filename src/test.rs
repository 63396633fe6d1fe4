use crate::error::RbmError;
use crate::rbm::*;
use approx::assert_abs_diff_eq;
use ndarray::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

mod dataset_test;
mod math_test;
mod trainer_test;
