/// This module turns labelled intensity tables (MNIST CSV layout) into binary training sets
pub mod binarized_csv;

pub use binarized_csv::*;
