pub use crate::config::{RbmConfig, SamplingConfig};
pub use crate::control::{TrainingControl, TrainingOptions, TrainingSummary, train_until_stopped};
pub use crate::dataset::{BinarizedCsvReader, DEFAULT_BINARIZE_THRESHOLD, load_binarized_csv};
pub use crate::error::RbmError;
pub use crate::rbm::{
    ContrastiveDivergence, JointState, Rbm, UpdateReport, alternating_gibbs_step,
    sample_independent_chains,
};
pub use crate::visualization::SampleGrid;
