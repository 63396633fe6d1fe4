/// Validation helpers and random generator setup shared by the model, sampler and trainer
mod helper_function;
/// Model parameters, energy, conditional probabilities and parameter persistence
pub mod model;
/// Block Gibbs sampling over the bipartite graph
pub mod sampler;
/// Mini-batch contrastive divergence training
pub mod trainer;

pub use model::*;
pub use sampler::*;
pub use trainer::*;
