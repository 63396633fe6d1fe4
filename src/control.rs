use crate::error::RbmError;
use crate::rbm::{ContrastiveDivergence, Rbm};
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{ArrayBase, Data, Ix2};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Cloneable handle used to ask a running training loop to stop or to checkpoint.
///
/// Requests are plain flags. The training loop polls them between two updates, never
/// during one, so an update always either completes or fails before mutating the model.
/// Clones share the same flags, so one clone can be handed to a signal handler or
/// another thread while the loop holds the other.
///
/// # Examples
/// ```rust
/// use rustyrbm::control::TrainingControl;
///
/// let control = TrainingControl::new();
/// let handle = control.clone();
///
/// handle.request_checkpoint();
/// assert!(control.take_checkpoint_request());
/// assert!(!control.take_checkpoint_request());
///
/// handle.request_stop();
/// assert!(control.should_stop());
/// ```
#[derive(Debug, Clone, Default)]
pub struct TrainingControl {
    stop: Arc<AtomicBool>,
    checkpoint: Arc<AtomicBool>,
}

impl TrainingControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the loop to write the parameters and return after the current update.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Asks the loop to write the parameters after the current update and keep going.
    pub fn request_checkpoint(&self) {
        self.checkpoint.store(true, Ordering::SeqCst);
    }

    pub fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    /// Returns whether a checkpoint was requested and clears the request.
    pub fn take_checkpoint_request(&self) -> bool {
        self.checkpoint.swap(false, Ordering::SeqCst)
    }

    /// Routes process signals to this handle.
    ///
    /// - `SIGINT` requests a stop; a second `SIGINT` while the first is pending exits immediately
    /// - `SIGUSR1` requests a checkpoint (unix only)
    ///
    /// # Errors
    ///
    /// - `RbmError::Io` - If a handler cannot be installed
    pub fn register_signal_handlers(&self) -> Result<(), RbmError> {
        use signal_hook::consts::SIGINT;
        use signal_hook::flag;

        // Order matters: the shutdown check must run before the flag is set
        flag::register_conditional_shutdown(SIGINT, 1, Arc::clone(&self.stop))?;
        flag::register(SIGINT, Arc::clone(&self.stop))?;

        #[cfg(unix)]
        flag::register(signal_hook::consts::SIGUSR1, Arc::clone(&self.checkpoint))?;

        tracing::debug!("Signal handlers installed");
        Ok(())
    }
}

/// Where and for how long [`train_until_stopped`] runs.
///
/// # Fields
///
/// - `parameters_path` - Text parameter file written on checkpoint and on exit
/// - `max_rounds` - Optional cap on the number of updates; `None` runs until stopped
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub parameters_path: PathBuf,
    pub max_rounds: Option<usize>,
}

/// What a finished training loop did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingSummary {
    pub rounds: usize,
    pub checkpoints: usize,
    pub last_error: Option<f64>,
    pub stopped_by_request: bool,
}

/// Trains `model` until a stop is requested or `max_rounds` updates have run.
///
/// Between two updates the loop checks `control`: a checkpoint request writes the
/// current parameters to `options.parameters_path` and training continues; a stop
/// request ends the loop. The final parameters are always written before returning
/// successfully.
///
/// # Parameters
///
/// - `model` - Model trained in place
/// - `trainer` - Contrastive divergence trainer holding the hyperparameters
/// - `training_set` - Binary training set, one example per row
/// - `control` - Stop/checkpoint request handle
/// - `options` - Output path and optional round limit
///
/// # Returns
///
/// - `Ok(TrainingSummary)` - Rounds run, checkpoints written and the last reconstruction error
/// - `Err(RbmError)` - If an update fails or parameters cannot be written
pub fn train_until_stopped<S>(
    model: &mut Rbm,
    trainer: &mut ContrastiveDivergence,
    training_set: &ArrayBase<S, Ix2>,
    control: &TrainingControl,
    options: &TrainingOptions,
) -> Result<TrainingSummary, RbmError>
where
    S: Data<Elem = bool>,
{
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} [{elapsed_precise}] Round {pos} | Error: {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(200));

    let mut summary = TrainingSummary::default();

    while !control.should_stop() {
        if options.max_rounds.is_some_and(|max| summary.rounds >= max) {
            break;
        }

        let report = trainer.update(model, training_set)?;
        let error = report.mean_reconstruction_error();
        summary.rounds += 1;
        summary.last_error = Some(error);

        tracing::info!(round = summary.rounds, error, "Round finished");
        spinner.set_position(summary.rounds as u64);
        spinner.set_message(format!("{:.4}", error));

        if control.take_checkpoint_request() {
            model.save_parameters(&options.parameters_path)?;
            summary.checkpoints += 1;
            tracing::info!(
                round = summary.rounds,
                path = %options.parameters_path.display(),
                "Checkpoint written"
            );
        }
    }

    summary.stopped_by_request = control.should_stop();
    spinner.finish_with_message(format!("{:.4}", summary.last_error.unwrap_or(0.0)));

    model.save_parameters(&options.parameters_path)?;
    tracing::info!(
        rounds = summary.rounds,
        checkpoints = summary.checkpoints,
        stopped_by_request = summary.stopped_by_request,
        path = %options.parameters_path.display(),
        "Training stopped, parameters written"
    );

    Ok(summary)
}
