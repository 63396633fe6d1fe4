use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rustyrbm::logging::init_logging;
use rustyrbm::prelude::*;

/// rustyrbm: train and sample binary Restricted Boltzmann Machines.
#[derive(Parser)]
#[command(name = "rustyrbm", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands for training and sampling.
#[derive(Subcommand)]
enum Command {
    /// Train on a labelled CSV table until interrupted (SIGINT stops, SIGUSR1 checkpoints).
    Train {
        /// Path to a TOML config file. Defaults describe the MNIST setup.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the training table path.
        #[arg(long)]
        data: Option<PathBuf>,
        /// Override the parameter file written on checkpoint and exit.
        #[arg(long)]
        parameters: Option<PathBuf>,
        /// Start from the existing parameter file instead of a zero model.
        #[arg(long)]
        resume: bool,
        /// Stop after this many updates.
        #[arg(long)]
        max_rounds: Option<usize>,
        /// Override the learning rate.
        #[arg(long)]
        learning_rate: Option<f64>,
        /// Seed for a reproducible run.
        #[arg(long)]
        seed: Option<u64>,
        /// Carry the negative chain across updates.
        #[arg(long)]
        persistent_chain: bool,
        /// Log per-example reconstruction errors.
        #[arg(short, long)]
        verbose: bool,
    },
    /// Draw samples from independent Gibbs chains and write them as an image grid.
    Sample {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the parameter file to read.
        #[arg(long)]
        parameters: Option<PathBuf>,
        /// Override the output image path (format follows the extension).
        #[arg(long)]
        output: Option<PathBuf>,
        /// Override the number of Gibbs sweeps per chain.
        #[arg(long)]
        steps: Option<usize>,
        /// Seed for reproducible samples.
        #[arg(long)]
        seed: Option<u64>,
        /// Enable debug logging.
        #[arg(short, long)]
        verbose: bool,
    },
}

fn load_config(path: Option<&PathBuf>) -> Result<RbmConfig> {
    match path {
        Some(path) => RbmConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(RbmConfig::default()),
    }
}

/// Exit status for bad training data, parameter files or settings.
const EXIT_INVALID_INPUT: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::from(exit_status(&err))
        }
    }
}

/// Maps a failure to the process exit status.
///
/// Input the run cannot start from (malformed tables, parameter files or settings) exits
/// with `EXIT_INVALID_INPUT`; anything else, such as an I/O failure mid-run, exits with 1.
fn exit_status(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<RbmError>() {
        Some(rbm_error) if rbm_error.is_fatal_input() => EXIT_INVALID_INPUT,
        _ => 1,
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Train {
            config,
            data,
            parameters,
            resume,
            max_rounds,
            learning_rate,
            seed,
            persistent_chain,
            verbose,
        } => {
            init_logging(verbose);

            let mut config = load_config(config.as_ref())?;
            if let Some(path) = data {
                config.training_data_path = path;
            }
            if let Some(path) = parameters {
                config.parameters_path = path;
            }
            if let Some(rate) = learning_rate {
                config.learning_rate = rate;
            }
            config.max_rounds = max_rounds.or(config.max_rounds);
            config.random_seed = seed.or(config.random_seed);
            config.persistent_chain |= persistent_chain;
            config.validate()?;

            train(&config, resume)
        }
        Command::Sample {
            config,
            parameters,
            output,
            steps,
            seed,
            verbose,
        } => {
            init_logging(verbose);

            let mut config = load_config(config.as_ref())?;
            if let Some(path) = parameters {
                config.parameters_path = path;
            }
            if let Some(path) = output {
                config.sampling.output_path = path;
            }
            if let Some(steps) = steps {
                config.sampling.gibbs_steps = steps;
            }
            config.random_seed = seed.or(config.random_seed);
            config.validate()?;

            sample(&config)
        }
    }
}

fn train(config: &RbmConfig, resume: bool) -> Result<()> {
    // Bad data or a bad parameter file aborts here, before any update runs
    let training_set = load_binarized_csv(
        &config.training_data_path,
        config.n_visible,
        config.binarize_threshold,
    )
    .with_context(|| {
        format!(
            "Failed to ingest training data from {}",
            config.training_data_path.display()
        )
    })?;

    let mut model = if resume {
        Rbm::load_parameters(&config.parameters_path, config.n_visible, config.n_hidden)
            .with_context(|| {
                format!(
                    "Failed to load parameters from {}",
                    config.parameters_path.display()
                )
            })?
    } else {
        Rbm::new(config.n_visible, config.n_hidden)?
    };

    let mut trainer = ContrastiveDivergence::new(
        config.learning_rate,
        config.chain_length,
        config.batch_size,
        config.random_seed,
    )?
    .with_persistent_chain(config.persistent_chain);

    let control = TrainingControl::new();
    control
        .register_signal_handlers()
        .context("Failed to install signal handlers")?;

    tracing::info!(
        examples = training_set.nrows(),
        n_visible = config.n_visible,
        n_hidden = config.n_hidden,
        learning_rate = config.learning_rate,
        chain_length = config.chain_length,
        batch_size = config.batch_size,
        persistent_chain = config.persistent_chain,
        "Starting training"
    );

    let options = TrainingOptions {
        parameters_path: config.parameters_path.clone(),
        max_rounds: config.max_rounds,
    };
    let summary = train_until_stopped(&mut model, &mut trainer, &training_set, &control, &options)?;

    if summary.stopped_by_request {
        tracing::info!(rounds = summary.rounds, "Caught interrupt");
    }
    Ok(())
}

fn sample(config: &RbmConfig) -> Result<()> {
    let model = Rbm::load_parameters(&config.parameters_path, config.n_visible, config.n_hidden)
        .with_context(|| {
            format!(
                "Failed to load parameters from {}",
                config.parameters_path.display()
            )
        })?;

    let sampling = &config.sampling;
    let grid = SampleGrid::new(
        sampling.grid_columns,
        sampling.grid_rows,
        sampling.tile_width,
        sampling.pixel_size,
    )?;

    let samples =
        sample_independent_chains(&model, grid.capacity(), sampling.gibbs_steps, config.random_seed)?;
    grid.save(&samples, &sampling.output_path)
        .with_context(|| format!("Failed to write {}", sampling.output_path.display()))?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_exit_status_for_rejected_input() {
        let ingestion = anyhow::Error::new(RbmError::Ingestion {
            line: 3,
            reason: "expected 784 values after the label, found 12".to_string(),
        })
        .context("Failed to ingest training data from mnist_train.csv");
        assert_eq!(exit_status(&ingestion), EXIT_INVALID_INPUT);

        let format = anyhow::Error::new(RbmError::Format("Value #0 ('NaN') is not finite".to_string()));
        assert_eq!(exit_status(&format), EXIT_INVALID_INPUT);

        let invalid = anyhow::Error::new(RbmError::InvalidInput("batch_size must be greater than 0".to_string()));
        assert_eq!(exit_status(&invalid), EXIT_INVALID_INPUT);
    }

    #[test]
    fn test_exit_status_for_other_failures() {
        let io = anyhow::Error::new(RbmError::Io(std::io::Error::other("disk full")))
            .context("Failed to write output.bmp");
        assert_eq!(exit_status(&io), 1);
        assert_eq!(exit_status(&anyhow!("signal handler failed")), 1);
    }
}
