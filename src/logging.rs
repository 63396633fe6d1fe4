use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber for the command-line tool.
///
/// `RUST_LOG` takes precedence when set; otherwise events at `info` and above are
/// shown, or `debug` and above when `verbose` is true (this includes the per-example
/// reconstruction errors of every update). Calling it a second time is a no-op.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
