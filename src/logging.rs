use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the tracing subscriber, writing to stderr.
///
/// `RUST_LOG` wins when set. Otherwise `debug` with `--verbose`, `warn` without.
pub fn init(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));

    // Already-installed subscriber (tests, embedding) is not an error
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(std::io::stderr)
        .try_init();
}
