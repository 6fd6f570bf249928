use tracing_subscriber::EnvFilter;

/// Environment variable read for the log filter (e.g. `EASEL_LOG=easel_editor=debug`)
pub const LOG_ENV: &str = "EASEL_LOG";

/// Install a `fmt` subscriber filtered by [`LOG_ENV`], defaulting to `default_filter`.
///
/// Logs go to stderr so command output on stdout stays parseable.
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init();
}
