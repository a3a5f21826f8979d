use tracing_subscriber::{fmt::SubscriberBuilder, EnvFilter};

/// Installs the global fmt subscriber, filtered by `RUST_LOG` or `default_filter`.
///
/// Logs go to stderr so the run summary on stdout stays machine-readable.
pub fn init_tracing(default_filter: &str) -> Result<(), anyhow::Error> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))
}

/// Default filter for the importer; `verbose` also shows per-entry decisions.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "velo_catalog=debug,velo_import=debug,sqlx=warn"
    } else {
        "velo_catalog=info,velo_import=info,sqlx=warn"
    }
}
