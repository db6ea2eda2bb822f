use tracing_subscriber::EnvFilter;

pub(super) const LOG_ENV: &str = "IMAGETREE_LOG";

pub(super) fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
