use tracing_subscriber::EnvFilter;

/// Logs go to stderr so stdout only ever carries the response status line.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "slack_notifier=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
