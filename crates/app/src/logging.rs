use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber. `LEARN_LOG` takes `EnvFilter` directives,
/// e.g. `services=debug,info`. Logs go to stderr so lesson text on stdout
/// stays readable.
pub fn init_tracing() {
    let directives = std::env::var("LEARN_LOG").unwrap_or_else(|_| DEFAULT_FILTER.into());
    let env_filter =
        EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let stderr_layer = fmt::layer().with_target(true).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .init();
}
