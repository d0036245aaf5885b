use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "reading_service=info,reading_client=info,tower_http=warn";

/// Install the global fmt subscriber. `RUST_LOG` replaces the default
/// directives when set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
