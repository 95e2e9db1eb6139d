use tracing_subscriber::EnvFilter;

const DEFAULT_FILTER: &str = "esweb=info,esweb_native=info,reqwest=warn";

/// Install a `fmt` subscriber honouring `RUST_LOG`. A second call is a no-op.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
