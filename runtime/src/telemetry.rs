/// Installs a `RUST_LOG`-filtered fmt subscriber, bridging `log` records into
/// `tracing`. Safe to call more than once.
#[cfg(feature = "log-runtime-traces")]
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::util::SubscriberInitExt;

    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
        // Another subscriber may already be installed by the host process.
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .finish()
            .try_init();
    });
}

#[cfg(not(feature = "log-runtime-traces"))]
pub fn init_tracing() {}
