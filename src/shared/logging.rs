/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the default filter. Calling this twice is harmless; the
/// second attempt is ignored.
pub fn init_logging() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "printdesk_offline=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
