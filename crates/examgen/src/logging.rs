//! Tracing initialization for binaries and examples embedding the client.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs a fmt subscriber honoring `RUST_LOG` (default `info`) and routes
/// `log` macros through tracing. Safe to call once per process; a second
/// call is a logged no-op.
pub fn init_tracing() {
    if tracing_log::LogTracer::init().is_err() {
        log::debug!("LogTracer already installed");
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let result = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
    if result.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
