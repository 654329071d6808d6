//! Diagnostic logging to stderr.
//!
//! `RUST_LOG` wins when set (e.g. `RUST_LOG=modmap::defaults=debug`);
//! otherwise only warnings are shown, or debug output with `--verbose`.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    if let Err(e) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(true))
        .try_init()
    {
        tracing::debug!("tracing subscriber already installed: {}", e);
    }
}
