//! Tracing setup for binaries.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install a formatting subscriber.
///
/// `RUST_LOG` wins when set; otherwise `default_level` applies to every
/// target.
///
/// # Errors
///
/// Fails when `default_level` is not a valid filter or a global subscriber
/// is already installed.
pub fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_level)?,
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;
    Ok(())
}
