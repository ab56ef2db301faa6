//! Logging setup.
//!
//! Log verbosity is controlled with the standard `RUST_LOG` variable and
//! defaults to `info`:
//!
//! ```bash
//! RUST_LOG=devbook=debug,tower_http=debug cargo run
//! ```

use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber: an `EnvFilter` and a console fmt layer.
pub fn init_telemetry() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()?;

    info!("Telemetry initialized");
    Ok(())
}
