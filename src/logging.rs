//! Tracing subscriber setup.

use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "knbn_web=debug,tower_http=debug"
    } else {
        "knbn_web=info"
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing(verbose: bool, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    result.map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}
