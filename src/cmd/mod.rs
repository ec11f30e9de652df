//! CLI command implementations.
//!
//! | Module   | Commands handled           |
//! |----------|----------------------------|
//! | `server` | `Server` (and no command)  |
//! | `config` | `Config`                   |

pub mod config;
pub mod server;

pub use config::cmd_config;
pub use server::cmd_server;

use anyhow::Result;
use knbn_web::config::{CliOverrides, ServerConfig, resolve_working_root};

use super::Cli;

/// Effective configuration: defaults, then `knbn-web.toml`, then CLI/env.
pub fn load_config(cli: &Cli) -> Result<ServerConfig> {
    let working_root = resolve_working_root(cli.cwd.as_deref())?;
    let mut config = ServerConfig::load(&working_root)?;
    config.apply_cli(&CliOverrides {
        host: cli.host.clone(),
        port: cli.port,
        no_open: cli.no_open,
        dev: cli.dev,
        cache_ttl_ms: cli.cache_ttl_ms,
        recursive: cli.recursive,
    });
    Ok(config)
}
