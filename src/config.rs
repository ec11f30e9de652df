//! Server configuration.
//!
//! Layered in this order, later layers winning:
//! 1. built-in defaults
//! 2. `knbn-web.toml` at the working root
//! 3. CLI flags (clap also reads the `KNBN_*` environment variables)
//!
//! # Configuration File Format
//!
//! ```toml
//! [server]
//! host = "127.0.0.1"
//! port = 9000
//! open = true
//!
//! [discovery]
//! cache_ttl_ms = 5000
//! recursive = false
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::discovery::DEFAULT_CACHE_TTL;

/// File name of the optional config file at the working root.
pub const CONFIG_FILE_NAME: &str = "knbn-web.toml";

/// Environment variable that overrides the working root.
pub const WORKING_ROOT_ENV: &str = "KNBN_CWD";

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Runtime configuration for the web server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub working_root: PathBuf,
    pub open_browser: bool,
    pub dev_mode: bool,
    pub cache_ttl: Duration,
    /// Recursive search when a board listing request does not say.
    pub recursive_default: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            working_root: PathBuf::from("."),
            open_browser: true,
            dev_mode: false,
            cache_ttl: DEFAULT_CACHE_TTL,
            recursive_default: false,
        }
    }
}

/// Raw TOML structure for `knbn-web.toml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigToml {
    server: Option<ServerSection>,
    discovery: Option<DiscoverySection>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServerSection {
    host: Option<String>,
    port: Option<u16>,
    open: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiscoverySection {
    cache_ttl_ms: Option<u64>,
    recursive: Option<bool>,
}

/// Values given on the command line (or via their environment variables).
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub no_open: bool,
    pub dev: bool,
    pub cache_ttl_ms: Option<u64>,
    pub recursive: bool,
}

impl ServerConfig {
    /// Load defaults plus `knbn-web.toml` from `working_root`, if present.
    pub fn load(working_root: &Path) -> Result<Self> {
        let mut config = Self {
            working_root: working_root.to_path_buf(),
            ..Self::default()
        };

        let config_path = working_root.join(CONFIG_FILE_NAME);
        if !config_path.exists() {
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        config
            .apply_toml(&content)
            .with_context(|| format!("Failed to parse {}", config_path.display()))?;
        tracing::debug!(path = %config_path.display(), "loaded config file");
        Ok(config)
    }

    fn apply_toml(&mut self, content: &str) -> Result<()> {
        let file: ConfigToml = toml::from_str(content)?;
        if let Some(server) = file.server {
            if let Some(host) = server.host {
                self.host = host;
            }
            if let Some(port) = server.port {
                anyhow::ensure!(port != 0, "server.port must be between 1 and 65535");
                self.port = port;
            }
            if let Some(open) = server.open {
                self.open_browser = open;
            }
        }
        if let Some(discovery) = file.discovery {
            if let Some(ttl) = discovery.cache_ttl_ms {
                self.cache_ttl = Duration::from_millis(ttl);
            }
            if let Some(recursive) = discovery.recursive {
                self.recursive_default = recursive;
            }
        }
        Ok(())
    }

    /// Apply command-line overrides on top of the loaded configuration.
    pub fn apply_cli(&mut self, cli: &CliOverrides) {
        if let Some(host) = &cli.host {
            self.host = host.clone();
        }
        if let Some(port) = cli.port {
            self.port = port;
        }
        if cli.no_open {
            self.open_browser = false;
        }
        if cli.dev {
            self.dev_mode = true;
        }
        if let Some(ttl) = cli.cache_ttl_ms {
            self.cache_ttl = Duration::from_millis(ttl);
        }
        if cli.recursive {
            self.recursive_default = true;
        }
    }

    /// Address the server binds to. Dev mode listens on all interfaces.
    pub fn bind_addr(&self) -> String {
        let host = if self.dev_mode { "0.0.0.0" } else { self.host.as_str() };
        format!("{}:{}", host, self.port)
    }
}

/// The working root: an explicit override if given, else the process cwd.
pub fn resolve_working_root(override_dir: Option<&Path>) -> Result<PathBuf> {
    let dir = match override_dir {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().context("Failed to get current directory")?,
    };
    dir.canonicalize()
        .with_context(|| format!("Failed to resolve working directory {}", dir.display()))
}
