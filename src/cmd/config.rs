//! Configuration view command: `knbn-web config`.

use anyhow::Result;
use knbn_web::config::CONFIG_FILE_NAME;

use super::super::Cli;

pub fn cmd_config(cli: &Cli) -> Result<()> {
    let config = super::load_config(cli)?;
    let config_path = config.working_root.join(CONFIG_FILE_NAME);

    println!();
    println!("KnBn Web Configuration");
    println!("======================");
    println!();
    if config_path.exists() {
        println!("Config file: {}", config_path.display());
    } else {
        println!("No {} found at {}", CONFIG_FILE_NAME, config.working_root.display());
    }
    println!();
    println!("[server]");
    println!("  host = \"{}\"", config.host);
    println!("  port = {}", config.port);
    println!("  open = {}", config.open_browser);
    println!("  dev = {}", config.dev_mode);
    println!();
    println!("[discovery]");
    println!("  working_root = \"{}\"", config.working_root.display());
    println!("  cache_ttl_ms = {}", config.cache_ttl.as_millis());
    println!("  recursive = {}", config.recursive_default);
    println!();

    Ok(())
}
