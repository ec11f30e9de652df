//! Web server command: `knbn-web server`.

use anyhow::Result;

use super::super::Cli;

pub async fn cmd_server(cli: &Cli) -> Result<()> {
    let config = super::load_config(cli)?;
    knbn_web::web::server::start_server(config).await
}
