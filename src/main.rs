use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "knbn-web")]
#[command(version, about = "Kanban web interface for .knbn board files")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "KNBN_LOG_JSON")]
    pub log_json: bool,

    /// Port to serve on (default: 9000)
    #[arg(
        short,
        long,
        global = true,
        env = "KNBN_PORT",
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: Option<u16>,

    /// Interface to bind (default: 127.0.0.1)
    #[arg(long, global = true, env = "KNBN_HOST")]
    pub host: Option<String>,

    /// Don't automatically open the browser
    #[arg(long, global = true)]
    pub no_open: bool,

    /// Working directory that boards are discovered under (default: current directory)
    #[arg(long, global = true, env = "KNBN_CWD")]
    pub cwd: Option<PathBuf>,

    /// Search subdirectories for boards unless a request says otherwise
    #[arg(long, global = true)]
    pub recursive: bool,

    /// How long a board listing stays cached, in milliseconds
    #[arg(long, global = true, env = "KNBN_CACHE_TTL_MS")]
    pub cache_ttl_ms: Option<u64>,

    /// Enable dev mode (CORS permissive, bind all interfaces, no browser)
    #[arg(long, global = true)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Server,
    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    knbn_web::logging::init_tracing(cli.verbose, cli.log_json)?;

    match &cli.command {
        None | Some(Commands::Server) => cmd::cmd_server(&cli).await?,
        Some(Commands::Config) => cmd::cmd_config(&cli)?,
    }

    Ok(())
}
