pub mod assign;
pub mod config;
pub mod envelope;
pub mod errors;
pub mod github;
pub mod linker;
pub mod preview;
pub mod requests;
pub mod server;
pub mod status;
pub mod types;

use clap::error::ErrorKind;
use clap::Parser;
use config::{env_from_os, load_config, CliOverrides, EnvMap, StewardConfig};
use errors::StewardError;
use server::AppState;
use std::net::SocketAddr;

#[derive(Debug, Clone, Parser)]
#[command(name = "steward")]
#[command(about = "Brokers admin-panel change requests to the Copilot coding agent on GitHub")]
pub struct Cli {
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,
    #[arg(long)]
    pub bind: Option<String>,
    #[arg(long)]
    pub admin_origin: Option<String>,
    #[arg(long, default_value_t = false)]
    pub check_config: bool,
}

pub fn run() -> Result<i32, StewardError> {
    let args = std::env::args_os().collect::<Vec<_>>();
    let vars = std::env::vars_os().collect::<Vec<_>>();
    let cwd = std::env::current_dir().map_err(|e| StewardError::Io(e.to_string()))?;
    run_with(&args, &env_from_os(&vars), &cwd)
}

pub fn run_with(
    args: &[std::ffi::OsString],
    env: &EnvMap,
    cwd: &std::path::Path,
) -> Result<i32, StewardError> {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => match error.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{error}");
                return Ok(0);
            }
            _ => return Err(StewardError::Cli(error.to_string())),
        },
    };

    let overrides = CliOverrides {
        config_path: cli.config.clone(),
        bind: cli.bind.clone(),
        admin_origin: cli.admin_origin.clone(),
    };
    let config = load_config(&overrides, cwd, env)?;

    if cli.check_config {
        println!(
            "config ok: repo={}/{} bind={} preview_domain={}",
            config.owner, config.repo, config.bind, config.preview_domain
        );
        return Ok(0);
    }

    serve_app(config)?;
    Ok(0)
}

#[tokio::main]
async fn serve_app(config: StewardConfig) -> Result<(), StewardError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let addr: SocketAddr = config
        .bind
        .parse()
        .map_err(|e| StewardError::Config(format!("bind address '{}' is invalid: {e}", config.bind)))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| StewardError::Io(e.to_string()))?;
    tracing::info!(
        addr = %addr,
        repo = %format!("{}/{}", config.owner, config.repo),
        "steward listening"
    );

    server::serve(AppState::new(config), listener).await
}
