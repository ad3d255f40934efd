mod config;
mod constants;
mod error;
mod routes;
mod server;
mod setup;
mod transforms;

use clap::Parser;
use config::Config;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const GIT_HASH: &str = env!("GIT_HASH");
pub const BUILD_TIME: &str = env!("BUILD_TIME");
pub const BUILD_PROFILE: &str = env!("BUILD_PROFILE");

#[derive(Parser)]
#[command(name = "claude-oc-proxy")]
#[command(about = "Tool name prefixing proxy for Claude API")]
#[command(version)]
#[command(after_help = "\
MANUAL SETUP:
  1. Install cli-proxy-api:
     macOS:  brew install cliproxyapi
     Linux:  curl -fsSL https://raw.githubusercontent.com/brokechubb/cliproxyapi-installer/refs/heads/master/cliproxyapi-installer | bash

  2. Authenticate: cli-proxy-api -claude-login

  3. Start stack:
     Terminal 1: cli-proxy-api
     Terminal 2: claude-oc-proxy

  Endpoint: http://localhost:8318/v1")]
struct Args {
    /// Port to listen on (default: 8318)
    #[arg(short, long, env = "CLAUDE_OC_PROXY_PORT")]
    port: Option<u16>,

    /// Upstream API URL (default: http://localhost:8317)
    #[arg(short, long, env = "CLAUDE_OC_PROXY_UPSTREAM")]
    upstream: Option<String>,

    /// Host to bind to (default: 0.0.0.0)
    #[arg(short = 'H', long, env = "CLAUDE_OC_PROXY_HOST")]
    host: Option<String>,

    /// Interactive setup (install cli-proxy-api, OAuth, start stack)
    #[arg(short, long)]
    setup: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // `.env` values become process env before clap reads `CLAUDE_OC_PROXY_*`
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let config = match Config::resolve(args.host, args.port, args.upstream) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    info!(
        "Starting claude-oc-proxy v{}-{} ({} build, {})",
        VERSION, GIT_HASH, BUILD_PROFILE, BUILD_TIME
    );

    let result = if args.setup {
        setup::run_setup(&config).await.map_err(|e| e.to_string())
    } else {
        server::start_proxy(&config).await.map_err(|e| e.to_string())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
