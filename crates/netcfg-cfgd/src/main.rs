//! cfgd - remote shell responder
//!
//! Reads one execute request from stdin, runs it and writes the reply to
//! stdout. Logs go to stderr so they never mix with the reply. The exit
//! status is non-zero when any shell failed or the request could not be
//! served.

use clap::Parser;
use netcfg_cfgd::{respond, DryRunResponder};
use netcfg_common::{LocalResponder, RemoteExecutor};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Beluganos remote shell responder
#[derive(Parser, Debug)]
#[command(name = "cfgd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    /// Log every shell and run nothing
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    info!("--- Starting cfgd ---");

    let executor: &dyn RemoteExecutor = if args.dry_run {
        &DryRunResponder
    } else {
        &LocalResponder
    };

    match respond(executor, tokio::io::stdin(), tokio::io::stdout()).await {
        Ok(reply) if reply.error.is_none() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            error!("cfgd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();
}
