//! ncmd - configuration applier
//!
//! ```bash
//! # Apply an edit list
//! ncmd apply --edits /tmp/edits.json
//!
//! # Show what would run
//! ncmd apply --edits /tmp/edits.json --dry-run
//!
//! # Print the rendered gobgpd config
//! ncmd render gobgp --edits /tmp/edits.json
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use netcfg_common::{Command, CommandAction};
use netcfg_ncmd::{
    backup_plans, execute, executor, load_edits, Applier, ConfigTrees, NcmdConfig, RenderTarget,
    DEFAULT_CONFIG_PATH,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Beluganos configuration applier
#[derive(Parser, Debug)]
#[command(name = "ncmd")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log level (debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Apply an edit list
    Apply {
        /// JSON edit list
        #[arg(short = 'e', long)]
        edits: PathBuf,

        /// Report every step and run nothing
        #[arg(long)]
        dry_run: bool,
    },
    /// Print one emitter's output for an edit list
    Render {
        #[arg(value_enum)]
        target: RenderTarget,

        /// JSON edit list
        #[arg(short = 'e', long)]
        edits: PathBuf,
    },
    /// Print the backup, rollback and commit steps of every managed file
    Plans,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_level);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("ncmd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = NcmdConfig::load_or_default(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    config.validate().context("invalid configuration")?;

    match args.command {
        Cmd::Apply { edits, dry_run } => {
            info!("--- Starting ncmd ---");
            config.executor.dry_run |= dry_run;

            let applier = process(&edits)?;
            let mut seq = applier
                .commands(&config, executor(&config.executor))
                .context("failed to build commands")?;
            if seq.is_empty() {
                info!("Nothing to apply");
                return Ok(());
            }
            execute(&mut seq).await.context("apply failed")?;
        }
        Cmd::Render { target, edits } => {
            for line in process(&edits)?.render(target, &config) {
                println!("{}", line);
            }
        }
        Cmd::Plans => {
            for (slot, plan) in backup_plans(&config) {
                let cmd = plan.command();
                println!("[{:?}] {}", slot, plan.path());
                for action in [CommandAction::Do, CommandAction::Undo, CommandAction::End] {
                    println!("  {:<4} {}", action.to_string(), cmd.line(action));
                }
            }
        }
    }

    Ok(())
}

fn process(path: &Path) -> anyhow::Result<Applier> {
    let edits =
        load_edits(path).with_context(|| format!("failed to load edits {}", path.display()))?;
    info!(count = edits.len(), "Edits loaded");

    let trees = ConfigTrees::from_edits(&edits).context("failed to build config trees")?;
    let mut applier = Applier::new();
    applier.process(&trees).context("failed to process config trees")?;
    Ok(applier)
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
