//! Audit Harvester - incremental audit log collector
//!
//! This is the main entry point for the harvester daemon.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use audit::{Scheduler, Settings, ShutdownFlag, SystemClock, UreqTransport};
use clap::Parser;
use log::{error, info, warn};

mod cli;
mod logging;

use cli::Args;

fn main() -> ExitCode {
    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("audit-harvester: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    // Environment overrides must be in place before anything reads settings
    let env_loaded = config::load_env_file(&args.env_file)?;

    logging::init(Some(&args.log_file))?;
    info!("Audit harvester {} starting", env!("CARGO_PKG_VERSION"));
    if env_loaded {
        info!("Loaded environment from {}", args.env_file.display());
    }

    // Bootstrap config directory
    if let Err(e) = config::init() {
        warn!("Failed to initialize config directory: {}", e);
    }

    let mut settings = Settings::load(args.settings.as_deref()).context("Startup aborted")?;
    settings.restrict_sources(&args.sources);
    for line in settings.summary() {
        info!("{}", line);
    }

    let shutdown = ShutdownFlag::new();
    let handler_flag = shutdown.clone();
    ctrlc::set_handler(move || handler_flag.request())
        .context("Failed to install interrupt handler")?;

    let transport = Arc::new(UreqTransport::new(settings.oauth_token.clone()));
    let mut scheduler = Scheduler::new(settings, transport, Arc::new(SystemClock), shutdown);

    if args.once {
        let reports = scheduler.run_cycle();
        let caught_up = reports.iter().filter(|r| r.is_caught_up()).count();
        info!("Cycle finished: {} of {} sources caught up", caught_up, reports.len());
    } else {
        scheduler.run_forever();
    }

    log::logger().flush();
    Ok(())
}
