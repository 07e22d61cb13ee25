//! ipbeacon - gateway address reporter / collector
//!
//! Usage:
//!   ipbeacon -m server [-h 0.0.0.0] [-p 9404] [-P pidfile] [-L logfile]
//!   ipbeacon -m client -h <collector> [-p 9404] [-L logfile]
//!
//! The process daemonizes unless `--foreground` is given. SIGTERM, SIGINT and
//! SIGQUIT stop it; SIGHUP stops it and replaces the process with a fresh
//! copy started with the same arguments.

use clap::Parser;
use dotenv::dotenv;
use ipbeacon::config::{Cli, RoleConfig};
use ipbeacon::daemon;
use ipbeacon::lifecycle::{supervise, Role};
use ipbeacon::logging::{self, LogTarget};
use ipbeacon::signals::Signals;
use ipbeacon::{Collector, Reporter};
use log::{error, info};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    dotenv().ok();
    let cli = Cli::parse();

    let role_config = match cli.role() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let log_target = match LogTarget::open(cli.log_file.as_deref()) {
        Ok(target) => target,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    // Fork before the runtime spawns its worker threads
    if !cli.foreground {
        if let Err(e) = daemon::daemonize() {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    }

    logging::init(log_target);
    info!("🚀 Starting ipbeacon {}", env!("CARGO_PKG_VERSION"));
    cli.log_options();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("❌ Failed to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let reload = match runtime.block_on(drive(role_config)) {
        Ok(reload) => reload,
        Err(e) => {
            error!("❌ {}", e);
            return ExitCode::FAILURE;
        }
    };
    // Let any straggling tasks go before a possible re-exec
    drop(runtime);

    if reload {
        info!("restart now ...");
        let e = daemon::reexec();
        error!("❌ restart process failed: {}", e);
        return ExitCode::FAILURE;
    }

    info!("shutdown now...");
    info!("✅ shutdown ok.");
    ExitCode::SUCCESS
}

/// Run the configured role until a signal stops it
///
/// Returns `true` when the stop was a reload request.
async fn drive(config: RoleConfig) -> Result<bool, Box<dyn std::error::Error>> {
    let signals = Signals::register()?;

    let role: Arc<dyn Role> = match config {
        RoleConfig::Collector(config) => Arc::new(Collector::new(config)?),
        RoleConfig::Reporter(config) => Arc::new(Reporter::new(config)?),
    };

    let exit = supervise(role, signals.recv()).await?;

    Ok(exit.trigger.is_some_and(|trigger| trigger.is_reload()))
}
