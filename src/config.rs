//! Command line and environment configuration
//!
//! Every flag can also come from an `IPBEACON_*` environment variable, and a
//! `.env` file in the working directory is loaded before parsing.

use crate::collector::CollectorConfig;
use crate::reporter::ReporterConfig;
use clap::{ArgAction, Parser, ValueEnum};
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 9404;
pub const DEFAULT_LISTEN_HOST: &str = "0.0.0.0";

const EXAMPLES: &str = "\
Examples:
  ipbeacon -m client -h 192.168.2.3 -L /var/log/ipbeacon.client.log
  ipbeacon -m server -P /var/run/ipbeacon.pid -L /var/log/ipbeacon.server.log";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Report this machine's address to a collector
    #[value(alias = "reporter")]
    Client,
    /// Collect and serve address history
    #[value(alias = "collector")]
    Server,
}

/// `-h` is the host, so the built-in help/version flags are replaced by
/// long-only `--help` / `--version`.
#[derive(Debug, Parser)]
#[command(
    name = "ipbeacon",
    version,
    about = "Report a machine's gateway address to a collector, or collect and serve it",
    disable_help_flag = true,
    disable_version_flag = true,
    after_help = EXAMPLES
)]
pub struct Cli {
    /// Run as a server (collector) or client (reporter)
    #[arg(short = 'm', long = "mode", env = "IPBEACON_MODE", value_enum)]
    pub mode: Mode,

    /// Server: listen address (default 0.0.0.0). Client: collector address
    #[arg(short = 'h', long = "host", env = "IPBEACON_HOST")]
    pub host: Option<String>,

    /// Server: listen port. Client: collector port
    #[arg(short = 'p', long = "port", env = "IPBEACON_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Append logs to this file instead of stderr
    #[arg(short = 'L', long = "log-file", env = "IPBEACON_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Pid file written by the server while it runs
    #[arg(short = 'P', long = "pid-file", env = "IPBEACON_PID_FILE")]
    pub pid_file: Option<PathBuf>,

    /// Stay attached to the terminal instead of daemonizing
    #[arg(long, env = "IPBEACON_FOREGROUND")]
    pub foreground: bool,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Print version
    #[arg(long, action = ArgAction::Version)]
    version: Option<bool>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("client mode requires the collector host (-h)")]
    MissingHost,
}

/// Typed configuration for the selected role
#[derive(Debug, Clone)]
pub enum RoleConfig {
    Collector(CollectorConfig),
    Reporter(ReporterConfig),
}

impl Cli {
    /// Resolve the arguments into the configuration of the selected role
    pub fn role(&self) -> Result<RoleConfig, ConfigError> {
        match self.mode {
            Mode::Server => {
                let host = self
                    .host
                    .clone()
                    .unwrap_or_else(|| DEFAULT_LISTEN_HOST.to_string());
                let mut config = CollectorConfig::new(host, self.port);
                if let Some(path) = &self.pid_file {
                    config = config.with_pid_file(path);
                }
                Ok(RoleConfig::Collector(config))
            }
            Mode::Client => {
                let host = self
                    .host
                    .clone()
                    .filter(|host| !host.trim().is_empty())
                    .ok_or(ConfigError::MissingHost)?;
                Ok(RoleConfig::Reporter(ReporterConfig::new(host, self.port)))
            }
        }
    }

    /// Log the effective options, one per line
    pub fn log_options(&self) {
        let display = |path: &Option<PathBuf>| {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        };

        log::info!("mode \t {:?}", self.mode);
        log::info!("host \t {}", self.host.as_deref().unwrap_or(""));
        log::info!("port \t {}", self.port);
        log::info!("logfile \t {}", display(&self.log_file));
        log::info!("pidfile \t {}", display(&self.pid_file));
        log::info!("foreground \t {}", self.foreground);

        if self.mode == Mode::Client && self.pid_file.is_some() {
            log::warn!("pid file is only written in server mode, ignoring");
        }
    }
}
