//! ipbeacon: report a machine's address to a collector that keeps the
//! address-change history.
//!
//! - [`reporter`]: pushes a notification to the collector every 10 seconds
//! - [`collector`]: records the caller's address in a [`ledger::Ledger`] and
//!   serves the history as an HTML page
//! - [`lifecycle`]: the run / shutdown / completion contract both roles share
//!
//! The `ipbeacon` binary adds argument parsing, daemonizing, logging and
//! signal handling around these.

pub mod collector;
pub mod config;
pub mod daemon;
pub mod ledger;
pub mod lifecycle;
pub mod logging;
pub mod reporter;
pub mod signals;

pub use collector::{Collector, CollectorConfig, CollectorError};
pub use config::{Cli, Mode, RoleConfig};
pub use ledger::{Ledger, LedgerEntry, LedgerSnapshot};
pub use lifecycle::{completion_channel, supervise, LifecycleToken, Role};
pub use reporter::{Reporter, ReporterConfig, ReporterError};
