//! Address-change ledger
//!
//! Ordered, append-only history of the addresses a reporter has been seen at.
//! Appending the address that is already current is a no-op, so two
//! consecutive entries never carry the same address.
//!
//! All reads and writes go through a single lock: HTTP handlers run
//! concurrently and every one of them touches the ledger.

use chrono::{DateTime, Local};
use parking_lot::RwLock;

/// Address the ledger is seeded with before any reporter has checked in
pub const SEED_ADDRESS: &str = "127.0.0.1";

/// Clock format used when rendering `observed_at`
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One observed address transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub address: String,
    pub observed_at: DateTime<Local>,
}

impl LedgerEntry {
    fn now(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            observed_at: Local::now(),
        }
    }

    /// Observation time as a fixed calendar/clock string
    pub fn formatted_time(&self) -> String {
        self.observed_at.format(TIME_FORMAT).to_string()
    }
}

/// Rendered history row: `(address, formatted time)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLine {
    pub address: String,
    pub observed_at: String,
}

/// Consistent view of the ledger taken under a single read lock
#[derive(Debug, Clone)]
pub struct LedgerSnapshot {
    pub current: String,
    /// Newest first
    pub history: Vec<HistoryLine>,
}

/// Deduplicating address history
///
/// Never empty: construction seeds it with a sentinel entry.
#[derive(Debug)]
pub struct Ledger {
    entries: RwLock<Vec<LedgerEntry>>,
}

impl Ledger {
    /// Create a ledger seeded with `seed` as its first entry
    pub fn new(seed: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(vec![LedgerEntry::now(seed)]),
        }
    }

    /// Record `address` if it differs from the current one
    ///
    /// Returns `true` when a new entry was appended. Addresses are opaque
    /// strings; empty or malformed values are stored as given.
    pub fn append(&self, address: &str) -> bool {
        let mut entries = self.entries.write();

        if entries.last().is_some_and(|last| last.address == address) {
            return false;
        }

        entries.push(LedgerEntry::now(address));
        true
    }

    /// Address of the most recent entry
    pub fn current_address(&self) -> String {
        let entries = self.entries.read();
        entries
            .last()
            .map(|entry| entry.address.clone())
            .unwrap_or_default()
    }

    /// Full history, most recent first
    pub fn history(&self) -> Vec<HistoryLine> {
        let entries = self.entries.read();
        Self::render_history(&entries)
    }

    /// Current address and history read under one lock acquisition
    pub fn snapshot(&self) -> LedgerSnapshot {
        let entries = self.entries.read();
        LedgerSnapshot {
            current: entries
                .last()
                .map(|entry| entry.address.clone())
                .unwrap_or_default(),
            history: Self::render_history(&entries),
        }
    }

    /// Raw entries in append order
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.entries.read().clone()
    }

    /// Number of entries, seed included
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Never true once constructed; the seed entry is always there
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn render_history(entries: &[LedgerEntry]) -> Vec<HistoryLine> {
        entries
            .iter()
            .rev()
            .map(|entry| HistoryLine {
                address: entry.address.clone(),
                observed_at: entry.formatted_time(),
            })
            .collect()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(SEED_ADDRESS)
    }
}
