//! Hook trait for observers plugged into the logger

use super::{error::Result, log_entry::LogEntry, log_level::LogLevel};

/// Observer fired by the [`Logger`](super::Logger) for every entry whose
/// level is in [`Hook::levels`].
///
/// `fire` receives the entry mutably and runs on the thread that emitted
/// the log. Whatever a hook writes into `entry.data` stays there: hooks
/// registered later, and the logger's output, see the enriched entry.
/// Implementations must be safe to fire concurrently.
pub trait Hook: Send + Sync {
    fn fire(&self, entry: &mut LogEntry) -> Result<()>;

    /// Levels this hook wants to receive
    fn levels(&self) -> Vec<LogLevel>;
}
