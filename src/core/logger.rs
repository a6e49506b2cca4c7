//! Minimal logging facility with a hook chain

use super::{
    error::Result,
    formatter::{Formatter, JsonFormatter},
    hook::Hook,
    log_context::Fields,
    log_entry::LogEntry,
    log_level::LogLevel,
};
use parking_lot::{Mutex, RwLock};
use std::io::Write;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Sink the logger writes every emitted entry to, after the hook chain
struct Output {
    writer: Box<dyn Write + Send>,
    formatter: Box<dyn Formatter>,
}

/// Logger that dispatches entries through registered hooks
///
/// Entries below the minimum level are discarded. Every other entry is
/// fired, in registration order, through each hook whose `levels()`
/// contains the entry's level, then written to the output sink if one is
/// configured. Hook failures never reach the caller; they are reported on
/// stderr and counted.
///
/// `panic` and `fatal` only describe severity here: logging at those
/// levels neither panics nor exits the process.
pub struct Logger {
    min_level: LogLevel,
    hooks: RwLock<Vec<Arc<dyn Hook>>>,
    output: Mutex<Option<Output>>,
    hook_failures: AtomicU64,
}

impl Logger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            hooks: RwLock::new(Vec::new()),
            output: Mutex::new(None),
            hook_failures: AtomicU64::new(0),
        }
    }

    pub fn add_hook(&mut self, hook: Arc<dyn Hook>) {
        self.hooks.write().push(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    pub fn set_min_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    pub fn min_level(&self) -> LogLevel {
        self.min_level
    }

    /// Write every emitted entry to `writer` using `formatter`
    pub fn set_output(&mut self, writer: Box<dyn Write + Send>, formatter: Box<dyn Formatter>) {
        *self.output.lock() = Some(Output { writer, formatter });
    }

    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(LogEntry::new(level, message));
    }

    pub fn log_with_fields(&self, level: LogLevel, message: impl Into<String>, fields: Fields) {
        if !self.is_enabled(level) {
            return;
        }
        self.dispatch(LogEntry::new(level, message).with_fields(fields));
    }

    /// Run an entry through the hook chain and the output sink
    ///
    /// Returns the entry as the last hook left it. The minimum level is not
    /// consulted; `log` and friends filter before calling this.
    pub fn dispatch(&self, mut entry: LogEntry) -> LogEntry {
        // Snapshot so a hook that logs does not re-enter the lock
        let hooks: Vec<Arc<dyn Hook>> = self.hooks.read().clone();

        for (idx, hook) in hooks.iter().enumerate() {
            if !hook.levels().contains(&entry.level) {
                continue;
            }
            self.fire_hook(idx, hook.as_ref(), &mut entry);
        }

        self.write_output(&entry);
        entry
    }

    /// Fire one hook with panic isolation
    fn fire_hook(&self, idx: usize, hook: &dyn Hook, entry: &mut LogEntry) {
        let fire_result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| hook.fire(entry)));

        match fire_result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                self.hook_failures.fetch_add(1, Ordering::Relaxed);
                eprintln!("[LOGGER ERROR] Failed to fire hook #{}: {}", idx, e);
            }
            Err(panic_info) => {
                self.hook_failures.fetch_add(1, Ordering::Relaxed);
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                eprintln!(
                    "[LOGGER CRITICAL] Hook #{} panicked: {}. \
                     Other hooks continue to function.",
                    idx, panic_msg
                );
            }
        }
    }

    fn write_output(&self, entry: &LogEntry) {
        let mut guard = self.output.lock();
        let Some(output) = guard.as_mut() else {
            return;
        };

        let result = output
            .formatter
            .format(entry)
            .and_then(|bytes| output.writer.write_all(&bytes).map_err(Into::into));
        if let Err(e) = result {
            eprintln!("[LOGGER ERROR] Failed to write entry: {}", e);
        }
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(output) = self.output.lock().as_mut() {
            output.writer.flush()?;
        }
        Ok(())
    }

    /// Number of hook invocations that returned an error or panicked
    pub fn hook_failure_count(&self) -> u64 {
        self.hook_failures.load(Ordering::Relaxed)
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    pub fn fatal(&self, message: impl Into<String>) {
        self.log(LogLevel::Fatal, message);
    }

    pub fn panic(&self, message: impl Into<String>) {
        self.log(LogLevel::Panic, message);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Logger {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// Builder for creating a Logger with fluent API
///
/// # Example
///
/// ```
/// use log_forwarder::{JsonFormatter, LogLevel, Logger};
///
/// let logger = Logger::builder()
///     .min_level(LogLevel::Debug)
///     .output(std::io::sink(), JsonFormatter::new())
///     .build();
/// assert_eq!(logger.min_level(), LogLevel::Debug);
/// ```
pub struct LoggerBuilder {
    min_level: LogLevel,
    hooks: Vec<Arc<dyn Hook>>,
    output: Option<Output>,
}

impl LoggerBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            min_level: LogLevel::Info,
            hooks: Vec::new(),
            output: None,
        }
    }

    #[must_use]
    pub fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    #[must_use]
    pub fn hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    #[must_use]
    pub fn output<W, F>(mut self, writer: W, formatter: F) -> Self
    where
        W: Write + Send + 'static,
        F: Formatter + 'static,
    {
        self.output = Some(Output {
            writer: Box::new(writer),
            formatter: Box::new(formatter),
        });
        self
    }

    /// Write to stderr as JSON
    #[must_use]
    pub fn stderr(self) -> Self {
        self.output(std::io::stderr(), JsonFormatter::new())
    }

    #[must_use]
    pub fn build(self) -> Logger {
        Logger {
            min_level: self.min_level,
            hooks: RwLock::new(self.hooks),
            output: Mutex::new(self.output),
            hook_failures: AtomicU64::new(0),
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }
}
