use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IntakeError;

use super::unified::FileFormat;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntakeSeverity {
    /// Informational event.
    Info,
    /// Rejected upload (empty or malformed file).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O failures).
    Critical,
}

/// Which intake operation produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeOperation {
    /// Full parse into a [`crate::types::FileInformation`].
    ExtractFileInformation,
    /// First-row header preview.
    PreviewHeaders,
}

/// Context about an intake attempt.
#[derive(Debug, Clone)]
pub struct IntakeContext {
    /// Original file name, if the upload carried one.
    pub file_name: Option<String>,
    /// Format the upload was parsed as.
    pub format: FileFormat,
    /// Operation performed.
    pub operation: IntakeOperation,
}

impl IntakeContext {
    fn file_label(&self) -> &str {
        self.file_name.as_deref().unwrap_or("<unnamed>")
    }
}

/// Minimal stats reported on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeStats {
    /// Number of headings found.
    pub headings: usize,
    /// Number of data rows (zero for header previews).
    pub total_records: usize,
}

/// Observer interface for intake outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IntakeObserver: Send + Sync {
    /// Called when parsing succeeds.
    fn on_success(&self, _ctx: &IntakeContext, _stats: IntakeStats) {}

    /// Called when parsing fails.
    fn on_failure(&self, _ctx: &IntakeContext, _severity: IntakeSeverity, _error: &IntakeError) {}

    /// Called when a failure meets the alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IntakeObserver>>,
}

impl CompositeObserver {
    pub fn new(observers: Vec<Arc<dyn IntakeObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IntakeObserver for CompositeObserver {
    fn on_success(&self, ctx: &IntakeContext, stats: IntakeStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_failure(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Emits intake events through `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IntakeObserver for TracingObserver {
    fn on_success(&self, ctx: &IntakeContext, stats: IntakeStats) {
        tracing::info!(
            file = ctx.file_label(),
            format = ?ctx.format,
            operation = ?ctx.operation,
            headings = stats.headings,
            total_records = stats.total_records,
            "upload parsed"
        );
    }

    fn on_failure(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        match severity {
            IntakeSeverity::Info | IntakeSeverity::Warning => tracing::warn!(
                file = ctx.file_label(),
                format = ?ctx.format,
                operation = ?ctx.operation,
                ?severity,
                %error,
                "upload rejected"
            ),
            IntakeSeverity::Error | IntakeSeverity::Critical => tracing::error!(
                file = ctx.file_label(),
                format = ?ctx.format,
                operation = ?ctx.operation,
                ?severity,
                %error,
                "upload parse failed"
            ),
        }
    }

    fn on_alert(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        tracing::error!(
            alert = true,
            file = ctx.file_label(),
            format = ?ctx.format,
            operation = ?ctx.operation,
            ?severity,
            %error,
            "upload intake alert"
        );
    }
}

/// Appends intake events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IntakeObserver for FileObserver {
    fn on_success(&self, ctx: &IntakeContext, stats: IntakeStats) {
        self.append_line(&format!(
            "{} ok op={:?} format={:?} file={} headings={} records={}",
            unix_ts(),
            ctx.operation,
            ctx.format,
            ctx.file_label(),
            stats.headings,
            stats.total_records
        ));
    }

    fn on_failure(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        self.append_line(&format!(
            "{} fail severity={:?} op={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.operation,
            ctx.format,
            ctx.file_label(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IntakeContext, severity: IntakeSeverity, error: &IntakeError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} op={:?} format={:?} file={} err={}",
            unix_ts(),
            severity,
            ctx.operation,
            ctx.format,
            ctx.file_label(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
