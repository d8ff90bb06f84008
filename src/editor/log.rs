/// Execution log sink
///
/// Holds the entries and status of the most recent run. A new run wipes the previous
/// buffer before the request goes out, so stale results are never shown alongside a
/// run in progress.

use crate::workflow::types::{ExecutionReport, LogEntry, LogLevel, RunOutcome};

/// Message used when a failure carries no text of its own
const FALLBACK_FAILURE_MESSAGE: &str = "Workflow execution failed";

/// Status of the editor's current or last run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunStatus {
    #[default]
    Idle,
    Running,
    Success,
    Error,
}

impl RunStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RunStatus::Idle => "idle",
            RunStatus::Running => "running",
            RunStatus::Success => "success",
            RunStatus::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionLog {
    /// Idle until the first run, then the status of the latest one
    status: RunStatus,
    /// Summary message reported with the run outcome
    message: Option<String>,
    /// Entries of the latest run, oldest first
    entries: Vec<LogEntry>,
}

impl ExecutionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> RunStatus {
        self.status
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_running(&self) -> bool {
        self.status == RunStatus::Running
    }

    /// Start a run: clear the buffer and flip to running
    pub fn begin(&mut self) {
        self.status = RunStatus::Running;
        self.message = None;
        self.entries.clear();
    }

    /// Append an entry to the current run
    pub fn push(&mut self, entry: LogEntry) {
        self.entries.push(entry);
    }

    /// Finish with the service's report, replacing the buffer wholesale
    pub fn complete(&mut self, report: ExecutionReport) {
        self.status = match report.status {
            RunOutcome::Success => RunStatus::Success,
            RunOutcome::Failure => RunStatus::Error,
        };
        self.message = Some(report.message).filter(|m| !m.is_empty());
        self.entries = report.logs;
    }

    /// Finish after the request itself failed
    ///
    /// Leaves exactly one synthesized error entry stamped with the current time.
    pub fn fail(&mut self, message: impl Into<String>) {
        let mut message = message.into();
        if message.trim().is_empty() {
            message = FALLBACK_FAILURE_MESSAGE.to_string();
        }

        self.status = RunStatus::Error;
        self.entries = vec![LogEntry::now(LogLevel::Error, message.clone())];
        self.message = Some(message);
    }

    /// One display line per entry: `[HH:MM:SS] LEVEL message`
    pub fn render(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| {
                let level = match entry.level {
                    LogLevel::Info => "INFO",
                    LogLevel::Warn => "WARN",
                    LogLevel::Error => "ERROR",
                };
                format!("[{}] {:<5} {}", entry.time.format("%H:%M:%S"), level, entry.message)
            })
            .collect()
    }
}
