use std::sync::Mutex;

pub const LOG_PREFIX: &str = "[buildpulse]";

/// Human readable progress lines shown in the CI job console. Not to be
/// confused with `tracing` output, which is for operators.
pub trait BuildLog: Send + Sync {
    fn line(&self, message: &str);
}

/// Writes progress lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLog;

impl BuildLog for StderrLog {
    fn line(&self, message: &str) {
        eprintln!("{LOG_PREFIX} {message}");
    }
}

/// Keeps every line in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl BuildLog for RecordingLog {
    fn line(&self, message: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(format!("{LOG_PREFIX} {message}"));
        }
    }
}
