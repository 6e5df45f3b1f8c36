//! Destinations for formatted log lines.

use std::io::Write;
use std::sync::Mutex;

/// Receives one pre-formatted line (newline included) per event.
pub trait LogSink: Send + Sync {
    /// Write a line to the sink.
    fn write_line(&self, line: &str);
}

/// Writes lines to stderr, keeping stdout free for command output.
#[derive(Debug, Default)]
pub struct StderrLogSink;

impl LogSink for StderrLogSink {
    fn write_line(&self, line: &str) {
        let mut stderr = std::io::stderr().lock();
        if let Err(error) = stderr.write_all(line.as_bytes()) {
            eprintln!("log sink write failed: {error}");
        }
    }
}

/// Collects lines in memory; lets tests assert on emitted events.
#[derive(Debug, Default)]
pub struct MemoryLogSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryLogSink {
    /// Drain the collected lines.
    pub fn take(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|mut lines| std::mem::take(&mut *lines))
            .unwrap_or_default()
    }
}

impl LogSink for MemoryLogSink {
    fn write_line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_drains_in_order() {
        let sink = MemoryLogSink::default();
        sink.write_line("first\n");
        sink.write_line("second\n");

        assert_eq!(sink.take(), vec!["first\n".to_owned(), "second\n".to_owned()]);
        assert!(sink.take().is_empty());
    }
}
