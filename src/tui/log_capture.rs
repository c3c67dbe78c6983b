//! Activity log for TUI mode
//!
//! tracing-subscriber writes into a shared ring buffer instead of stderr so
//! log output never lands on the alternate screen. The Activity tab drains
//! it on every loop iteration.

use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};

use tracing_subscriber::fmt::MakeWriter;

/// Lines kept before the oldest are dropped.
const CAPACITY: usize = 500;

/// Shared buffer of complete log lines.
#[derive(Clone, Default)]
pub struct ActivityLog {
    lines: Arc<Mutex<VecDeque<String>>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a line, evicting the oldest at capacity.
    pub fn push(&self, line: String) {
        // A poisoned lock still holds usable lines.
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        if lines.len() >= CAPACITY {
            lines.pop_front();
        }
        lines.push_back(line);
    }

    /// Take every buffered line, oldest first.
    pub fn drain(&self) -> Vec<String> {
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.drain(..).collect()
    }
}

/// Per-event writer; splits output into lines.
pub struct LineWriter {
    log: ActivityLog,
    partial: Vec<u8>,
}

impl LineWriter {
    fn emit_complete(&mut self) {
        while let Some(pos) = self.partial.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.partial.drain(..=pos).collect();
            self.log
                .push(String::from_utf8_lossy(&line[..pos]).trim_end().to_string());
        }
    }
}

impl Write for LineWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.partial.extend_from_slice(buf);
        self.emit_complete();
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        if !self.partial.is_empty() {
            let rest = std::mem::take(&mut self.partial);
            self.log.push(String::from_utf8_lossy(&rest).trim_end().to_string());
        }
        Ok(())
    }
}

impl Drop for LineWriter {
    fn drop(&mut self) {
        let _ = Write::flush(self);
    }
}

impl<'a> MakeWriter<'a> for ActivityLog {
    type Writer = LineWriter;

    fn make_writer(&'a self) -> Self::Writer {
        LineWriter {
            log: self.clone(),
            partial: Vec::new(),
        }
    }
}
