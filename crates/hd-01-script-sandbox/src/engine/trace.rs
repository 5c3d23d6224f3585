//! # Log Trace
//!
//! Ordered buffer behind the `log`, `print` and `debug` primitives. One
//! buffer per run; entries are never shared between runs.

use crate::engine::convert::log_field;
use parking_lot::Mutex;
use rhai::Dynamic;
use shared_types::LogEntry;
use std::sync::Arc;

/// Shared handle to the log entries of one run.
#[derive(Debug, Clone)]
pub struct LogBuffer {
    label: Arc<str>,
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl LogBuffer {
    /// Creates an empty buffer tagging entries with `label`.
    #[must_use]
    pub fn new(label: &str) -> Self {
        Self {
            label: Arc::from(label),
            entries: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Appends one entry built from script values.
    pub fn record(&self, values: Vec<Dynamic>) {
        let fields = values.into_iter().map(log_field).collect();
        self.entries
            .lock()
            .push(LogEntry::new(self.label.as_ref(), fields));
    }

    /// Appends one entry holding a single text value.
    pub fn record_text(&self, text: &str) {
        let field = serde_json::Value::String(text.to_string()).to_string();
        self.entries
            .lock()
            .push(LogEntry::new(self.label.as_ref(), vec![field]));
    }

    /// Number of entries so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing was logged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Takes every entry, leaving the buffer empty.
    #[must_use]
    pub fn drain(&self) -> Vec<LogEntry> {
        std::mem::take(&mut *self.entries.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_order_and_label() {
        let buffer = LogBuffer::new("decoder");
        buffer.record(vec![Dynamic::from(1_i64)]);
        buffer.record_text("second");

        let entries = buffer.drain();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].function, "decoder");
        assert_eq!(entries[0].fields, vec!["1".to_string()]);
        assert_eq!(entries[1].fields, vec!["\"second\"".to_string()]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clones_share_entries() {
        let buffer = LogBuffer::new("encoder");
        let handle = buffer.clone();
        handle.record(vec![Dynamic::from("x".to_string()), Dynamic::UNIT]);
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.drain()[0].fields, vec!["\"x\"", "null"]);
    }
}
