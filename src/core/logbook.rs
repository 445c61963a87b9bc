//! In-memory log aggregate.
//!
//! `Logbook` is a `simplelog` logger that keeps the most recent records as
//! `[HH:MM:SS] message` lines so the log viewer can show them without
//! reading the log file back.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use simplelog::{Config, SharedLogger};

pub const DEFAULT_CAPACITY: usize = 500;

#[derive(Clone)]
pub struct Logbook {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
    level: LevelFilter,
}

impl Default for Logbook {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, LevelFilter::Info)
    }
}

impl Logbook {
    pub fn new(capacity: usize, level: LevelFilter) -> Self {
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity.min(64)))),
            capacity: capacity.max(1),
            level,
        }
    }

    /// Appends a line, dropping the oldest one when full.
    pub fn push(&self, line: impl Into<String>) {
        let mut lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        if lines.len() == self.capacity {
            lines.pop_front();
        }
        lines.push_back(line.into());
    }

    /// All retained lines, oldest first, newline separated.
    pub fn contents(&self) -> String {
        let lines = self.lines.lock().unwrap_or_else(PoisonError::into_inner);
        lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Log for Logbook {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.push(format!(
            "[{}] {}",
            Local::now().format("%H:%M:%S"),
            record.args()
        ));
    }

    fn flush(&self) {}
}

impl SharedLogger for Logbook {
    fn level(&self) -> LevelFilter {
        self.level
    }

    fn config(&self) -> Option<&Config> {
        None
    }

    fn as_log(self: Box<Self>) -> Box<dyn Log> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Level;

    #[test]
    fn test_push_drops_oldest_when_full() {
        let logbook = Logbook::new(2, LevelFilter::Info);
        logbook.push("a");
        logbook.push("b");
        logbook.push("c");
        assert_eq!(logbook.contents(), "b\nc");
        assert_eq!(logbook.len(), 2);
    }

    #[test]
    fn test_records_below_level_are_ignored() {
        let logbook = Logbook::new(10, LevelFilter::Info);
        logbook.log(
            &Record::builder()
                .level(Level::Debug)
                .args(format_args!("noisy"))
                .build(),
        );
        logbook.log(
            &Record::builder()
                .level(Level::Warn)
                .args(format_args!("Downloaded \"Romance Dawn\""))
                .build(),
        );
        let contents = logbook.contents();
        assert!(!contents.contains("noisy"));
        assert!(contents.ends_with("Downloaded \"Romance Dawn\""));
        assert!(contents.starts_with('['));
    }

    #[test]
    fn test_clones_share_lines() {
        let logbook = Logbook::default();
        logbook.clone().push("shared");
        assert!(!logbook.is_empty());
    }
}
