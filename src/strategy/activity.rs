use crate::constants::ACTIVITY_LOG_CAPACITY;
use chrono::{DateTime, Local};
use std::collections::VecDeque;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.message
        )
    }
}

/// Bounded event history, newest entry first.
#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    appended: u64,
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::with_capacity(ACTIVITY_LOG_CAPACITY)
    }
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// A zero capacity is raised to one so the latest entry is always kept.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            appended: 0,
        }
    }

    /// Prepends a timestamped entry and drops the oldest ones beyond capacity.
    pub fn append(&mut self, message: impl Into<String>) -> &LogEntry {
        self.entries.push_front(LogEntry {
            timestamp: Local::now(),
            message: message.into(),
        });
        self.entries.truncate(self.capacity);
        self.appended += 1;
        &self.entries[0]
    }

    pub fn entries(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    /// Formatted entries, newest first.
    pub fn lines(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.to_string()).collect()
    }

    /// Entries appended since creation, including those already dropped.
    pub fn total_appended(&self) -> u64 {
        self.appended
    }

    /// Entries appended after the caller last saw `seen` total appends, newest first.
    pub fn since(&self, seen: u64) -> impl Iterator<Item = &LogEntry> {
        let fresh = self.appended.saturating_sub(seen).min(self.entries.len() as u64);
        self.entries.iter().take(fresh as usize)
    }

    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_newest_first() {
        let mut log = ActivityLog::new();
        log.append("first");
        log.append("second");

        let messages: Vec<&str> = log.entries().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "first"]);
        assert_eq!(log.latest().unwrap().message, "second");
    }

    #[test]
    fn test_capped_at_capacity() {
        let mut log = ActivityLog::new();
        for i in 0..250 {
            log.append(format!("event {}", i));
            assert!(log.len() <= ACTIVITY_LOG_CAPACITY);
            assert_eq!(log.latest().unwrap().message, format!("event {}", i));
        }
        assert_eq!(log.len(), 100);
        // Oldest surviving entry is #150
        assert_eq!(log.entries().last().unwrap().message, "event 150");
    }

    #[test]
    fn test_zero_capacity_keeps_latest() {
        let mut log = ActivityLog::with_capacity(0);
        assert_eq!(log.append("only").message, "only");
        assert_eq!(log.append("newer").message, "newer");
        assert_eq!(log.len(), 1);
        assert_eq!(log.total_appended(), 2);
    }

    #[test]
    fn test_since_returns_only_new_entries() {
        let mut log = ActivityLog::with_capacity(3);
        log.append("a");
        let seen = log.total_appended();
        log.append("b");
        log.append("c");

        let fresh: Vec<&str> = log.since(seen).map(|e| e.message.as_str()).collect();
        assert_eq!(fresh, vec!["c", "b"]);

        // More appends than capacity: bounded by what is still held
        for m in ["d", "e", "f", "g"] {
            log.append(m);
        }
        assert_eq!(log.since(seen).count(), 3);
        assert_eq!(log.since(log.total_appended()).count(), 0);
    }

    #[test]
    fn test_line_format() {
        let mut log = ActivityLog::new();
        log.append("hello");
        let line = &log.lines()[0];
        assert!(line.starts_with('['));
        assert!(line.ends_with("] hello"));
        // "[YYYY-MM-DD HH:MM:SS] " prefix
        assert_eq!(line.find(']'), Some(20));
    }
}
