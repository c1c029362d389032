//! Bounded buffer of the most recent raw log lines.

use std::collections::VecDeque;

/// Number of lines replayed above the failure banner.
pub const DEFAULT_RECENT_LINES: usize = 5;

/// Ring buffer holding the last `capacity` lines, oldest at the front.
#[derive(Debug, Clone)]
pub struct RecentLines {
    lines: VecDeque<String>,
    capacity: usize,
}

impl RecentLines {
    /// Create a buffer. A zero capacity is raised to one so the line that
    /// triggered a failure is always available for replay.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a line, evicting the oldest when full.
    pub fn push(&mut self, line: &str) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.trim_end_matches(['\n', '\r']).to_string());
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for RecentLines {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_LINES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_last_lines_in_order() {
        let mut recent = RecentLines::default();
        for i in 0..8 {
            recent.push(&format!("line {}\n", i));
        }
        let lines: Vec<&str> = recent.iter().collect();
        assert_eq!(lines, vec!["line 3", "line 4", "line 5", "line 6", "line 7"]);
    }

    #[test]
    fn test_partial_fill() {
        let mut recent = RecentLines::new(3);
        recent.push("a");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["a"]);
    }

    #[test]
    fn test_zero_capacity_keeps_one() {
        let mut recent = RecentLines::new(0);
        assert_eq!(recent.capacity(), 1);
        recent.push("first");
        recent.push("second\r\n");
        assert_eq!(recent.iter().collect::<Vec<_>>(), vec!["second"]);
    }
}
