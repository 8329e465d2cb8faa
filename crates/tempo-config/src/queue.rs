//! Offline mutation queue configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

const fn default_capacity() -> usize {
    500
}

const fn default_base_delay_ms() -> u64 {
    500
}

const fn default_max_delay_ms() -> u64 {
    60_000
}

const fn default_max_rebase_attempts() -> u32 {
    3
}

fn default_journal_path() -> String {
    ".tempo/queue.jsonl".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Maximum number of queued mutations across all sessions.
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// First retry delay after a transient failure.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Backoff is capped here.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// How many times a write rebases onto a newer remote version before the
    /// conflict is treated as transient.
    #[serde(default = "default_max_rebase_attempts")]
    pub max_rebase_attempts: u32,

    /// JSONL file the queue is persisted to. Empty disables persistence.
    #[serde(default = "default_journal_path")]
    pub journal_path: String,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_rebase_attempts: default_max_rebase_attempts(),
            journal_path: default_journal_path(),
        }
    }
}

impl QueueConfig {
    #[must_use]
    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    #[must_use]
    pub fn journal(&self) -> Option<PathBuf> {
        (!self.journal_path.is_empty()).then(|| PathBuf::from(&self.journal_path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_correct() {
        let config = QueueConfig::default();
        assert_eq!(config.capacity, 500);
        assert_eq!(config.base_delay(), Duration::from_millis(500));
        assert_eq!(config.max_delay(), Duration::from_secs(60));
        assert_eq!(config.max_rebase_attempts, 3);
        assert_eq!(config.journal(), Some(PathBuf::from(".tempo/queue.jsonl")));
    }

    #[test]
    fn empty_journal_path_disables_persistence() {
        let config = QueueConfig {
            journal_path: String::new(),
            ..Default::default()
        };
        assert!(config.journal().is_none());
    }
}
