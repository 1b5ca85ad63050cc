use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusLevel {
    Info,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusEntry {
    pub at: DateTime<Utc>,
    pub level: StatusLevel,
    pub message: String,
}

/// Timestamped messages shown in the status area, oldest first.
#[derive(Debug, Clone, Serialize)]
pub struct StatusLog {
    #[serde(skip)]
    capacity: usize,
    entries: VecDeque<StatusEntry>,
}

impl StatusLog {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
        }
    }

    pub fn push(&mut self, level: StatusLevel, message: impl Into<String>) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(StatusEntry {
            at: Utc::now(),
            level,
            message: message.into(),
        });
    }

    pub fn latest(&self) -> Option<&StatusEntry> {
        self.entries.back()
    }

    pub fn entries(&self) -> impl Iterator<Item = &StatusEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
