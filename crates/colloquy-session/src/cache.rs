// Bounded local log of exchanged turns.
// The remote thread stays authoritative; this is a best-effort mirror for
// offline review and for the plain-chat context window.

use colloquy_llm::{Role, ThreadMessage};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

pub const DEFAULT_CACHE_WINDOW: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub role: Role,
    pub content: String,
    /// Monotonic position of the turn since the last reset
    pub sequence: u64,
}

#[derive(Debug, Clone)]
pub struct ConversationCache {
    window: usize,
    entries: VecDeque<CacheEntry>,
    next_sequence: u64,
}

impl ConversationCache {
    /// Create a cache holding at most `window` entries (at least one).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            window,
            entries: VecDeque::with_capacity(window),
            next_sequence: 0,
        }
    }

    /// Append a turn, evicting the oldest entry when the window is full
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        if self.entries.len() == self.window {
            if let Some(evicted) = self.entries.pop_front() {
                tracing::trace!(sequence = evicted.sequence, "evicted cache entry");
            }
        }

        self.entries.push_back(CacheEntry {
            role,
            content: content.into(),
            sequence: self.next_sequence,
        });
        self.next_sequence += 1;
    }

    /// Entries from oldest to newest
    pub fn entries(&self) -> impl Iterator<Item = &CacheEntry> + Clone + '_ {
        self.entries.iter()
    }

    pub fn last(&self) -> Option<&CacheEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn window(&self) -> usize {
        self.window
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.next_sequence = 0;
    }

    /// Replace the contents with the tail of a remote history.
    ///
    /// `history` is newest-first, as the service returns it.
    pub fn rebuild_from(&mut self, history: &[ThreadMessage]) {
        self.reset();
        for message in history.iter().rev() {
            self.append(message.role, message.text());
        }
    }
}

impl Default for ConversationCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_WINDOW)
    }
}

impl fmt::Display for ConversationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}: {}", entry.role, entry.content)?;
        }
        Ok(())
    }
}
