//! The conversation log: every entry ever broadcast, in broadcast order.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only, thread-safe log of conversation entries.
///
/// Entries are never edited or removed. The order of `append` calls, as
/// serialized by the internal lock, is the only order that matters.
#[derive(Debug, Default)]
pub struct ConversationLog {
    entries: Mutex<Vec<String>>,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry to the end of the conversation.
    pub fn append(&self, entry: impl Into<String>) {
        self.entries().push(entry.into());
    }

    /// Copy of all entries, oldest first.
    ///
    /// Later appends do not affect a snapshot that was already taken.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries().clone()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    // A panic while holding the lock cannot leave a Vec half-pushed, so the
    // poisoned data is still a valid log.
    fn entries(&self) -> MutexGuard<'_, Vec<String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
