//! Latest-wins mailbox
//!
//! Single slot shared between a producer thread and the tick loop. Posting
//! overwrites whatever has not been taken yet.

use std::sync::Arc;

use parking_lot::Mutex;

/// Single-slot, latest-wins handoff. Clones share the slot.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Arc<Mutex<Option<T>>>,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
        }
    }

    /// Store `value`, returning the undelivered value it replaced
    pub fn post(&self, value: T) -> Option<T> {
        self.slot.lock().replace(value)
    }

    /// Take the latest value, leaving the slot empty
    pub fn take(&self) -> Option<T> {
        self.slot.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}
