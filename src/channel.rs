//! A single bounded channel: a message queue plus its two waiter FIFOs.
//!
//! A `crossbeam_queue::ArrayQueue` backs the message queue; `push`/`pop`
//! each pair a queue operation with a single targeted wakeup. Waiter lists
//! live behind a plain `RefCell<WaitQueue>` rather than any lock, since the
//! bus that owns these channels never runs on more than one OS thread.

use std::cell::RefCell;

use crossbeam_queue::ArrayQueue;

use crate::waiter::{Waiter, WaitQueue};

/// A bounded FIFO of `u64` messages with its own send- and recv-waiter
/// queues.
///
/// `capacity` is stored verbatim and must be strictly positive: a capacity
/// of 0 is rejected at construction (see `DESIGN.md`): the underlying
/// `ArrayQueue` panics on 0 anyway, so silently coercing it would just
/// move the panic elsewhere.
pub(crate) struct Channel {
    messages: ArrayQueue<u64>,
    senders_waiting: RefCell<WaitQueue>,
    receivers_waiting: RefCell<WaitQueue>,
}

impl Channel {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "channel capacity must be strictly positive");
        Self {
            messages: ArrayQueue::new(capacity),
            senders_waiting: RefCell::new(WaitQueue::new()),
            receivers_waiting: RefCell::new(WaitQueue::new()),
        }
    }

    pub fn capacity(&self) -> usize {
        self.messages.capacity()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn has_space(&self) -> bool {
        !self.messages.is_full()
    }

    pub fn has_message(&self) -> bool {
        !self.messages.is_empty()
    }

    /// Register `waiter` on the send-waiter queue. Caller must have already
    /// confirmed `!has_space()`.
    pub fn push_sender_waiter(&self, waiter: Waiter) {
        self.senders_waiting.borrow_mut().push(waiter);
    }

    /// Register `waiter` on the recv-waiter queue. Caller must have already
    /// confirmed `!has_message()`.
    pub fn push_receiver_waiter(&self, waiter: Waiter) {
        self.receivers_waiting.borrow_mut().push(waiter);
    }

    /// Append `m`, waking one receiver if any is waiting.
    ///
    /// Precondition: `has_space()` held when the caller checked. Returns
    /// `Err(m)` if the queue turned out to be full (defensive; the bus's
    /// public operations never call this without checking first).
    pub fn push_and_notify(&self, m: u64) -> Result<(), u64> {
        self.messages.push(m)?;
        self.receivers_waiting.borrow_mut().wake_one();
        Ok(())
    }

    /// Remove the head message, waking one sender if any is waiting.
    ///
    /// Returns `(message, sender_was_woken)`. `sender_was_woken == false`
    /// is the signal the bus uses to fall back to waking a broadcast
    /// waiter instead: that queue lives on the bus, not the channel, so
    /// the cascade itself is the bus's responsibility.
    pub fn pop_and_notify(&self) -> Option<(u64, bool)> {
        let m = self.messages.pop()?;
        let woke_sender = self.senders_waiting.borrow_mut().wake_one();
        Some((m, woke_sender))
    }

    /// Drain and wake every waiter on both queues. Used by `close`.
    pub fn wake_all_waiters(&self) {
        self.senders_waiting.borrow_mut().wake_all();
        self.receivers_waiting.borrow_mut().wake_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respects_capacity() {
        let c = Channel::new(2);
        assert!(c.has_space());
        assert!(!c.has_message());
        c.push_and_notify(1).unwrap();
        c.push_and_notify(2).unwrap();
        assert_eq!(c.len(), 2);
        assert!(!c.has_space());
        assert!(c.push_and_notify(3).is_err());
    }

    #[test]
    fn fifo_message_order() {
        let c = Channel::new(4);
        for v in [10, 11, 12] {
            c.push_and_notify(v).unwrap();
        }
        assert_eq!(c.pop_and_notify().unwrap().0, 10);
        assert_eq!(c.pop_and_notify().unwrap().0, 11);
        assert_eq!(c.pop_and_notify().unwrap().0, 12);
        assert!(c.pop_and_notify().is_none());
    }

    #[test]
    #[should_panic]
    fn rejects_zero_capacity() {
        Channel::new(0);
    }
}
