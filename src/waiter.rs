//! FIFO queues of suspended coroutines.
//!
//! A [`Waiter`] is the bus's view of a suspended coroutine: an opaque
//! [`Waker`] the bus stores but never inspects, only ever hands back to the
//! runtime via [`Waker::wake`]. [`WaitQueue`] is the `VecDeque`-backed FIFO
//! that [`crate::channel::Channel`] and [`crate::bus::Bus`] keep three of
//! each (send-waiters, recv-waiters, broadcast-waiters).
//!
//! Backed by a [`VecDeque`] popped from the front, so arrival order is
//! preserved: a `Vec` popped from the back would resume the most recently
//! suspended waiter first instead of the one that has been waiting longest.

use std::collections::VecDeque;
use std::task::Waker;

/// An opaque handle to a suspended coroutine.
///
/// Never dereferenced by the bus; `wake()` is the only operation performed
/// on it, mirroring the runtime collaborator's `resume(handle)` primitive.
pub type Waiter = Waker;

/// A strict FIFO of [`Waiter`]s.
#[derive(Default)]
pub struct WaitQueue {
    waiters: VecDeque<Waiter>,
}

impl WaitQueue {
    pub fn new() -> Self {
        Self {
            waiters: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.waiters.len()
    }

    /// Push a waiter handle to the tail of the queue.
    ///
    /// Pairs with the runtime's "suspend current" primitive: the caller is
    /// expected to have already arranged for the coroutine to be resumable
    /// through this exact handle before suspending.
    pub fn push(&mut self, waiter: Waiter) {
        self.waiters.push_back(waiter);
    }

    /// Pop the head of the queue and wake it, if any.
    ///
    /// Returns `true` if a waiter was woken, `false` if the queue was empty.
    pub fn wake_one(&mut self) -> bool {
        match self.waiters.pop_front() {
            Some(w) => {
                w.wake();
                true
            }
            None => false,
        }
    }

    /// Wake every waiter currently queued, draining the queue.
    pub fn wake_all(&mut self) {
        while self.wake_one() {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::task::Wake;

    struct CountingWaker(AtomicUsize);

    impl Wake for CountingWaker {
        fn wake(self: Arc<Self>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn counting_waker() -> (Arc<CountingWaker>, Waker) {
        let w = Arc::new(CountingWaker(AtomicUsize::new(0)));
        let waker: Waker = w.clone().into();
        (w, waker)
    }

    #[test]
    fn wakes_in_fifo_order() {
        let mut q = WaitQueue::new();
        let (a_cnt, a) = counting_waker();
        let (b_cnt, b) = counting_waker();
        q.push(a);
        q.push(b);

        assert!(q.wake_one());
        assert_eq!(a_cnt.0.load(Ordering::SeqCst), 1);
        assert_eq!(b_cnt.0.load(Ordering::SeqCst), 0);

        assert!(q.wake_one());
        assert_eq!(b_cnt.0.load(Ordering::SeqCst), 1);

        assert!(!q.wake_one());
    }

    #[test]
    fn wake_all_drains_queue() {
        let mut q = WaitQueue::new();
        for _ in 0..3 {
            let (_, w) = counting_waker();
            q.push(w);
        }
        assert_eq!(q.len(), 3);
        q.wake_all();
        assert!(q.is_empty());
    }
}
