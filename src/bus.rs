//! The bus: owns the channel table and the broadcast-waiter queue, and
//! implements every send/receive/close/broadcast operation.
//!
//! This is the idiomatic, `Result`-returning surface. `crate::contract`
//! layers C-ABI-shaped signatures (signed descriptors, `-1` sentinels, a
//! process-wide errno slot) on top of it.
//!
//! Blocking forms are `async fn`s built from [`std::future::poll_fn`]: each
//! one tries its non-blocking twin, and on `WouldBlock` registers the
//! current task's `Waker` on the relevant channel queue and returns
//! `Poll::Pending`. `Channel::push_and_notify`/`pop_and_notify` (and the
//! broadcast cascade below) call `Waker::wake()` on that same handle later,
//! which is what gets this future polled again. No executor-specific code
//! lives here; any executor that polls these futures and respects wakeups
//! drives the bus correctly, including the reference one in
//! `crate::executor`.

use std::cell::RefCell;
use std::future::poll_fn;
use std::task::Poll;

use log::{debug, trace};

use crate::channel::Channel;
use crate::error::BusError;
use crate::executor::yield_now;
use crate::table::ChannelTable;

/// A single-threaded, in-process coroutine message bus.
///
/// Not `Send`/`Sync`: the bus is used from exactly one cooperative
/// scheduler running on one OS thread. Wrapping it in a `Mutex` to share
/// across threads would be both unnecessary and wrong: operations assume
/// no concurrent mutation is possible while they run.
pub struct Bus {
    table: RefCell<ChannelTable>,
    broadcast_waiting: RefCell<crate::waiter::WaitQueue>,
}

impl Default for Bus {
    fn default() -> Self {
        Self::new()
    }
}

impl Bus {
    pub fn new() -> Self {
        Self {
            table: RefCell::new(ChannelTable::new()),
            broadcast_waiting: RefCell::new(crate::waiter::WaitQueue::new()),
        }
    }

    /// Open a new channel with the given bounded capacity, returning its
    /// descriptor. Always succeeds with the lowest free index.
    ///
    /// # Panics
    ///
    /// Panics if `capacity == 0` (see `DESIGN.md`).
    pub fn open(&self, capacity: usize) -> usize {
        let desc = self.table.borrow_mut().open(Channel::new(capacity));
        debug!("channel {desc} opened with capacity {capacity}");
        desc
    }

    /// Non-blocking send.
    pub fn try_send(&self, desc: usize, m: u64) -> Result<(), BusError> {
        let table = self.table.borrow();
        let channel = table.get(desc).ok_or(BusError::NoChannel)?;
        if !channel.has_space() {
            return Err(BusError::WouldBlock);
        }
        channel.push_and_notify(m).map_err(|_| BusError::WouldBlock)
    }

    /// Blocking send: suspends on `WouldBlock` until space frees up or the
    /// channel closes.
    pub async fn send(&self, desc: usize, m: u64) -> Result<(), BusError> {
        poll_fn(move |cx| match self.try_send(desc, m) {
            Ok(()) => Poll::Ready(Ok(())),
            Err(BusError::NoChannel) => Poll::Ready(Err(BusError::NoChannel)),
            Err(BusError::WouldBlock) => {
                if let Some(channel) = self.table.borrow().get(desc) {
                    channel.push_sender_waiter(cx.waker().clone());
                }
                Poll::Pending
            }
        })
        .await
    }

    /// Non-blocking receive.
    pub fn try_recv(&self, desc: usize) -> Result<u64, BusError> {
        let table = self.table.borrow();
        let channel = table.get(desc).ok_or(BusError::NoChannel)?;
        if !channel.has_message() {
            return Err(BusError::WouldBlock);
        }
        let (m, woke_sender) = channel.pop_and_notify().ok_or(BusError::WouldBlock)?;
        if !woke_sender {
            self.broadcast_waiting.borrow_mut().wake_one();
        }
        Ok(m)
    }

    /// Blocking receive.
    pub async fn recv(&self, desc: usize) -> Result<u64, BusError> {
        poll_fn(move |cx| match self.try_recv(desc) {
            Ok(m) => Poll::Ready(Ok(m)),
            Err(BusError::NoChannel) => Poll::Ready(Err(BusError::NoChannel)),
            Err(BusError::WouldBlock) => {
                if let Some(channel) = self.table.borrow().get(desc) {
                    channel.push_receiver_waiter(cx.waker().clone());
                }
                Poll::Pending
            }
        })
        .await
    }

    /// Close a channel: wake every waiter on both of its queues, remove it
    /// from the table, then yield once so woken waiters get a turn to
    /// re-observe the now-empty slot.
    ///
    /// A stale or out-of-range descriptor is a true no-op: nothing is
    /// removed and the caller is not suspended. Idempotent.
    pub async fn close(&self, desc: usize) {
        let channel = self.table.borrow_mut().close(desc);
        let Some(channel) = channel else {
            return;
        };
        channel.wake_all_waiters();
        debug!("channel {desc} closed");
        yield_now().await;
    }

    /// Close every currently open channel, without yielding. Used when the
    /// bus itself is torn down (`Drop`): nothing will resume after that, so
    /// there is no one left to benefit from a cooperative yield.
    pub(crate) fn close_all_sync(&self) {
        let mut table = self.table.borrow_mut();
        for desc in table.open_descriptors() {
            if let Some(channel) = table.close(desc) {
                channel.wake_all_waiters();
            }
        }
    }

    /// Non-blocking broadcast: all-or-nothing across every open channel.
    #[cfg(feature = "broadcast")]
    pub fn try_broadcast(&self, m: u64) -> Result<(), BusError> {
        let table = self.table.borrow();
        let descs = table.open_descriptors();
        if descs.is_empty() {
            return Err(BusError::NoChannel);
        }
        for &d in &descs {
            if !table.get(d).expect("descriptor just listed").has_space() {
                trace!("broadcast blocked: channel {d} full");
                return Err(BusError::WouldBlock);
            }
        }
        for &d in &descs {
            table
                .get(d)
                .expect("descriptor just listed")
                .push_and_notify(m)
                .expect("space was just checked");
        }
        Ok(())
    }

    /// Blocking broadcast.
    #[cfg(feature = "broadcast")]
    pub async fn broadcast(&self, m: u64) -> Result<(), BusError> {
        poll_fn(move |cx| match self.try_broadcast(m) {
            Ok(()) => Poll::Ready(Ok(())),
            Err(BusError::NoChannel) => Poll::Ready(Err(BusError::NoChannel)),
            Err(BusError::WouldBlock) => {
                self.broadcast_waiting.borrow_mut().push(cx.waker().clone());
                Poll::Pending
            }
        })
        .await
    }

    /// Non-blocking vectorised send: push from `data` until the channel is
    /// full or `data` is exhausted.
    #[cfg(feature = "vectored")]
    pub fn try_send_v(&self, desc: usize, data: &[u64]) -> Result<usize, BusError> {
        let table = self.table.borrow();
        let channel = table.get(desc).ok_or(BusError::NoChannel)?;
        let mut sent = 0;
        for &m in data {
            if !channel.has_space() {
                break;
            }
            channel
                .push_and_notify(m)
                .expect("space was just checked");
            sent += 1;
        }
        if sent == 0 && !data.is_empty() {
            return Err(BusError::WouldBlock);
        }
        Ok(sent)
    }

    /// Blocking vectorised send.
    #[cfg(feature = "vectored")]
    pub async fn send_v(&self, desc: usize, data: &[u64]) -> Result<usize, BusError> {
        poll_fn(move |cx| match self.try_send_v(desc, data) {
            Ok(n) => Poll::Ready(Ok(n)),
            Err(BusError::NoChannel) => Poll::Ready(Err(BusError::NoChannel)),
            Err(BusError::WouldBlock) => {
                if let Some(channel) = self.table.borrow().get(desc) {
                    channel.push_sender_waiter(cx.waker().clone());
                }
                Poll::Pending
            }
        })
        .await
    }

    /// Non-blocking vectorised receive: fill `out` until the channel is
    /// empty or `out` is full.
    #[cfg(feature = "vectored")]
    pub fn try_recv_v(&self, desc: usize, out: &mut [u64]) -> Result<usize, BusError> {
        let table = self.table.borrow();
        let channel = table.get(desc).ok_or(BusError::NoChannel)?;
        let mut received = 0;
        for slot in out.iter_mut() {
            match channel.pop_and_notify() {
                Some((m, woke_sender)) => {
                    *slot = m;
                    received += 1;
                    if !woke_sender {
                        self.broadcast_waiting.borrow_mut().wake_one();
                    }
                }
                None => break,
            }
        }
        if received == 0 && !out.is_empty() {
            return Err(BusError::WouldBlock);
        }
        Ok(received)
    }

    /// Blocking vectorised receive.
    #[cfg(feature = "vectored")]
    pub async fn recv_v(&self, desc: usize, out: &mut [u64]) -> Result<usize, BusError> {
        poll_fn(move |cx| match self.try_recv_v(desc, out) {
            Ok(n) => Poll::Ready(Ok(n)),
            Err(BusError::NoChannel) => Poll::Ready(Err(BusError::NoChannel)),
            Err(BusError::WouldBlock) => {
                if let Some(channel) = self.table.borrow().get(desc) {
                    channel.push_receiver_waiter(cx.waker().clone());
                }
                Poll::Pending
            }
        })
        .await
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        self.close_all_sync();
    }
}
