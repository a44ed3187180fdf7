//! A single-threaded, in-process coroutine message bus.
//!
//! A [`Bus`] owns a dynamically sized table of bounded FIFO channels of
//! `u64` messages, used by cooperatively scheduled coroutines to pass
//! values to one another. Every channel has a send-waiter queue and a
//! recv-waiter queue; the bus additionally keeps one broadcast-waiter
//! queue for [`Bus::broadcast`].
//!
//! ```
//! use coro_bus::Bus;
//!
//! let bus = Bus::new();
//! let desc = bus.open(1);
//! bus.try_send(desc, 7).unwrap();
//! assert_eq!(bus.try_recv(desc).unwrap(), 7);
//! ```
//!
//! Blocking operations ([`Bus::send`], [`Bus::recv`], [`Bus::broadcast`],
//! [`Bus::send_v`], [`Bus::recv_v`]) are `async fn`s: awaiting one suspends
//! the current task until the bus resumes it by waking the `Waker` it
//! registered. The crate does not require any particular async runtime:
//! see [`executor`] for a minimal reference one used by this crate's own
//! tests.
//!
//! The bus is emphatically not thread-safe and does not try to be: it is
//! designed for a single OS thread running a single cooperative scheduler,
//! and uses `RefCell` rather than any locking primitive throughout.

mod bus;
mod channel;
mod error;
pub mod executor;
mod table;
mod waiter;

pub use bus::Bus;
pub use error::{BusError, ErrorCode};

pub mod contract;
