//! A C-ABI-shaped surface over [`crate::bus::Bus`]: signed descriptors,
//! `0`/`-1`/positive-count returns, and a process-wide `errno`-style
//! last-error slot, for callers that want that calling convention rather
//! than `Result`.
//!
//! [`Bus`] is the idiomatic core; this module is a thin adapter in front
//! of it, the same relationship a fiber-channel FFI wrapper has to the
//! underlying C API it calls into and reports failure for via a negative
//! return plus a side-channel error value.
//!
//! The error slot is a thread-local rather than a bare mutable `static`:
//! the bus never crosses threads, and a thread-local gives the same
//! single-effective-owner shape without a `static mut`.

use std::cell::Cell;

use crate::bus::Bus;
use crate::error::ErrorCode;

thread_local! {
    static LAST_ERROR: Cell<ErrorCode> = const { Cell::new(ErrorCode::None) };
}

/// Read the process-wide (thread-local) last-error slot.
pub fn errno_get() -> ErrorCode {
    LAST_ERROR.with(|e| e.get())
}

/// Set the process-wide (thread-local) last-error slot.
pub fn errno_set(code: ErrorCode) {
    LAST_ERROR.with(|e| e.set(code));
}

fn fail(code: ErrorCode) -> i64 {
    errno_set(code);
    -1
}

/// `bus_new() -> bus`.
pub fn bus_new() -> Bus {
    Bus::new()
}

/// `bus_delete(bus)`. Closes every still-open channel first; `Bus`'s own
/// `Drop` impl already does this synchronously, so this is just a named
/// entry point for callers using the contract-level API by convention.
pub fn bus_delete(bus: Bus) {
    drop(bus);
}

/// `channel_open(bus, capacity) -> desc`. Always succeeds with a
/// non-negative descriptor.
pub fn channel_open(bus: &Bus, capacity: usize) -> i64 {
    bus.open(capacity) as i64
}

/// `channel_close(bus, desc)`. Idempotent; tolerant of stale descriptors.
pub async fn channel_close(bus: &Bus, desc: i64) {
    if let Ok(desc) = usize::try_from(desc) {
        bus.close(desc).await;
    }
}

/// `try_send(bus, desc, m) -> 0 | -1`.
pub fn try_send(bus: &Bus, desc: i64, m: u64) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.try_send(desc, m) {
        Ok(()) => 0,
        Err(e) => fail(e.into()),
    }
}

/// `send(bus, desc, m) -> 0 | -1`.
pub async fn send(bus: &Bus, desc: i64, m: u64) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.send(desc, m).await {
        Ok(()) => 0,
        Err(e) => fail(e.into()),
    }
}

/// `try_recv(bus, desc, &mut out) -> 0 | -1`.
pub fn try_recv(bus: &Bus, desc: i64, out: &mut u64) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.try_recv(desc) {
        Ok(m) => {
            *out = m;
            0
        }
        Err(e) => fail(e.into()),
    }
}

/// `recv(bus, desc, &mut out) -> 0 | -1`.
pub async fn recv(bus: &Bus, desc: i64, out: &mut u64) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.recv(desc).await {
        Ok(m) => {
            *out = m;
            0
        }
        Err(e) => fail(e.into()),
    }
}

/// `try_broadcast(bus, m) -> 0 | -1`.
#[cfg(feature = "broadcast")]
pub fn try_broadcast(bus: &Bus, m: u64) -> i64 {
    match bus.try_broadcast(m) {
        Ok(()) => 0,
        Err(e) => fail(e.into()),
    }
}

/// `broadcast(bus, m) -> 0 | -1`.
#[cfg(feature = "broadcast")]
pub async fn broadcast(bus: &Bus, m: u64) -> i64 {
    match bus.broadcast(m).await {
        Ok(()) => 0,
        Err(e) => fail(e.into()),
    }
}

/// `try_send_v(bus, desc, data, count) -> n | -1`.
#[cfg(feature = "vectored")]
pub fn try_send_v(bus: &Bus, desc: i64, data: &[u64]) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.try_send_v(desc, data) {
        Ok(n) => n as i64,
        Err(e) => fail(e.into()),
    }
}

/// `send_v(bus, desc, data, count) -> n | -1`.
#[cfg(feature = "vectored")]
pub async fn send_v(bus: &Bus, desc: i64, data: &[u64]) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.send_v(desc, data).await {
        Ok(n) => n as i64,
        Err(e) => fail(e.into()),
    }
}

/// `try_recv_v(bus, desc, out, capacity) -> n | -1`.
#[cfg(feature = "vectored")]
pub fn try_recv_v(bus: &Bus, desc: i64, out: &mut [u64]) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.try_recv_v(desc, out) {
        Ok(n) => n as i64,
        Err(e) => fail(e.into()),
    }
}

/// `recv_v(bus, desc, out, capacity) -> n | -1`.
#[cfg(feature = "vectored")]
pub async fn recv_v(bus: &Bus, desc: i64, out: &mut [u64]) -> i64 {
    let Ok(desc) = usize::try_from(desc) else {
        return fail(ErrorCode::NoChannel);
    };
    match bus.recv_v(desc, out).await {
        Ok(n) => n as i64,
        Err(e) => fail(e.into()),
    }
}
