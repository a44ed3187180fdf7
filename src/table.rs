//! The sparse, reuse-on-reopen table of channel slots owned by a [`crate::bus::Bus`].
//!
//! `open` always returns the lowest-index empty slot. A linear low-to-high
//! scan over `Vec<Option<Channel>>` implements that invariant directly; a
//! free-list-based slot allocator would need its free list to be ordered
//! by index rather than recency to guarantee the same thing across more
//! than one outstanding free slot.

use crate::channel::Channel;

#[derive(Default)]
pub(crate) struct ChannelTable {
    slots: Vec<Option<Channel>>,
}

impl ChannelTable {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Insert `channel` into the lowest-index empty slot, appending a new
    /// slot if none is free. Returns the chosen descriptor.
    pub fn open(&mut self, channel: Channel) -> usize {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_none() {
                *slot = Some(channel);
                return i;
            }
        }
        self.slots.push(Some(channel));
        self.slots.len() - 1
    }

    /// Remove and return the channel at `desc`, if any. Out-of-range or
    /// already-empty descriptors are tolerated and return `None`.
    pub fn close(&mut self, desc: usize) -> Option<Channel> {
        self.slots.get_mut(desc).and_then(|slot| slot.take())
    }

    pub fn get(&self, desc: usize) -> Option<&Channel> {
        self.slots.get(desc).and_then(|slot| slot.as_ref())
    }

    /// Iterate over every occupied slot, in ascending descriptor order.
    pub fn iter_open(&self) -> impl Iterator<Item = (usize, &Channel)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (i, c)))
    }

    /// Descriptors of every occupied slot, in ascending order. Used by
    /// `close_all` and by `broadcast`'s two-pass check-then-commit walk.
    pub fn open_descriptors(&self) -> Vec<usize> {
        self.iter_open().map(|(i, _)| i).collect()
    }
}
