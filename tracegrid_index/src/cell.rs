// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The finest grid unit: the payloads rasterized onto one pixel.

use core::fmt::Debug;

use smallvec::SmallVec;

/// Payloads currently rasterized onto one pixel.
///
/// Entries are kept in insertion order. Removal through a slot hint is O(1):
/// the slot becomes a tombstone, trailing tombstones are trimmed, and the list
/// is compacted once tombstones outnumber live entries. A hint invalidated by
/// compaction falls back to a scan of the (short) list.
#[derive(Clone)]
pub struct Cell<P> {
    slots: SmallVec<[Option<P>; 2]>,
    live: u32,
}

impl<P> Default for Cell<P> {
    fn default() -> Self {
        Self {
            slots: SmallVec::new(),
            live: 0,
        }
    }
}

impl<P> Cell<P> {
    /// Drop all entries, keeping any spilled capacity.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.live = 0;
    }
}

impl<P: Copy + PartialEq + Debug> Debug for Cell<P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<P: Copy + PartialEq> Cell<P> {
    /// Number of payloads in the cell.
    #[inline]
    pub fn len(&self) -> usize {
        self.live as usize
    }

    /// Whether the cell holds nothing.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Payloads in insertion order.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = P> + '_ {
        self.slots.iter().filter_map(|s| *s)
    }

    /// Whether the payload is present.
    pub fn contains(&self, payload: P) -> bool {
        self.iter().any(|p| p == payload)
    }

    /// Append a payload and return its slot.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "a cell never holds anywhere near 2^32 entries"
    )]
    pub(crate) fn push(&mut self, payload: P) -> u32 {
        self.slots.push(Some(payload));
        self.live += 1;
        (self.slots.len() - 1) as u32
    }

    /// Remove one occurrence of `payload`, trying `hint` first.
    ///
    /// Returns `false` if the payload is not in the cell.
    pub(crate) fn remove(&mut self, hint: u32, payload: P) -> bool {
        let hint = hint as usize;
        let pos = if self.slots.get(hint).copied().flatten() == Some(payload) {
            hint
        } else if let Some(pos) = self.slots.iter().position(|s| *s == Some(payload)) {
            pos
        } else {
            return false;
        };
        self.slots[pos] = None;
        self.live -= 1;

        if self.live == 0 {
            self.slots.clear();
        } else {
            while matches!(self.slots.last(), Some(None)) {
                self.slots.pop();
            }
            if self.slots.len() > 2 * self.live as usize {
                self.slots.retain(|s| s.is_some());
            }
        }
        true
    }

    #[cfg(test)]
    pub(crate) fn slot_len(&self) -> usize {
        self.slots.len()
    }
}
