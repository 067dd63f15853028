// Copyright 2026 the Tracegrid Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Generational slot storage shared by models and blocks.

use alloc::vec::Vec;

/// Slots addressed by `(index, generation)`.
///
/// Freed slots are reused with a bumped generation, so an old handle to a
/// reused slot is recognised as stale.
#[derive(Clone, Debug)]
pub(crate) struct Arena<T> {
    slots: Vec<Option<T>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<T> Arena<T> {
    /// Store a value built from its future handle.
    #[allow(
        clippy::cast_possible_truncation,
        reason = "handles use 32-bit indices."
    )]
    pub(crate) fn insert_with(&mut self, make: impl FnOnce(u32, u32) -> T) -> (u32, u32) {
        if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(make(idx as u32, generation));
            (idx as u32, generation)
        } else {
            let idx = self.slots.len();
            let generation = 1_u32;
            self.slots.push(Some(make(idx as u32, generation)));
            self.generations.push(generation);
            (idx as u32, generation)
        }
    }

    pub(crate) fn is_alive(&self, idx: usize, generation: u32) -> bool {
        self.slots.get(idx).is_some_and(Option::is_some)
            && self.generations.get(idx) == Some(&generation)
    }

    pub(crate) fn get(&self, idx: usize, generation: u32) -> Option<&T> {
        if !self.is_alive(idx, generation) {
            return None;
        }
        self.slots[idx].as_ref()
    }

    pub(crate) fn get_mut(&mut self, idx: usize, generation: u32) -> Option<&mut T> {
        if !self.is_alive(idx, generation) {
            return None;
        }
        self.slots[idx].as_mut()
    }

    pub(crate) fn remove(&mut self, idx: usize, generation: u32) -> Option<T> {
        if !self.is_alive(idx, generation) {
            return None;
        }
        self.free_list.push(idx);
        self.slots[idx].take()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free_list.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(Option::as_ref)
    }
}
