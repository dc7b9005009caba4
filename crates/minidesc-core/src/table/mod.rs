//! Homogeneous hash tables.
//!
//! Both tables share one chained-scatter core ([`HashPart`]): a power-of-two
//! slot array where collisions are linked through `next` indices and every
//! chain head sits in its main position (Brent's variation). A table is full
//! at 7/8 load and doubles on the next insert.

mod int_table;
mod str_table;

#[cfg(test)]
mod str_table_tests;

pub use int_table::IntTable;
pub use str_table::{StrKey, StringTable};

use crate::Value;

/// Raw key of an empty slot.
const EMPTY_KEY: u64 = 0;

/// Iteration position, shared by both tables.
///
/// Iteration is index-based so that the table may be mutated between steps.
/// Entries moved by a removal may be skipped or revisited, never invented.
/// A cursor remembers the table generation it was taken in; once the table
/// is rebuilt (resize, growth, compaction) the walk ends.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Cursor {
    index: Option<usize>,
    generation: u32,
}

impl Cursor {
    pub const BEGIN: Cursor = Cursor {
        index: None,
        generation: 0,
    };

    /// First slot to scan, or `None` if the cursor outlived a rebuild.
    pub(crate) fn start(self, generation: u32) -> Option<usize> {
        match self.index {
            None => Some(0),
            Some(i) if self.generation == generation => Some(i + 1),
            Some(_) => None,
        }
    }

    pub(crate) fn at(index: usize, generation: u32) -> Self {
        Self {
            index: Some(index),
            generation,
        }
    }

    /// Current slot, if the cursor is still valid in `generation`.
    pub(crate) fn index(self, generation: u32) -> Option<usize> {
        self.index.filter(|_| self.generation == generation)
    }

    /// Step back so the current slot is visited again.
    pub(crate) fn rewind(&mut self) {
        self.index = self.index.and_then(|i| i.checked_sub(1));
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Slot {
    pub key: u64,
    pub hash: u32,
    pub value: Value,
    pub next: Option<u32>,
}

impl Slot {
    const VACANT: Slot = Slot {
        key: EMPTY_KEY,
        hash: 0,
        value: Value::from_raw(0),
        next: None,
    };

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.key == EMPTY_KEY
    }
}

/// Chained scatter table over raw `u64` keys. Key `0` marks an empty slot.
#[derive(Clone, Debug)]
pub(crate) struct HashPart {
    slots: Vec<Slot>,
    count: usize,
    size_lg2: u8,
}

impl HashPart {
    pub fn with_lg2(size_lg2: u8) -> Self {
        Self {
            slots: vec![Slot::VACANT; 1usize << size_lg2],
            count: 0,
            size_lg2,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn size_lg2(&self) -> u8 {
        self.size_lg2
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.count
    }

    #[inline]
    fn mask(&self) -> usize {
        self.capacity() - 1
    }

    pub fn max_count(&self) -> usize {
        self.capacity() - self.capacity() / 8
    }

    pub fn is_full(&self) -> bool {
        self.count >= self.max_count()
    }

    #[inline]
    fn main_position(&self, hash: u32) -> usize {
        hash as usize & self.mask()
    }

    pub fn slot(&self, index: usize) -> &Slot {
        &self.slots[index]
    }

    pub fn get(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> &mut Slot {
        &mut self.slots[index]
    }

    /// Index of the entry whose key satisfies `eq`.
    pub fn find(&self, hash: u32, eq: impl Fn(u64) -> bool) -> Option<usize> {
        if self.count == 0 {
            return None;
        }
        let mut index = self.main_position(hash);
        if self.slots[index].is_empty() {
            return None;
        }
        loop {
            let slot = &self.slots[index];
            if slot.hash == hash && eq(slot.key) {
                return Some(index);
            }
            index = slot.next? as usize;
        }
    }

    /// Insert a key known to be absent. The caller resizes before the table is full.
    pub fn insert(&mut self, key: u64, hash: u32, value: Value) {
        debug_assert!(key != EMPTY_KEY);
        debug_assert!(self.count < self.capacity());
        self.count += 1;

        let main = self.main_position(hash);
        let ours = if self.slots[main].is_empty() {
            main
        } else {
            let free = self.empty_slot_after(main);
            let colliding_head = self.main_position(self.slots[main].hash);
            if colliding_head == main {
                // Occupant is in its main position: append ours right behind it.
                self.slots[free].next = self.slots[main].next;
                self.slots[main].next = Some(free as u32);
                free
            } else {
                // Occupant belongs to another chain: evict it and take its spot.
                self.slots[free] = self.slots[main];
                let mut prev = colliding_head;
                while let Some(next) = self.slots[prev].next.filter(|&n| n as usize != main) {
                    prev = next as usize;
                }
                self.slots[prev].next = Some(free as u32);
                self.slots[main].next = None;
                main
            }
        };

        let slot = &mut self.slots[ours];
        slot.key = key;
        slot.hash = hash;
        slot.value = value;
    }

    /// Remove the entry whose key satisfies `eq`, returning its raw key and value.
    pub fn remove(&mut self, hash: u32, eq: impl Fn(u64) -> bool) -> Option<(u64, Value)> {
        if self.count == 0 {
            return None;
        }
        let head = self.main_position(hash);
        if self.slots[head].is_empty() {
            return None;
        }

        let first = &self.slots[head];
        if first.hash == hash && eq(first.key) {
            let removed = (first.key, first.value);
            self.count -= 1;
            self.vacate_head(head);
            return Some(removed);
        }

        let mut prev = head;
        while let Some(next) = self.slots[prev].next {
            let next = next as usize;
            let slot = &self.slots[next];
            if slot.hash == hash && eq(slot.key) {
                let removed = (slot.key, slot.value);
                self.slots[prev].next = slot.next;
                self.slots[next] = Slot::VACANT;
                self.count -= 1;
                return Some(removed);
            }
            prev = next;
        }
        None
    }

    /// Remove the entry at `index`. Returns `true` if another entry moved into `index`.
    pub fn remove_at(&mut self, index: usize) -> bool {
        debug_assert!(!self.slots[index].is_empty());
        self.count -= 1;
        let prev = (0..self.capacity()).find(|&i| self.slots[i].next == Some(index as u32));
        match prev {
            Some(prev) => {
                self.slots[prev].next = self.slots[index].next;
                self.slots[index] = Slot::VACANT;
                false
            }
            None => self.vacate_head(index),
        }
    }

    /// Next occupied slot at or after `from`.
    pub fn next_occupied(&self, from: usize) -> Option<usize> {
        (from..self.capacity()).find(|&i| !self.slots[i].is_empty())
    }

    pub fn occupied(&self) -> impl Iterator<Item = &Slot> {
        self.slots.iter().filter(|s| !s.is_empty())
    }

    /// Rebuild at `size_lg2`, reusing the cached hashes.
    pub fn rehashed(&self, size_lg2: u8) -> HashPart {
        let mut fresh = HashPart::with_lg2(size_lg2);
        for slot in self.occupied() {
            fresh.insert(slot.key, slot.hash, slot.value);
        }
        fresh
    }

    pub fn clear(&mut self) {
        self.slots.fill(Slot::VACANT);
        self.count = 0;
    }

    fn vacate_head(&mut self, head: usize) -> bool {
        match self.slots[head].next {
            Some(next) => {
                let next = next as usize;
                self.slots[head] = self.slots[next];
                self.slots[next] = Slot::VACANT;
                true
            }
            None => {
                self.slots[head] = Slot::VACANT;
                false
            }
        }
    }

    fn empty_slot_after(&self, index: usize) -> usize {
        (index + 1..self.capacity())
            .chain(0..index)
            .find(|&i| self.slots[i].is_empty())
            .unwrap_or_else(|| crate::invariants::table_full())
    }
}
