//! `uint → Value` table: a dense array for small keys plus a hash part.

use super::{Cursor, HashPart};
use crate::hash::hash_int;
use crate::utils::log2_ceil;
use crate::Value;

/// Largest dense array `compact` will build, as a power of two.
const MAX_ARRAY_LG2: usize = 16;

/// Minimum fraction of occupied dense slots accepted by `compact`.
const MIN_DENSITY: f64 = 0.1;

const DEFAULT_HASH_LG2: u8 = 4;

/// Value written into a vacated dense cell. Presence is tracked separately.
const VACANT_CELL: u64 = u64::MAX;

/// Integer-keyed table.
///
/// Keys below `array_size` live in the dense array, all others in the hash
/// part. The array is never empty, so key `0` can never reach the hash part
/// where it would collide with the empty-slot marker.
#[derive(Clone, Debug)]
pub struct IntTable {
    hash: HashPart,
    /// `array_size` values followed by the presence bitmap, one block.
    cells: Box<[u64]>,
    array_size: usize,
    array_count: usize,
    generation: u32,
}

impl Default for IntTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IntTable {
    pub fn new() -> Self {
        Self::sized(0, DEFAULT_HASH_LG2)
    }

    pub fn sized(array_size: usize, hash_lg2: u8) -> Self {
        let array_size = array_size.max(1);
        let words = array_size.div_ceil(64);
        let mut cells = vec![VACANT_CELL; array_size + words].into_boxed_slice();
        cells[array_size..].fill(0);
        Self {
            hash: HashPart::with_lg2(hash_lg2),
            cells,
            array_size,
            array_count: 0,
            generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.hash.len() + self.array_count
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn array_size(&self) -> usize {
        self.array_size
    }

    #[inline]
    pub fn array_count(&self) -> usize {
        self.array_count
    }

    #[inline]
    pub fn hash_capacity(&self) -> usize {
        self.hash.capacity()
    }

    #[inline]
    fn present(&self, key: usize) -> bool {
        self.cells[self.array_size + key / 64] & (1 << (key % 64)) != 0
    }

    #[inline]
    fn set_present(&mut self, key: usize, on: bool) {
        let word = &mut self.cells[self.array_size + key / 64];
        if on {
            *word |= 1 << (key % 64);
        } else {
            *word &= !(1 << (key % 64));
        }
    }

    #[inline]
    fn dense_index(&self, key: u64) -> Option<usize> {
        (key < self.array_size as u64).then_some(key as usize)
    }

    /// Insert a key known to be absent.
    pub fn insert(&mut self, key: u64, value: Value) {
        if let Some(i) = self.dense_index(key) {
            debug_assert!(!self.present(i), "duplicate int table key {key}");
            self.cells[i] = value.raw();
            self.set_present(i, true);
            self.array_count += 1;
            return;
        }

        debug_assert!(self.lookup(key).is_none(), "duplicate int table key {key}");
        if self.hash.is_full() {
            let new_lg2 = self.hash.size_lg2() + 1;
            tracing::trace!(
                old_lg2 = self.hash.size_lg2(),
                new_lg2,
                count = self.hash.len(),
                "int table hash part resize"
            );
            self.hash = self.hash.rehashed(new_lg2);
            self.generation = self.generation.wrapping_add(1);
        }
        self.hash.insert(key, hash_int(key), value);
    }

    pub fn lookup(&self, key: u64) -> Option<Value> {
        if let Some(i) = self.dense_index(key) {
            return self.present(i).then(|| Value::from_raw(self.cells[i]));
        }
        let index = self.hash.find(hash_int(key), |k| k == key)?;
        Some(self.hash.slot(index).value)
    }

    /// Overwrite the value of an existing key. Returns `false` if absent.
    pub fn replace(&mut self, key: u64, value: Value) -> bool {
        if let Some(i) = self.dense_index(key) {
            if !self.present(i) {
                return false;
            }
            self.cells[i] = value.raw();
            return true;
        }
        match self.hash.find(hash_int(key), |k| k == key) {
            Some(index) => {
                self.hash.slot_mut(index).value = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, key: u64) -> Option<Value> {
        if let Some(i) = self.dense_index(key) {
            if !self.present(i) {
                return None;
            }
            let value = Value::from_raw(self.cells[i]);
            self.cells[i] = VACANT_CELL;
            self.set_present(i, false);
            self.array_count -= 1;
            return Some(value);
        }
        self.hash
            .remove(hash_int(key), |k| k == key)
            .map(|(_, v)| v)
    }

    /// Rebuild with the best split between dense array and hash part.
    ///
    /// The array becomes the largest power of two (at most `2^16`) that stays
    /// at least 10% occupied; every other key goes to a hash part sized for it.
    pub fn compact(&mut self) {
        // Bucket b holds keys in (2^(b-1), 2^b]; the last bucket is "too big for any array".
        let mut counts = [0usize; MAX_ARRAY_LG2 + 2];
        let mut max = [0u64; MAX_ARRAY_LG2 + 2];
        for (key, _) in self.iter() {
            let bucket = (log2_ceil(key) as usize).min(MAX_ARRAY_LG2 + 1);
            counts[bucket] += 1;
            max[bucket] = max[bucket].max(key);
        }

        let mut arr_count = self.len() - counts[MAX_ARRAY_LG2 + 1];
        let mut size_lg2 = MAX_ARRAY_LG2;
        while size_lg2 > 0 {
            if counts[size_lg2] != 0 && arr_count as f64 >= (1u64 << size_lg2) as f64 * MIN_DENSITY {
                break;
            }
            arr_count -= counts[size_lg2];
            size_lg2 -= 1;
        }

        let arr_size = max[size_lg2] as usize + 1;
        let hash_count = self.len() - arr_count;
        let hash_size = if hash_count == 0 { 0 } else { hash_count * 8 / 7 + 1 };
        let hash_lg2 = log2_ceil(hash_size as u64) as u8;

        let mut fresh = IntTable::sized(arr_size, hash_lg2);
        for (key, value) in self.iter() {
            fresh.insert(key, value);
        }
        fresh.generation = self.generation.wrapping_add(1);
        tracing::trace!(
            array_size = fresh.array_size,
            hash_lg2,
            count = fresh.len(),
            "int table compacted"
        );
        *self = fresh;
    }

    /// Advance `cursor`: dense array first, then the hash part.
    pub fn next(&self, cursor: &mut Cursor) -> Option<(u64, Value)> {
        let mut i = cursor.start(self.generation)?;
        while i < self.array_size {
            if self.present(i) {
                *cursor = Cursor::at(i, self.generation);
                return Some((i as u64, Value::from_raw(self.cells[i])));
            }
            i += 1;
        }
        let index = self.hash.next_occupied(i - self.array_size)?;
        *cursor = Cursor::at(self.array_size + index, self.generation);
        let slot = self.hash.slot(index);
        Some((slot.key, slot.value))
    }

    /// Remove the entry `cursor` is on; see [`StringTable::remove_at`](super::StringTable::remove_at).
    pub fn remove_at(&mut self, cursor: &mut Cursor) -> Option<(u64, Value)> {
        let index = cursor.index(self.generation)?;
        if index < self.array_size {
            let key = index as u64;
            return self.remove(key).map(|v| (key, v));
        }
        let slot = *self.hash.get(index - self.array_size)?;
        if slot.is_empty() {
            return None;
        }
        if self.hash.remove_at(index - self.array_size) {
            cursor.rewind();
        }
        Some((slot.key, slot.value))
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, Value)> + '_ {
        let dense = (0..self.array_size)
            .filter(|&i| self.present(i))
            .map(|i| (i as u64, Value::from_raw(self.cells[i])));
        dense.chain(self.hash.occupied().map(|s| (s.key, s.value)))
    }

    pub fn clear(&mut self) {
        self.cells[..self.array_size].fill(VACANT_CELL);
        self.cells[self.array_size..].fill(0);
        self.array_count = 0;
        self.hash.clear();
    }
}
