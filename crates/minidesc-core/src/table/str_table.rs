//! `bytes → Value` table with keys copied into an arena.

use super::{Cursor, HashPart};
use crate::arena::{Arena, Span};
use crate::error::ArenaError;
use crate::hash::{hash_bytes, process_seed};
use crate::utils::log2_ceil;
use crate::Value;

/// Bytes of the little-endian length stored in front of each key.
const LEN_PREFIX: u32 = 4;

/// Key stored in an arena as `[len: u32 LE][payload]`.
///
/// The handle points at the payload, so the length sits immediately before it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct StrKey {
    block: u32,
    offset: u32,
}

impl StrKey {
    fn store(arena: &mut Arena, key: &[u8]) -> Result<Self, ArenaError> {
        let span = arena.alloc(LEN_PREFIX as usize + key.len())?;
        let buf = arena.bytes_mut(span);
        buf[..4].copy_from_slice(&(key.len() as u32).to_le_bytes());
        buf[4..].copy_from_slice(key);
        Ok(Self {
            block: span.block(),
            offset: span.offset() + LEN_PREFIX,
        })
    }

    // Payload offsets are at least LEN_PREFIX, so a raw key is never 0.
    fn raw(self) -> u64 {
        ((self.block as u64) << 32) | self.offset as u64
    }

    fn from_raw(raw: u64) -> Self {
        Self {
            block: (raw >> 32) as u32,
            offset: raw as u32,
        }
    }

    pub fn len(self, arena: &Arena) -> usize {
        let prefix = Span::from_parts(self.block, self.offset - LEN_PREFIX, LEN_PREFIX);
        let mut len = [0u8; 4];
        len.copy_from_slice(arena.bytes(prefix));
        u32::from_le_bytes(len) as usize
    }

    pub fn bytes(self, arena: &Arena) -> &[u8] {
        let len = self.len(arena) as u32;
        arena.bytes(Span::from_parts(self.block, self.offset, len))
    }
}

/// String-keyed hash table. Iteration order is unspecified and seed dependent.
#[derive(Clone, Debug)]
pub struct StringTable {
    part: HashPart,
    seed: u64,
    generation: u32,
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl StringTable {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-size for `expected` entries without a rehash.
    pub fn with_capacity(expected: usize) -> Self {
        Self::with_seed(expected, process_seed())
    }

    pub fn with_seed(expected: usize, seed: u64) -> Self {
        let need = expected + 1 + expected / 7;
        Self {
            part: HashPart::with_lg2(log2_ceil(need as u64) as u8),
            seed,
            generation: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.part.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.part.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.part.capacity()
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    fn hash(&self, key: &[u8]) -> u32 {
        hash_bytes(key, self.seed) as u32
    }

    /// Insert `key`, copying it into `arena`. The key must not be present.
    pub fn insert(&mut self, arena: &mut Arena, key: &[u8], value: Value) -> Result<StrKey, ArenaError> {
        debug_assert!(self.lookup(arena, key).is_none(), "duplicate string table key");
        let stored = StrKey::store(arena, key)?;
        if self.part.is_full() {
            self.resize(self.part.size_lg2() + 1);
        }
        let hash = self.hash(key);
        self.part.insert(stored.raw(), hash, value);
        Ok(stored)
    }

    pub fn lookup(&self, arena: &Arena, key: &[u8]) -> Option<Value> {
        self.lookup_entry(arena, key).map(|(_, v)| v)
    }

    /// Like [`lookup`](Self::lookup) but also returns the stored key.
    pub fn lookup_entry(&self, arena: &Arena, key: &[u8]) -> Option<(StrKey, Value)> {
        if self.is_empty() {
            return None;
        }
        let index = self
            .part
            .find(self.hash(key), |raw| StrKey::from_raw(raw).bytes(arena) == key)?;
        let slot = self.part.slot(index);
        Some((StrKey::from_raw(slot.key), slot.value))
    }

    /// Overwrite the value of an existing key. Returns `false` if absent.
    pub fn replace(&mut self, arena: &Arena, key: &[u8], value: Value) -> bool {
        if self.is_empty() {
            return false;
        }
        let found = self
            .part
            .find(self.hash(key), |raw| StrKey::from_raw(raw).bytes(arena) == key);
        match found {
            Some(index) => {
                self.part.slot_mut(index).value = value;
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, arena: &Arena, key: &[u8]) -> Option<Value> {
        let hash = self.hash(key);
        self.part
            .remove(hash, |raw| StrKey::from_raw(raw).bytes(arena) == key)
            .map(|(_, v)| v)
    }

    /// Rebuild with `2^size_lg2` slots. Stored keys are reused, not copied.
    pub fn resize(&mut self, size_lg2: u8) {
        debug_assert!(self.len() <= (1usize << size_lg2));
        tracing::trace!(
            old_lg2 = self.part.size_lg2(),
            new_lg2 = size_lg2,
            count = self.len(),
            "string table resize"
        );
        self.part = self.part.rehashed(size_lg2);
        self.generation = self.generation.wrapping_add(1);
    }

    pub fn clear(&mut self) {
        self.part.clear();
    }

    /// Advance `cursor` to the next live entry.
    pub fn next(&self, cursor: &mut Cursor) -> Option<(StrKey, Value)> {
        let index = self.part.next_occupied(cursor.start(self.generation)?)?;
        *cursor = Cursor::at(index, self.generation);
        let slot = self.part.slot(index);
        Some((StrKey::from_raw(slot.key), slot.value))
    }

    /// Remove the entry `cursor` is on. The next call to [`next`](Self::next)
    /// continues the walk, including any entry that moved into the freed slot.
    /// A cursor from before the last rebuild removes nothing.
    pub fn remove_at(&mut self, cursor: &mut Cursor) -> Option<(StrKey, Value)> {
        let index = cursor.index(self.generation)?;
        let slot = *self.part.get(index)?;
        if slot.is_empty() {
            return None;
        }
        if self.part.remove_at(index) {
            cursor.rewind();
        }
        Some((StrKey::from_raw(slot.key), slot.value))
    }

    pub fn iter<'a>(&'a self, arena: &'a Arena) -> impl Iterator<Item = (&'a [u8], Value)> + 'a {
        self.part
            .occupied()
            .map(move |slot| (StrKey::from_raw(slot.key).bytes(arena), slot.value))
    }
}
