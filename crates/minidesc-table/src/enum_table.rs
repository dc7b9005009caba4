//! Closed enum membership tables.

/// Handle of a [`MiniTableEnum`] inside a [`crate::MiniTables`] store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct EnumTableId(pub(crate) u32);

impl EnumTableId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Set of valid values of a closed enum.
///
/// `data` holds `mask_limit / 32` bitmap words covering `0..mask_limit`,
/// followed by `value_count` explicit values at or above the limit.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct MiniTableEnum {
    pub(crate) mask_limit: u32,
    pub(crate) value_count: u32,
    pub(crate) data: Vec<u32>,
}

impl MiniTableEnum {
    pub fn mask_limit(&self) -> u32 {
        self.mask_limit
    }

    pub fn value_count(&self) -> u32 {
        self.value_count
    }

    pub fn mask_words(&self) -> &[u32] {
        &self.data[..self.mask_word_count()]
    }

    /// Values stored outside the bitmap, in insertion order.
    pub fn values(&self) -> &[u32] {
        &self.data[self.mask_word_count()..]
    }

    fn mask_word_count(&self) -> usize {
        (self.mask_limit / 32) as usize
    }

    /// Whether `value` is a member of the enum.
    pub fn check_value(&self, value: u32) -> bool {
        if value < self.mask_limit {
            let word = self.data[(value / 32) as usize];
            return word & (1 << (value % 32)) != 0;
        }
        self.values().contains(&value)
    }

    pub(crate) fn set_bit(&mut self, value: u32) {
        self.data[(value / 32) as usize] |= 1 << (value % 32);
    }
}
