use std::ops::Range;

use minidesc_table::MiniTableEnum;

use crate::DefPool;
use crate::features::{EnumType, ResolvedFeatures};
use crate::ids::{EnumId, EnumValueId};

use super::{EnumData, EnumValueData, FileDef, MessageDef};

/// An enum type.
#[derive(Clone, Copy)]
pub struct EnumDef<'p> {
    pool: &'p DefPool,
    id: EnumId,
}

impl<'p> EnumDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: EnumId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p EnumData {
        self.pool.defs.enum_(self.id)
    }

    pub fn id(&self) -> EnumId {
        self.id
    }

    pub fn name(&self) -> &'p str {
        &self.data().name
    }

    pub fn full_name(&self) -> &'p str {
        &self.data().full_name
    }

    pub fn file(&self) -> FileDef<'p> {
        FileDef::new(self.pool, self.data().file)
    }

    pub fn containing_type(&self) -> Option<MessageDef<'p>> {
        self.data().parent.map(|id| MessageDef::new(self.pool, id))
    }

    pub fn features(&self) -> ResolvedFeatures {
        self.data().features
    }

    /// Closed enums reject numbers they do not declare.
    pub fn is_closed(&self) -> bool {
        self.data().features.enum_type == EnumType::Closed
    }

    pub fn values(&self) -> impl ExactSizeIterator<Item = EnumValueDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .values
            .iter()
            .map(move |&id| EnumValueDef::new(pool, id))
    }

    pub fn value_count(&self) -> usize {
        self.data().values.len()
    }

    pub fn find_value_by_name(&self, name: &str) -> Option<EnumValueDef<'p>> {
        self.values().find(|v| v.name() == name)
    }

    /// First value declared with `number`. Aliases share a number.
    pub fn find_value_by_number(&self, number: i32) -> Option<EnumValueDef<'p>> {
        self.values().find(|v| v.number() == number)
    }

    /// Number of the first declared value.
    pub fn default_value(&self) -> i32 {
        self.values().next().map_or(0, |v| v.number())
    }

    pub fn reserved_ranges(&self) -> &'p [Range<i64>] {
        &self.data().reserved_ranges
    }

    pub fn reserved_names(&self) -> &'p [String] {
        &self.data().reserved_names
    }

    pub fn mini_table_enum(&self) -> Option<&'p MiniTableEnum> {
        let table = self.data().table?;
        Some(self.pool.tables.enum_table(table))
    }

    /// Whether `number` is accepted. Open enums accept every number.
    pub fn check_value(&self, number: i32) -> bool {
        if !self.is_closed() {
            return true;
        }
        match self.mini_table_enum() {
            Some(table) => table.check_value(number as u32),
            None => self.find_value_by_number(number).is_some(),
        }
    }
}

impl PartialEq for EnumDef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.pool, other.pool) && self.id == other.id
    }
}

impl Eq for EnumDef<'_> {}

impl std::fmt::Debug for EnumDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EnumDef").field(&self.full_name()).finish()
    }
}

/// One named value of an enum.
#[derive(Clone, Copy)]
pub struct EnumValueDef<'p> {
    pool: &'p DefPool,
    id: EnumValueId,
}

impl<'p> EnumValueDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: EnumValueId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p EnumValueData {
        self.pool.defs.enum_value(self.id)
    }

    pub fn id(&self) -> EnumValueId {
        self.id
    }

    pub fn name(&self) -> &'p str {
        &self.data().name
    }

    /// Full name. Values are scoped next to their enum, not inside it.
    pub fn full_name(&self) -> &'p str {
        &self.data().full_name
    }

    pub fn number(&self) -> i32 {
        self.data().number
    }

    pub fn enum_type(&self) -> EnumDef<'p> {
        EnumDef::new(self.pool, self.data().parent)
    }
}

impl std::fmt::Debug for EnumValueDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnumValueDef")
            .field("full_name", &self.full_name())
            .field("number", &self.number())
            .finish()
    }
}
