//! Message layout tables.

use crate::constants::RESERVED_HASBYTES;
use crate::enum_table::EnumTableId;
use crate::field::MiniTableField;
use crate::types::{CType, ExtMode};

/// Handle of a [`MiniTable`] inside a [`crate::MiniTables`] store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct MiniTableId(pub(crate) u32);

impl MiniTableId {
    /// The shared table with no fields, used for unlinked sub-messages.
    pub const EMPTY: MiniTableId = MiniTableId(u32::MAX);

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn is_empty_table(self) -> bool {
        self == Self::EMPTY
    }
}

/// One entry of a table's sub list.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Sub {
    /// Referenced message; [`MiniTableId::EMPTY`] until linked.
    Message(MiniTableId),
    /// Referenced closed enum; `None` until linked.
    Enum(Option<EnumTableId>),
}

/// The table every unlinked message slot points at.
pub static EMPTY_MINI_TABLE: MiniTable = MiniTable::empty();

/// Memory layout of one message type.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct MiniTable {
    pub(crate) fields: Vec<MiniTableField>,
    pub(crate) subs: Vec<Sub>,
    pub(crate) size: u16,
    pub(crate) ext: ExtMode,
    pub(crate) dense_below: u16,
    pub(crate) table_mask: i8,
    pub(crate) required_count: u8,
}

impl MiniTable {
    pub(crate) const fn empty() -> Self {
        Self {
            fields: Vec::new(),
            subs: Vec::new(),
            size: RESERVED_HASBYTES,
            ext: ExtMode::empty(),
            dense_below: 0,
            table_mask: -1,
            required_count: 0,
        }
    }

    /// Fields ordered by number.
    pub fn fields(&self) -> &[MiniTableField] {
        &self.fields
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn field(&self, index: usize) -> Option<&MiniTableField> {
        self.fields.get(index)
    }

    pub fn subs(&self) -> &[Sub] {
        &self.subs
    }

    /// Total instance size in bytes, always a multiple of 8.
    pub fn size(&self) -> u16 {
        self.size
    }

    pub fn ext(&self) -> ExtMode {
        self.ext
    }

    pub fn is_extendable(&self) -> bool {
        self.ext.contains(ExtMode::EXTENDABLE)
    }

    pub fn is_message_set(&self) -> bool {
        self.ext.contains(ExtMode::IS_MESSAGE_SET)
    }

    pub fn is_map_entry(&self) -> bool {
        self.ext.contains(ExtMode::IS_MAP_ENTRY)
    }

    /// Count of leading fields numbered `1..=dense_below`.
    pub fn dense_below(&self) -> u16 {
        self.dense_below
    }

    /// Reserved for a fast-path dispatcher; always `-1`.
    pub fn table_mask(&self) -> i8 {
        self.table_mask
    }

    pub fn required_count(&self) -> u8 {
        self.required_count
    }

    /// Position of the field with `number`, if any.
    pub fn field_index_by_number(&self, number: u32) -> Option<usize> {
        let i = (number as usize).wrapping_sub(1);
        if i < self.dense_below as usize {
            debug_assert_eq!(self.fields[i].number, number);
            return Some(i);
        }
        let rest = &self.fields[self.dense_below as usize..];
        rest.binary_search_by_key(&number, |f| f.number)
            .ok()
            .map(|pos| pos + self.dense_below as usize)
    }

    pub fn find_field_by_number(&self, number: u32) -> Option<&MiniTableField> {
        self.field_index_by_number(number).map(|i| &self.fields[i])
    }

    /// Sub-message table of a message or group field.
    pub fn sub_message(&self, field: &MiniTableField) -> Option<MiniTableId> {
        match self.subs.get(field.sub_index()? as usize)? {
            Sub::Message(id) => Some(*id),
            Sub::Enum(_) => None,
        }
    }

    /// Linked enum table of a closed enum field.
    pub fn sub_enum(&self, field: &MiniTableField) -> Option<EnumTableId> {
        match self.subs.get(field.sub_index()? as usize)? {
            Sub::Enum(id) => *id,
            Sub::Message(_) => None,
        }
    }

    /// Fields that expect a linked sub-table, messages first.
    pub fn sub_list(&self) -> SubList {
        let messages: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.ctype() == CType::Message)
            .map(|(i, _)| i)
            .collect();
        let message_count = messages.len();
        let mut fields = messages;
        fields.extend(
            self.fields
                .iter()
                .enumerate()
                .filter(|(_, f)| f.is_closed_enum())
                .map(|(i, _)| i),
        );
        let enum_count = fields.len() - message_count;
        SubList {
            fields,
            message_count,
            enum_count,
        }
    }
}

impl Default for MiniTable {
    fn default() -> Self {
        Self::empty()
    }
}

/// Field indices needing sub-tables, in linking order.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SubList {
    pub fields: Vec<usize>,
    pub message_count: usize,
    pub enum_count: usize,
}

impl SubList {
    /// `message_count << 16 | enum_count`.
    pub fn packed_counts(&self) -> u32 {
        ((self.message_count as u32) << 16) | self.enum_count as u32
    }

    pub fn messages(&self) -> &[usize] {
        &self.fields[..self.message_count]
    }

    pub fn enums(&self) -> &[usize] {
        &self.fields[self.message_count..]
    }
}
