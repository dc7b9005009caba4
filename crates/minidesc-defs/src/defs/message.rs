use std::ops::Range;

use minidesc_table::{MiniTable, MiniTableId};

use crate::DefPool;
use crate::features::ResolvedFeatures;
use crate::ids::{MessageId, OneofId};

use super::{EnumDef, FieldDef, FileDef, MessageData, OneofData};

/// A message type.
#[derive(Clone, Copy)]
pub struct MessageDef<'p> {
    pool: &'p DefPool,
    id: MessageId,
}

impl<'p> MessageDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: MessageId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p MessageData {
        self.pool.defs.message(self.id)
    }

    pub fn id(&self) -> MessageId {
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

    /// Enclosing message of a nested type.
    pub fn containing_type(&self) -> Option<MessageDef<'p>> {
        self.data().parent.map(|id| MessageDef::new(self.pool, id))
    }

    pub fn features(&self) -> ResolvedFeatures {
        self.data().features
    }

    // ============================================================
    // Fields
    // ============================================================

    /// Fields in declaration order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .fields
            .iter()
            .map(move |&id| FieldDef::new(pool, id))
    }

    pub fn field_count(&self) -> usize {
        self.data().fields.len()
    }

    /// The `i`th field in declaration order.
    pub fn field(&self, i: usize) -> Option<FieldDef<'p>> {
        let id = *self.data().fields.get(i)?;
        Some(FieldDef::new(self.pool, id))
    }

    /// Fields in mini table order, which is ascending field number.
    pub fn fields_by_layout(&self) -> impl ExactSizeIterator<Item = FieldDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .layout
            .iter()
            .map(move |&id| FieldDef::new(pool, id))
    }

    pub fn find_field_by_name(&self, name: &str) -> Option<FieldDef<'p>> {
        let id = *self.data().fields_by_name.get(name)?;
        Some(FieldDef::new(self.pool, id))
    }

    pub fn find_field_by_json_name(&self, json_name: &str) -> Option<FieldDef<'p>> {
        let id = *self.data().fields_by_json_name.get(json_name)?;
        Some(FieldDef::new(self.pool, id))
    }

    /// Finds a field through the mini table's number index.
    pub fn find_field_by_number(&self, number: u32) -> Option<FieldDef<'p>> {
        let data = self.data();
        let index = self.mini_table().field_index_by_number(number)?;
        let id = *data.layout.get(index)?;
        Some(FieldDef::new(self.pool, id))
    }

    // ============================================================
    // Oneofs
    // ============================================================

    /// All oneofs, synthetic ones last.
    pub fn oneofs(&self) -> impl ExactSizeIterator<Item = OneofDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .oneofs
            .iter()
            .map(move |&id| OneofDef::new(pool, id))
    }

    pub fn oneof_count(&self) -> usize {
        self.data().oneofs.len()
    }

    /// Number of oneofs that were declared as such, not generated for a
    /// proto3 `optional` field.
    pub fn real_oneof_count(&self) -> usize {
        self.data().real_oneof_count
    }

    pub fn find_oneof_by_name(&self, name: &str) -> Option<OneofDef<'p>> {
        self.oneofs().find(|o| o.name() == name)
    }

    // ============================================================
    // Nested definitions
    // ============================================================

    pub fn nested_messages(&self) -> impl ExactSizeIterator<Item = MessageDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .nested_messages
            .iter()
            .map(move |&id| MessageDef::new(pool, id))
    }

    pub fn nested_enums(&self) -> impl ExactSizeIterator<Item = EnumDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .nested_enums
            .iter()
            .map(move |&id| EnumDef::new(pool, id))
    }

    /// Extensions declared inside this message, whatever they extend.
    pub fn nested_extensions(&self) -> impl ExactSizeIterator<Item = FieldDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .nested_extensions
            .iter()
            .map(move |&id| FieldDef::new(pool, id))
    }

    /// Extension number ranges, end exclusive.
    pub fn extension_ranges(&self) -> &'p [Range<u32>] {
        &self.data().extension_ranges
    }

    pub fn reserved_ranges(&self) -> &'p [Range<u32>] {
        &self.data().reserved_ranges
    }

    pub fn reserved_names(&self) -> &'p [String] {
        &self.data().reserved_names
    }

    pub fn is_extendable(&self) -> bool {
        !self.data().extension_ranges.is_empty()
    }

    pub fn is_map_entry(&self) -> bool {
        self.data().is_map_entry
    }

    pub fn is_message_set(&self) -> bool {
        self.data().is_message_set
    }

    pub fn mini_table_id(&self) -> MiniTableId {
        self.data().table
    }

    pub fn mini_table(&self) -> &'p MiniTable {
        self.pool.tables.message(self.data().table)
    }
}

impl PartialEq for MessageDef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.pool, other.pool) && self.id == other.id
    }
}

impl Eq for MessageDef<'_> {}

impl std::fmt::Debug for MessageDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("MessageDef").field(&self.full_name()).finish()
    }
}

/// A oneof of a message.
#[derive(Clone, Copy)]
pub struct OneofDef<'p> {
    pool: &'p DefPool,
    id: OneofId,
}

impl<'p> OneofDef<'p> {
    pub(crate) fn new(pool: &'p DefPool, id: OneofId) -> Self {
        Self { pool, id }
    }

    fn data(&self) -> &'p OneofData {
        self.pool.defs.oneof(self.id)
    }

    pub fn id(&self) -> OneofId {
        self.id
    }

    pub fn name(&self) -> &'p str {
        &self.data().name
    }

    pub fn full_name(&self) -> &'p str {
        &self.data().full_name
    }

    pub fn containing_type(&self) -> MessageDef<'p> {
        MessageDef::new(self.pool, self.data().parent)
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = FieldDef<'p>> + 'p {
        let pool = self.pool;
        self.data()
            .fields
            .iter()
            .map(move |&id| FieldDef::new(pool, id))
    }

    pub fn field_count(&self) -> usize {
        self.data().fields.len()
    }

    /// Whether this oneof only exists to track a proto3 `optional` field.
    pub fn is_synthetic(&self) -> bool {
        self.data().synthetic
    }
}

impl std::fmt::Debug for OneofDef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("OneofDef").field(&self.full_name()).finish()
    }
}
