//! Owning store of built tables, addressed by id.

use crate::decode::{decode_enum, decode_extension, decode_message};
use crate::enum_table::{EnumTableId, MiniTableEnum};
use crate::error::DecodeError;
use crate::extension::{ExtensionId, MiniTableExtension};
use crate::table::{EMPTY_MINI_TABLE, MiniTable, MiniTableId, Sub};
use crate::types::Platform;

/// Every message, enum and extension table built for one pool.
///
/// Tables refer to each other by id, so cyclic message graphs need no
/// shared ownership.
#[derive(Clone, Debug, Default)]
pub struct MiniTables {
    messages: Vec<MiniTable>,
    enums: Vec<MiniTableEnum>,
    extensions: Vec<MiniTableExtension>,
}

/// Store lengths captured before a batch of insertions.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Checkpoint {
    messages: usize,
    enums: usize,
    extensions: usize,
}

impl MiniTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_message(&mut self, table: MiniTable) -> MiniTableId {
        let id = MiniTableId(self.messages.len() as u32);
        self.messages.push(table);
        id
    }

    pub fn push_enum(&mut self, table: MiniTableEnum) -> EnumTableId {
        let id = EnumTableId(self.enums.len() as u32);
        self.enums.push(table);
        id
    }

    pub fn push_extension(&mut self, ext: MiniTableExtension) -> ExtensionId {
        let id = ExtensionId(self.extensions.len() as u32);
        self.extensions.push(ext);
        id
    }

    /// Decodes a message descriptor and stores the result.
    pub fn build_message(&mut self, data: &[u8], platform: Platform) -> Result<MiniTableId, DecodeError> {
        let table = decode_message(data, platform)?;
        Ok(self.push_message(table))
    }

    pub fn build_enum(&mut self, data: &[u8]) -> Result<EnumTableId, DecodeError> {
        let table = decode_enum(data)?;
        Ok(self.push_enum(table))
    }

    pub fn build_extension(
        &mut self,
        data: &[u8],
        extendee: MiniTableId,
        sub: Option<Sub>,
        platform: Platform,
    ) -> Result<ExtensionId, DecodeError> {
        let ext = decode_extension(data, self.message(extendee), extendee, sub, platform)?;
        Ok(self.push_extension(ext))
    }

    /// Table for `id`; [`MiniTableId::EMPTY`] yields the shared empty table.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this store.
    pub fn message(&self, id: MiniTableId) -> &MiniTable {
        if id.is_empty_table() {
            return &EMPTY_MINI_TABLE;
        }
        &self.messages[id.index()]
    }

    /// Mutable table for `id`. The shared empty table is immutable.
    pub fn message_mut(&mut self, id: MiniTableId) -> Option<&mut MiniTable> {
        if id.is_empty_table() {
            return None;
        }
        self.messages.get_mut(id.index())
    }

    pub fn enum_table(&self, id: EnumTableId) -> &MiniTableEnum {
        &self.enums[id.index()]
    }

    pub fn extension(&self, id: ExtensionId) -> &MiniTableExtension {
        &self.extensions[id.index()]
    }

    pub fn extension_mut(&mut self, id: ExtensionId) -> &mut MiniTableExtension {
        &mut self.extensions[id.index()]
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    pub fn enum_count(&self) -> usize {
        self.enums.len()
    }

    pub fn extension_count(&self) -> usize {
        self.extensions.len()
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            messages: self.messages.len(),
            enums: self.enums.len(),
            extensions: self.extensions.len(),
        }
    }

    /// Drops everything stored after `checkpoint`.
    pub fn truncate(&mut self, checkpoint: Checkpoint) {
        self.messages.truncate(checkpoint.messages);
        self.enums.truncate(checkpoint.enums);
        self.extensions.truncate(checkpoint.extensions);
    }
}
