//! Extension layout records.

use crate::field::MiniTableField;
use crate::table::{MiniTableId, Sub};

/// Handle of a [`MiniTableExtension`] inside a [`crate::MiniTables`] store.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ExtensionId(pub(crate) u32);

impl ExtensionId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A field declared outside the message it extends.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MiniTableExtension {
    pub(crate) field: MiniTableField,
    pub(crate) extendee: MiniTableId,
    pub(crate) sub: Option<Sub>,
}

impl MiniTableExtension {
    pub fn field(&self) -> &MiniTableField {
        &self.field
    }

    pub fn number(&self) -> u32 {
        self.field.number()
    }

    pub fn extendee(&self) -> MiniTableId {
        self.extendee
    }

    /// Sub-table of a message or closed enum extension.
    pub fn sub(&self) -> Option<Sub> {
        self.sub
    }

    pub fn set_sub(&mut self, sub: Sub) {
        self.sub = Some(sub);
    }
}
