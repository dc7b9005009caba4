//! Per-field layout record.

use crate::constants::NO_SUB;
use crate::types::{CType, FieldMode, FieldRep, FieldType, LabelFlags};

const MODE_MASK: u8 = 0b0000_0011;
const REP_SHIFT: u8 = 2;
const REP_MASK: u8 = 0b0000_1100;

/// Layout of one field inside a message.
///
/// `presence` is positive for a hasbit index, negative for the bitwise
/// complement of the oneof case offset, and zero for implicit presence.
/// `mode` packs the [`FieldMode`] in bits 0-1, the [`FieldRep`] in bits 2-3
/// and [`LabelFlags`] above that.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct MiniTableField {
    pub(crate) number: u32,
    pub(crate) offset: u16,
    pub(crate) presence: i32,
    pub(crate) sub_index: u16,
    pub(crate) descriptor_type: FieldType,
    pub(crate) mode: u8,
}

impl MiniTableField {
    pub(crate) fn new(number: u32, descriptor_type: FieldType) -> Self {
        Self {
            number,
            offset: 0,
            presence: 0,
            sub_index: NO_SUB,
            descriptor_type,
            mode: FieldMode::Scalar as u8,
        }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Byte offset of the field's slot inside the message.
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub fn presence(&self) -> i32 {
        self.presence
    }

    pub fn hasbit_index(&self) -> Option<u32> {
        (self.presence > 0).then_some(self.presence as u32)
    }

    /// Offset of the shared case slot, for oneof members.
    pub fn oneof_case_offset(&self) -> Option<u16> {
        (self.presence < 0).then_some(!self.presence as u16)
    }

    pub fn is_in_oneof(&self) -> bool {
        self.presence < 0
    }

    pub fn has_presence(&self) -> bool {
        self.presence != 0
    }

    /// Slot in the owning table's sub list.
    pub fn sub_index(&self) -> Option<u16> {
        (self.sub_index != NO_SUB).then_some(self.sub_index)
    }

    /// Type as stored, before the alternate flag is applied.
    pub fn descriptor_type(&self) -> FieldType {
        self.descriptor_type
    }

    /// Logical type: open enums and unvalidated strings are restored from
    /// their alternate storage types.
    pub fn field_type(&self) -> FieldType {
        if self.is_alternate() {
            match self.descriptor_type {
                FieldType::Int32 => return FieldType::Enum,
                FieldType::Bytes => return FieldType::String,
                _ => {}
            }
        }
        self.descriptor_type
    }

    pub fn ctype(&self) -> CType {
        self.field_type().ctype()
    }

    /// The packed mode byte.
    pub fn raw_mode(&self) -> u8 {
        self.mode
    }

    pub fn mode(&self) -> FieldMode {
        FieldMode::from_bits(self.mode & MODE_MASK)
    }

    pub fn rep(&self) -> FieldRep {
        FieldRep::from_bits((self.mode & REP_MASK) >> REP_SHIFT)
    }

    pub fn flags(&self) -> LabelFlags {
        LabelFlags::from_bits_truncate(self.mode)
    }

    pub fn is_scalar(&self) -> bool {
        self.mode() == FieldMode::Scalar
    }

    pub fn is_array(&self) -> bool {
        self.mode() == FieldMode::Array
    }

    pub fn is_map(&self) -> bool {
        self.mode() == FieldMode::Map
    }

    pub fn is_packed(&self) -> bool {
        self.flags().contains(LabelFlags::IS_PACKED)
    }

    pub fn is_extension(&self) -> bool {
        self.flags().contains(LabelFlags::IS_EXTENSION)
    }

    pub fn is_alternate(&self) -> bool {
        self.flags().contains(LabelFlags::IS_ALTERNATE)
    }

    pub fn is_sub_message(&self) -> bool {
        self.descriptor_type.is_sub_message()
    }

    /// Open enums are stored as `Int32`, so only closed enums match here.
    pub fn is_closed_enum(&self) -> bool {
        self.descriptor_type == FieldType::Enum
    }

    /// Whether a repeated field of this type may be packed.
    pub fn is_packable(&self) -> bool {
        self.is_array() && self.descriptor_type.is_packable()
    }

    pub(crate) fn set_mode(&mut self, mode: FieldMode) {
        self.mode = (self.mode & !MODE_MASK) | mode as u8;
    }

    pub(crate) fn set_rep(&mut self, rep: FieldRep) {
        self.mode = (self.mode & !REP_MASK) | ((rep as u8) << REP_SHIFT);
    }

    pub(crate) fn insert_flags(&mut self, flags: LabelFlags) {
        self.mode |= flags.bits();
    }

    pub(crate) fn remove_flags(&mut self, flags: LabelFlags) {
        self.mode &= !flags.bits();
    }

    pub(crate) fn toggle_flags(&mut self, flags: LabelFlags) {
        self.mode ^= flags.bits();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_byte_packs_mode_rep_and_flags() {
        let mut f = MiniTableField::new(1, FieldType::Int32);
        f.set_mode(FieldMode::Array);
        f.set_rep(FieldRep::EightByte);
        f.insert_flags(LabelFlags::IS_PACKED);

        assert_eq!(f.mode(), FieldMode::Array);
        assert_eq!(f.rep(), FieldRep::EightByte);
        assert!(f.is_packed());
        assert_eq!(f.raw_mode(), 0b0001_1101);

        f.toggle_flags(LabelFlags::IS_PACKED);
        assert!(!f.is_packed());
        f.set_mode(FieldMode::Map);
        assert_eq!(f.rep(), FieldRep::EightByte);
    }

    #[test]
    fn alternate_restores_logical_type() {
        let mut f = MiniTableField::new(1, FieldType::Int32);
        f.insert_flags(LabelFlags::IS_ALTERNATE);
        assert_eq!(f.field_type(), FieldType::Enum);
        assert_eq!(f.ctype(), CType::Enum);
        assert!(!f.is_closed_enum());

        let mut s = MiniTableField::new(2, FieldType::Bytes);
        s.insert_flags(LabelFlags::IS_ALTERNATE);
        assert_eq!(s.field_type(), FieldType::String);
        s.remove_flags(LabelFlags::IS_ALTERNATE);
        assert_eq!(s.field_type(), FieldType::Bytes);
    }

    #[test]
    fn presence_kinds() {
        let mut f = MiniTableField::new(1, FieldType::Bool);
        assert!(!f.has_presence());

        f.presence = 64;
        assert_eq!(f.hasbit_index(), Some(64));
        assert_eq!(f.oneof_case_offset(), None);

        f.presence = !12;
        assert!(f.is_in_oneof());
        assert_eq!(f.oneof_case_offset(), Some(12));
        assert_eq!(f.hasbit_index(), None);
    }
}
