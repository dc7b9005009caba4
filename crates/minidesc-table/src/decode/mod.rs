//! Mini descriptor decoder.
//!
//! Parsing collects fields into a scratch list together with a presence
//! class per field and the oneof groups. Layout then turns that scratch
//! state into hasbits and offsets.

mod enums;
mod layout;

#[cfg(test)]
mod enums_tests;

pub use enums::decode_enum;

use minidesc_core::lex::{decode_varint, from_base92};
use minidesc_core::{IntTable, Value};

use crate::constants::{MAX_FIELD_NUMBER, chars, encoded, field_modifier, version};
use crate::error::{DecodeError, DecodeErrorKind};
use crate::extension::MiniTableExtension;
use crate::field::MiniTableField;
use crate::modifiers::MessageModifiers;
use crate::table::{MiniTable, MiniTableId, Sub};
use crate::types::{ExtMode, FieldMode, FieldRep, FieldType, LabelFlags, Platform};

type Result<T> = std::result::Result<T, DecodeErrorKind>;

/// How a field records whether it is set, before hasbits are numbered.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Presence {
    None,
    Hasbit,
    Required,
    /// Member of the oneof at this index.
    Oneof(usize),
}

#[derive(Debug)]
struct Oneof {
    /// Field indices in declaration order.
    members: Vec<usize>,
    /// Largest member representation.
    rep: FieldRep,
}

struct MtDecoder<'a> {
    data: &'a [u8],
    pos: usize,
    platform: Platform,
    is_extension: bool,
    fields: Vec<MiniTableField>,
    presence: Vec<Presence>,
    by_number: IntTable,
    oneofs: Vec<Oneof>,
    ext: ExtMode,
    dense_below: Option<usize>,
    message_count: u16,
    enum_count: u16,
}

/// Builds the layout of a message, map entry or message set.
pub fn decode_message(data: &[u8], platform: Platform) -> std::result::Result<MiniTable, DecodeError> {
    let table = build_message(data, platform).map_err(DecodeError::Message)?;
    tracing::trace!(
        fields = table.field_count(),
        size = table.size(),
        "decoded mini table"
    );
    Ok(table)
}

/// Builds an extension of `extendee`.
///
/// `sub` is recorded verbatim; message and closed enum extensions may link
/// it later through [`MiniTableExtension::set_sub`].
pub fn decode_extension(
    data: &[u8],
    extendee: &MiniTable,
    extendee_id: MiniTableId,
    sub: Option<Sub>,
    platform: Platform,
) -> std::result::Result<MiniTableExtension, DecodeError> {
    build_extension(data, extendee, platform)
        .map(|field| MiniTableExtension {
            field,
            extendee: extendee_id,
            sub,
        })
        .map_err(DecodeError::Extension)
}

fn build_message(data: &[u8], platform: Platform) -> Result<MiniTable> {
    let Some((&vers, rest)) = data.split_first() else {
        return Ok(MiniTable::empty());
    };
    match vers {
        version::MESSAGE => {
            let mut d = MtDecoder::new(rest, platform, false);
            d.parse()?;
            d.into_message()
        }
        version::MAP => {
            let mut d = MtDecoder::new(rest, platform, false);
            d.parse()?;
            d.into_map_entry()
        }
        version::MESSAGE_SET => {
            if !rest.is_empty() {
                return Err(DecodeErrorKind::MessageSetLength(rest.len()));
            }
            let mut table = MiniTable::empty();
            table.ext = ExtMode::IS_MESSAGE_SET;
            Ok(table)
        }
        other => Err(DecodeErrorKind::InvalidMessageVersion(other as char)),
    }
}

fn build_extension(data: &[u8], extendee: &MiniTable, platform: Platform) -> Result<MiniTableField> {
    let rest = match data.split_first() {
        None => data,
        Some((&version::EXTENSION, rest)) => rest,
        Some((&other, _)) => return Err(DecodeErrorKind::InvalidExtensionVersion(other as char)),
    };
    let mut d = MtDecoder::new(rest, platform, true);
    d.parse()?;
    if d.fields.len() != 1 {
        return Err(DecodeErrorKind::ExtensionFieldCount(d.fields.len()));
    }
    let mut field = d.fields[0];

    field.insert_flags(LabelFlags::IS_EXTENSION);
    field.offset = 0;
    field.presence = 0;

    if extendee.is_message_set() && (!field.is_sub_message() || field.is_array()) {
        return Err(DecodeErrorKind::MessageSetExtension);
    }
    Ok(field)
}

impl<'a> MtDecoder<'a> {
    fn new(data: &'a [u8], platform: Platform, is_extension: bool) -> Self {
        Self {
            data,
            pos: 0,
            platform,
            is_extension,
            fields: Vec::new(),
            presence: Vec::new(),
            by_number: IntTable::new(),
            oneofs: Vec::new(),
            ext: ExtMode::empty(),
            dense_below: None,
            message_count: 0,
            enum_count: 0,
        }
    }

    fn next_char(&mut self) -> Option<u8> {
        let ch = *self.data.get(self.pos)?;
        self.pos += 1;
        Some(ch)
    }

    fn varint(&mut self, first: u8, min: u8, max: u8) -> Result<u32> {
        let (val, used) = decode_varint(&self.data[self.pos..], first, min, max)
            .ok_or(DecodeErrorKind::OverlongVarint)?;
        self.pos += used;
        Ok(val)
    }

    fn parse(&mut self) -> Result<()> {
        let mut msg_modifiers = MessageModifiers::empty();
        let mut last_number: u64 = 0;

        while let Some(ch) = self.next_char() {
            match ch {
                chars::MIN_FIELD..=chars::MAX_FIELD => {
                    last_number += 1;
                    if last_number > MAX_FIELD_NUMBER as u64 {
                        return Err(DecodeErrorKind::FieldNumberOutOfRange(last_number));
                    }
                    self.push_field(ch, last_number as u32, msg_modifiers)?;
                }
                chars::MIN_MODIFIER..=chars::MAX_MODIFIER => {
                    let bits = self.varint(ch, chars::MIN_MODIFIER, chars::MAX_MODIFIER)?;
                    if !self.fields.is_empty() {
                        self.modify_last_field(bits)?;
                    } else if self.is_extension {
                        return Err(DecodeErrorKind::ExtensionModifiers);
                    } else {
                        msg_modifiers = MessageModifiers::from_bits_retain(bits);
                        if msg_modifiers.contains(MessageModifiers::IS_EXTENDABLE) {
                            self.ext |= ExtMode::EXTENDABLE;
                        }
                    }
                }
                chars::END => {
                    if self.is_extension {
                        return Err(DecodeErrorKind::ExtensionOneof);
                    }
                    self.parse_oneofs()?;
                }
                chars::MIN_SKIP..=chars::MAX_SKIP => {
                    if self.dense_below.is_none() {
                        self.dense_below = Some(self.fields.len());
                    }
                    let skip = self.varint(ch, chars::MIN_SKIP, chars::MAX_SKIP)?;
                    if skip == 0 {
                        return Err(DecodeErrorKind::ZeroSkip);
                    }
                    // The next field adds the final 1.
                    last_number += skip as u64 - 1;
                }
                _ => return Err(DecodeErrorKind::InvalidChar(ch as char)),
            }
        }
        Ok(())
    }

    fn push_field(&mut self, ch: u8, number: u32, msg_modifiers: MessageModifiers) -> Result<()> {
        let mut code = from_base92(ch).ok_or(DecodeErrorKind::InvalidChar(ch as char))?;
        let repeated = code >= encoded::REPEATED_BASE;
        if repeated {
            code -= encoded::REPEATED_BASE;
        }
        let ty = FieldType::from_encoded(code).ok_or(DecodeErrorKind::InvalidFieldType(code))?;

        let mut field = MiniTableField::new(number, ty);
        let presence = if repeated {
            field.set_mode(FieldMode::Array);
            field.set_rep(FieldRep::pointer(self.platform));
            Presence::None
        } else {
            field.set_mode(FieldMode::Scalar);
            field.set_rep(scalar_rep(ty, self.platform));
            Presence::Hasbit
        };

        if code == encoded::OPEN_ENUM {
            field.descriptor_type = FieldType::Int32;
            field.insert_flags(LabelFlags::IS_ALTERNATE);
        } else if ty == FieldType::String && !msg_modifiers.contains(MessageModifiers::VALIDATE_UTF8) {
            field.descriptor_type = FieldType::Bytes;
            field.insert_flags(LabelFlags::IS_ALTERNATE);
        }
        if field.is_packable() && msg_modifiers.contains(MessageModifiers::DEFAULT_IS_PACKED) {
            field.insert_flags(LabelFlags::IS_PACKED);
        }

        if field.is_sub_message() {
            field.sub_index = self.message_count;
            self.message_count += 1;
        } else if field.is_closed_enum() {
            // Rebased past the message subs once all fields are known.
            field.sub_index = self.enum_count;
            self.enum_count += 1;
        }

        self.by_number
            .insert(number as u64, Value::from_ptr(self.fields.len()));
        self.fields.push(field);
        self.presence.push(presence);
        Ok(())
    }

    fn modify_last_field(&mut self, bits: u32) -> Result<()> {
        let index = self.fields.len() - 1;
        let field = &mut self.fields[index];
        let number = field.number;

        if bits & field_modifier::FLIP_PACKED != 0 {
            if !field.is_packable() {
                return Err(DecodeErrorKind::FlipPackedOnUnpackable(number));
            }
            field.toggle_flags(LabelFlags::IS_PACKED);
        }

        if bits & field_modifier::FLIP_VALIDATE_UTF8 != 0 {
            if field.descriptor_type != FieldType::Bytes || !field.is_alternate() {
                return Err(DecodeErrorKind::FlipValidateUtf8(number));
            }
            field.descriptor_type = FieldType::String;
            field.remove_flags(LabelFlags::IS_ALTERNATE);
        }

        let singular = bits & field_modifier::IS_PROTO3_SINGULAR != 0;
        let required = bits & field_modifier::IS_REQUIRED != 0;

        if (singular || required) && self.presence[index] != Presence::Hasbit {
            return Err(DecodeErrorKind::ModifierWithoutHasbit(number));
        }
        if singular && required {
            return Err(DecodeErrorKind::SingularAndRequired(number));
        }
        if singular && field.is_sub_message() {
            return Err(DecodeErrorKind::SingularSubMessage(number));
        }

        if singular {
            self.presence[index] = Presence::None;
        }
        if required {
            self.presence[index] = Presence::Required;
        }
        Ok(())
    }

    // ============================================================
    // Oneofs
    // ============================================================

    fn parse_oneofs(&mut self) -> Result<()> {
        let mut current = self.new_oneof();
        while let Some(ch) = self.next_char() {
            match ch {
                chars::FIELD_SEPARATOR => {}
                chars::ONEOF_SEPARATOR => {
                    let done = std::mem::replace(&mut current, self.new_oneof());
                    self.push_oneof(done)?;
                }
                chars::MIN_ONEOF_FIELD..=chars::MAX_ONEOF_FIELD => {
                    self.add_oneof_member(ch, &mut current)?;
                }
                _ => return Err(DecodeErrorKind::InvalidChar(ch as char)),
            }
        }
        self.push_oneof(current)
    }

    fn new_oneof(&self) -> Oneof {
        Oneof {
            members: Vec::new(),
            rep: FieldRep::OneByte,
        }
    }

    fn add_oneof_member(&mut self, first: u8, oneof: &mut Oneof) -> Result<()> {
        let number = self.varint(first, chars::MIN_ONEOF_FIELD, chars::MAX_ONEOF_FIELD)?;
        let index = self
            .by_number
            .lookup(number as u64)
            .ok_or(DecodeErrorKind::NoSuchOneofField(number))?
            .as_ptr();

        match self.presence[index] {
            Presence::Hasbit => {}
            Presence::Oneof(_) => return Err(DecodeErrorKind::DuplicateOneofField(number)),
            Presence::None | Presence::Required => {
                return Err(DecodeErrorKind::InvalidOneofField(number));
            }
        }

        let rep = self.fields[index].rep();
        if rep.size(self.platform) > oneof.rep.size(self.platform) {
            oneof.rep = rep;
        }
        oneof.members.push(index);
        self.presence[index] = Presence::Oneof(self.oneofs.len());
        Ok(())
    }

    fn push_oneof(&mut self, oneof: Oneof) -> Result<()> {
        if oneof.members.is_empty() {
            return Err(DecodeErrorKind::EmptyOneof);
        }
        self.oneofs.push(oneof);
        Ok(())
    }

    // ============================================================
    // Table assembly
    // ============================================================

    /// Allocates the sub list: message slots first, then enum slots.
    fn take_subs(&mut self) -> Vec<Sub> {
        let message_count = self.message_count;
        for field in &mut self.fields {
            if field.is_closed_enum() {
                field.sub_index += message_count;
            }
        }
        let mut subs = vec![Sub::Message(MiniTableId::EMPTY); message_count as usize];
        subs.extend(std::iter::repeat_n(Sub::Enum(None), self.enum_count as usize));
        subs
    }

    fn base_table(&mut self) -> MiniTable {
        let subs = self.take_subs();
        let dense_below = self.dense_below.unwrap_or(self.fields.len());
        MiniTable {
            fields: std::mem::take(&mut self.fields),
            subs,
            size: 0,
            ext: self.ext,
            dense_below: dense_below as u16,
            table_mask: -1,
            required_count: 0,
        }
    }

    fn into_message(mut self) -> Result<MiniTable> {
        let hasbits = layout::assign_hasbits(&mut self.fields, &self.presence)?;
        let items = layout::sort_items(&self.fields, &self.presence, &self.oneofs);
        let size = layout::assign_offsets(
            &mut self.fields,
            &self.oneofs,
            &items,
            hasbits.size,
            self.platform,
        )?;

        let mut table = self.base_table();
        table.size = size;
        table.required_count = hasbits.required_count;
        Ok(table)
    }

    fn into_map_entry(mut self) -> Result<MiniTable> {
        let hasbits = layout::assign_hasbits(&mut self.fields, &self.presence)?;

        if self.fields.len() != 2 {
            return Err(DecodeErrorKind::MapFieldCount(self.fields.len()));
        }
        if !self.oneofs.is_empty() {
            return Err(DecodeErrorKind::MapOneof);
        }
        validate_entry_field(&self.fields[0], 1)?;
        validate_entry_field(&self.fields[1], 2)?;

        let entry = layout::MapEntryLayout::for_platform(self.platform);
        self.fields[0].offset = entry.key_offset;
        self.fields[1].offset = entry.value_offset;

        let mut table = self.base_table();
        table.size = entry.size;
        table.required_count = hasbits.required_count;
        table.ext |= ExtMode::IS_MAP_ENTRY;
        Ok(table)
    }
}

/// Storage class of a singular, non-message field.
fn scalar_rep(ty: FieldType, platform: Platform) -> FieldRep {
    match ty {
        FieldType::Bool => FieldRep::OneByte,
        FieldType::String | FieldType::Bytes => FieldRep::StringView,
        FieldType::Double
        | FieldType::Int64
        | FieldType::UInt64
        | FieldType::Fixed64
        | FieldType::SFixed64
        | FieldType::SInt64 => FieldRep::EightByte,
        FieldType::Group | FieldType::Message => FieldRep::pointer(platform),
        FieldType::Float
        | FieldType::Int32
        | FieldType::UInt32
        | FieldType::Fixed32
        | FieldType::SFixed32
        | FieldType::SInt32
        | FieldType::Enum => FieldRep::FourByte,
    }
}

fn validate_entry_field(field: &MiniTableField, expected: u32) -> Result<()> {
    let name = if expected == 1 { "key" } else { "val" };
    if field.number != expected {
        return Err(DecodeErrorKind::MapFieldNumber {
            name,
            expected,
            actual: field.number,
        });
    }
    if !field.is_scalar() {
        return Err(DecodeErrorKind::MapFieldNotScalar(name));
    }
    let ty = field.field_type();
    let rejected = if expected == 1 {
        matches!(
            ty,
            FieldType::Float
                | FieldType::Double
                | FieldType::Message
                | FieldType::Group
                | FieldType::Bytes
                | FieldType::Enum
        )
    } else {
        ty == FieldType::Group
    };
    if rejected {
        return Err(DecodeErrorKind::MapFieldType { name, ty });
    }
    Ok(())
}
