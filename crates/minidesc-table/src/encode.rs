//! Mini descriptor encoder.
//!
//! A streaming writer: callers open a message, enum, map or extension and
//! feed its parts in order. Each token is appended to an owned buffer.

use minidesc_core::lex::{encode_varint, to_base92};

use crate::constants::{MAX_FIELD_NUMBER, MIN_EMIT_BUDGET, chars, encoded, field_modifier, version};
use crate::error::EncodeError;
use crate::modifiers::{FieldModifiers, MessageModifiers};
use crate::types::FieldType;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum OneofState {
    NotStarted,
    Started,
    EmittedField,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum State {
    Idle,
    Message {
        modifiers: MessageModifiers,
        last_field: u32,
        oneof: OneofState,
    },
    Enum {
        present_mask: u64,
        last_written: u32,
        last_value: Option<u32>,
    },
}

/// Builds the compact text form of a message, enum, map or extension.
#[derive(Clone, Debug)]
pub struct MtDataEncoder {
    buf: String,
    state: State,
}

impl Default for MtDataEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl MtDataEncoder {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            state: State::Idle,
        }
    }

    /// Encoded text so far.
    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn finish(self) -> String {
        self.buf
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.state = State::Idle;
    }

    fn put_raw(&mut self, ch: u8) {
        self.buf.reserve(MIN_EMIT_BUDGET);
        self.buf.push(ch as char);
    }

    fn put(&mut self, digit: u8) {
        self.put_raw(to_base92(digit));
    }

    fn put_varint(&mut self, val: u32, min: u8, max: u8) {
        self.buf.reserve(MIN_EMIT_BUDGET);
        encode_varint(&mut self.buf, val, min, max);
    }

    fn put_modifier(&mut self, bits: u32) {
        if bits != 0 {
            self.put_varint(bits, chars::MIN_MODIFIER, chars::MAX_MODIFIER);
        }
    }

    fn reset_message(&mut self, modifiers: MessageModifiers) {
        self.state = State::Message {
            modifiers,
            last_field: 0,
            oneof: OneofState::NotStarted,
        };
    }

    // ============================================================
    // Messages
    // ============================================================

    /// Opens a message whose fields default to `modifiers`.
    pub fn start_message(&mut self, modifiers: MessageModifiers) {
        self.reset_message(modifiers);
        self.put_raw(version::MESSAGE);
        self.put_modifier(modifiers.bits());
    }

    /// Appends a field. Numbers must strictly increase within a message.
    pub fn put_field(
        &mut self,
        ty: FieldType,
        number: u32,
        modifiers: FieldModifiers,
    ) -> Result<(), EncodeError> {
        let State::Message {
            modifiers: msg_modifiers,
            last_field,
            oneof: OneofState::NotStarted,
        } = self.state
        else {
            return Err(EncodeError::InvalidState("put_field"));
        };
        if number == 0 || number > MAX_FIELD_NUMBER {
            return Err(EncodeError::FieldNumberOutOfRange(number));
        }
        if number <= last_field {
            return Err(EncodeError::FieldOutOfOrder {
                number,
                last: last_field,
            });
        }
        let wire_modifiers = encoded_modifiers(ty, number, modifiers, msg_modifiers)?;
        let mut code = ty.encoded();
        if modifiers.contains(FieldModifiers::IS_CLOSED_ENUM) {
            if ty != FieldType::Enum {
                return Err(EncodeError::ClosedEnumType(ty));
            }
            code = encoded::CLOSED_ENUM;
        }
        if modifiers.contains(FieldModifiers::IS_REPEATED) {
            code += encoded::REPEATED_BASE;
        }

        if number != last_field + 1 {
            self.put_varint(number - last_field, chars::MIN_SKIP, chars::MAX_SKIP);
        }
        self.put(code);
        self.put_modifier(wire_modifiers);

        if let State::Message { last_field, .. } = &mut self.state {
            *last_field = number;
        }
        Ok(())
    }

    /// Begins a oneof group. All regular fields must precede it.
    pub fn start_oneof(&mut self) -> Result<(), EncodeError> {
        let State::Message { oneof, .. } = &mut self.state else {
            return Err(EncodeError::InvalidState("start_oneof"));
        };
        let marker = if *oneof == OneofState::NotStarted {
            chars::END
        } else {
            chars::ONEOF_SEPARATOR
        };
        *oneof = OneofState::Started;
        self.put_raw(marker);
        Ok(())
    }

    /// Adds a previously declared field to the current oneof.
    pub fn put_oneof_field(&mut self, number: u32) -> Result<(), EncodeError> {
        let State::Message { oneof, .. } = &mut self.state else {
            return Err(EncodeError::InvalidState("put_oneof_field"));
        };
        let separate = match *oneof {
            OneofState::NotStarted => return Err(EncodeError::InvalidState("put_oneof_field")),
            OneofState::Started => false,
            OneofState::EmittedField => true,
        };
        *oneof = OneofState::EmittedField;
        if separate {
            self.put_raw(chars::FIELD_SEPARATOR);
        }
        self.put_varint(number, chars::MIN_ONEOF_FIELD, chars::MAX_ONEOF_FIELD);
        Ok(())
    }

    /// Encodes a complete extension field.
    pub fn encode_extension(
        &mut self,
        ty: FieldType,
        number: u32,
        modifiers: FieldModifiers,
    ) -> Result<(), EncodeError> {
        self.reset_message(MessageModifiers::empty());
        self.put_raw(version::EXTENSION);
        self.put_field(ty, number, modifiers)
    }

    /// Encodes a complete map entry with key field 1 and value field 2.
    pub fn encode_map(
        &mut self,
        key_type: FieldType,
        value_type: FieldType,
        key_modifiers: FieldModifiers,
        value_modifiers: FieldModifiers,
    ) -> Result<(), EncodeError> {
        self.reset_message(MessageModifiers::empty());
        self.put_raw(version::MAP);
        self.put_field(key_type, 1, key_modifiers)?;
        self.put_field(value_type, 2, value_modifiers)
    }

    pub fn encode_message_set(&mut self) {
        self.state = State::Idle;
        self.put_raw(version::MESSAGE_SET);
    }

    // ============================================================
    // Enums
    // ============================================================

    pub fn start_enum(&mut self) {
        self.state = State::Enum {
            present_mask: 0,
            last_written: 0,
            last_value: None,
        };
        self.put_raw(version::ENUM);
    }

    /// Adds a value. Values must strictly increase.
    pub fn put_enum_value(&mut self, value: u32) -> Result<(), EncodeError> {
        let State::Enum {
            mut present_mask,
            mut last_written,
            last_value,
        } = self.state
        else {
            return Err(EncodeError::InvalidState("put_enum_value"));
        };
        if let Some(last) = last_value.filter(|&last| value <= last) {
            return Err(EncodeError::EnumValueOutOfOrder { value, last });
        }

        let mut delta = value - last_written;
        if delta >= 5 && present_mask != 0 {
            self.put(present_mask as u8);
            present_mask = 0;
            last_written += 5;
            delta -= 5;
        }
        if delta >= 5 {
            self.put_varint(delta, chars::MIN_SKIP, chars::MAX_SKIP);
            last_written += delta;
            delta = 0;
        }
        debug_assert_eq!(present_mask >> delta, 0);
        present_mask |= 1 << delta;

        self.state = State::Enum {
            present_mask,
            last_written,
            last_value: Some(value),
        };
        Ok(())
    }

    /// Flushes the pending value mask and closes the enum.
    pub fn end_enum(&mut self) -> Result<(), EncodeError> {
        let State::Enum { present_mask, .. } = self.state else {
            return Err(EncodeError::InvalidState("end_enum"));
        };
        if present_mask != 0 {
            self.put(present_mask as u8);
        }
        self.state = State::Idle;
        Ok(())
    }
}

/// Modifier bits a field needs relative to its message defaults.
fn encoded_modifiers(
    ty: FieldType,
    number: u32,
    modifiers: FieldModifiers,
    msg_modifiers: MessageModifiers,
) -> Result<u32, EncodeError> {
    let mut bits = 0;
    if modifiers.contains(FieldModifiers::IS_REPEATED) && ty.is_packable() {
        let packed = modifiers.contains(FieldModifiers::IS_PACKED);
        let default_packed = msg_modifiers.contains(MessageModifiers::DEFAULT_IS_PACKED);
        if packed != default_packed {
            bits |= field_modifier::FLIP_PACKED;
        }
    }
    if ty == FieldType::String {
        let validates = modifiers.contains(FieldModifiers::VALIDATE_UTF8);
        let message_validates = msg_modifiers.contains(MessageModifiers::VALIDATE_UTF8);
        if validates != message_validates {
            // Only a non-validating message may be tightened per field.
            if message_validates {
                return Err(EncodeError::Utf8Downgrade(number));
            }
            bits |= field_modifier::FLIP_VALIDATE_UTF8;
        }
    }
    if modifiers.contains(FieldModifiers::IS_PROTO3_SINGULAR) {
        bits |= field_modifier::IS_PROTO3_SINGULAR;
    }
    if modifiers.contains(FieldModifiers::IS_REQUIRED) {
        bits |= field_modifier::IS_REQUIRED;
    }
    Ok(bits)
}
