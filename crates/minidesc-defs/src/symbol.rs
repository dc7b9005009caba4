//! Symbol table payloads.
//!
//! The pool keeps one name table for every kind of def. Each value carries
//! its kind in the low three bits and the def index above them.

use minidesc_core::Value;

use crate::ids::{EnumId, EnumValueId, FieldId, MessageId, ServiceId};

const TAG_BITS: u32 = 3;
const TAG_MASK: u64 = (1 << TAG_BITS) - 1;

const TAG_MESSAGE: u64 = 0;
const TAG_ENUM: u64 = 1;
const TAG_ENUM_VALUE: u64 = 2;
const TAG_EXTENSION: u64 = 3;
const TAG_SERVICE: u64 = 4;

/// A def registered under a full name.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DefRef {
    Message(MessageId),
    Enum(EnumId),
    EnumValue(EnumValueId),
    Extension(FieldId),
    Service(ServiceId),
}

impl DefRef {
    pub(crate) fn to_value(self) -> Value {
        let (tag, index) = match self {
            Self::Message(id) => (TAG_MESSAGE, id.0),
            Self::Enum(id) => (TAG_ENUM, id.0),
            Self::EnumValue(id) => (TAG_ENUM_VALUE, id.0),
            Self::Extension(id) => (TAG_EXTENSION, id.0),
            Self::Service(id) => (TAG_SERVICE, id.0),
        };
        Value::from_u64(((index as u64) << TAG_BITS) | tag)
    }

    pub(crate) fn from_value(value: Value) -> Option<Self> {
        let raw = value.as_u64();
        let index = (raw >> TAG_BITS) as u32;
        Some(match raw & TAG_MASK {
            TAG_MESSAGE => Self::Message(MessageId(index)),
            TAG_ENUM => Self::Enum(EnumId(index)),
            TAG_ENUM_VALUE => Self::EnumValue(EnumValueId(index)),
            TAG_EXTENSION => Self::Extension(FieldId(index)),
            TAG_SERVICE => Self::Service(ServiceId(index)),
            _ => return None,
        })
    }

    /// Kind name used in error messages.
    pub fn kind_name(self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Enum(_) => "enum",
            Self::EnumValue(_) => "enum value",
            Self::Extension(_) => "extension",
            Self::Service(_) => "service",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_survives_large_indices() {
        let refs = [
            DefRef::Message(MessageId(0)),
            DefRef::Extension(FieldId(u32::MAX)),
            DefRef::Service(ServiceId(12345)),
        ];
        for r in refs {
            assert_eq!(DefRef::from_value(r.to_value()), Some(r));
        }
    }

    #[test]
    fn unknown_tag() {
        assert_eq!(DefRef::from_value(Value::from_u64(7)), None);
    }
}
