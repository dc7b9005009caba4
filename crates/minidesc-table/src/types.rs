//! Field and table kind definitions shared by the codec, the layout engine
//! and the reflective layer.

use bitflags::bitflags;

use crate::constants::encoded;

/// Wire-level field type, numbered as in `FieldDescriptorProto.Type`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldType {
    Double = 1,
    Float = 2,
    Int64 = 3,
    UInt64 = 4,
    Int32 = 5,
    Fixed64 = 6,
    Fixed32 = 7,
    Bool = 8,
    String = 9,
    Group = 10,
    Message = 11,
    Bytes = 12,
    UInt32 = 13,
    Enum = 14,
    SFixed32 = 15,
    SFixed64 = 16,
    SInt32 = 17,
    SInt64 = 18,
}

impl FieldType {
    /// Convert from raw discriminant.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            1 => Self::Double,
            2 => Self::Float,
            3 => Self::Int64,
            4 => Self::UInt64,
            5 => Self::Int32,
            6 => Self::Fixed64,
            7 => Self::Fixed32,
            8 => Self::Bool,
            9 => Self::String,
            10 => Self::Group,
            11 => Self::Message,
            12 => Self::Bytes,
            13 => Self::UInt32,
            14 => Self::Enum,
            15 => Self::SFixed32,
            16 => Self::SFixed64,
            17 => Self::SInt32,
            18 => Self::SInt64,
            _ => return None,
        })
    }

    /// The in-memory value class for this wire type.
    pub fn ctype(self) -> CType {
        match self {
            Self::Double => CType::Double,
            Self::Float => CType::Float,
            Self::Int64 | Self::SFixed64 | Self::SInt64 => CType::Int64,
            Self::UInt64 | Self::Fixed64 => CType::UInt64,
            Self::Int32 | Self::SFixed32 | Self::SInt32 => CType::Int32,
            Self::UInt32 | Self::Fixed32 => CType::UInt32,
            Self::Bool => CType::Bool,
            Self::String => CType::String,
            Self::Bytes => CType::Bytes,
            Self::Group | Self::Message => CType::Message,
            Self::Enum => CType::Enum,
        }
    }

    /// Whether repeated values of this type may use the packed encoding.
    pub fn is_packable(self) -> bool {
        !matches!(
            self,
            Self::String | Self::Bytes | Self::Group | Self::Message
        )
    }

    pub fn is_sub_message(self) -> bool {
        matches!(self, Self::Group | Self::Message)
    }

    /// Type code used in mini descriptors. Closed enums are encoded by the
    /// caller, since the wire type alone cannot tell them apart.
    pub(crate) fn encoded(self) -> u8 {
        match self {
            Self::Double => encoded::DOUBLE,
            Self::Float => encoded::FLOAT,
            Self::Fixed32 => encoded::FIXED32,
            Self::Fixed64 => encoded::FIXED64,
            Self::SFixed32 => encoded::SFIXED32,
            Self::SFixed64 => encoded::SFIXED64,
            Self::Int32 => encoded::INT32,
            Self::UInt32 => encoded::UINT32,
            Self::SInt32 => encoded::SINT32,
            Self::Int64 => encoded::INT64,
            Self::UInt64 => encoded::UINT64,
            Self::SInt64 => encoded::SINT64,
            Self::Enum => encoded::OPEN_ENUM,
            Self::Bool => encoded::BOOL,
            Self::Bytes => encoded::BYTES,
            Self::String => encoded::STRING,
            Self::Group => encoded::GROUP,
            Self::Message => encoded::MESSAGE,
        }
    }

    /// Inverse of [`FieldType::encoded`]; closed enums map to `Enum`.
    pub(crate) fn from_encoded(code: u8) -> Option<Self> {
        Some(match code {
            encoded::DOUBLE => Self::Double,
            encoded::FLOAT => Self::Float,
            encoded::FIXED32 => Self::Fixed32,
            encoded::FIXED64 => Self::Fixed64,
            encoded::SFIXED32 => Self::SFixed32,
            encoded::SFIXED64 => Self::SFixed64,
            encoded::INT32 => Self::Int32,
            encoded::UINT32 => Self::UInt32,
            encoded::SINT32 => Self::SInt32,
            encoded::INT64 => Self::Int64,
            encoded::UINT64 => Self::UInt64,
            encoded::SINT64 => Self::SInt64,
            encoded::OPEN_ENUM | encoded::CLOSED_ENUM => Self::Enum,
            encoded::BOOL => Self::Bool,
            encoded::BYTES => Self::Bytes,
            encoded::STRING => Self::String,
            encoded::GROUP => Self::Group,
            encoded::MESSAGE => Self::Message,
            _ => return None,
        })
    }
}

/// In-memory value class of a field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum CType {
    Bool = 1,
    Float = 2,
    Int32 = 3,
    UInt32 = 4,
    Enum = 5,
    Message = 6,
    Double = 7,
    Int64 = 8,
    UInt64 = 9,
    String = 10,
    Bytes = 11,
}

/// Cardinality of a field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
#[repr(u8)]
pub enum FieldMode {
    Map = 0,
    Array = 1,
    Scalar = 2,
}

impl FieldMode {
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::Map,
            1 => Self::Array,
            _ => Self::Scalar,
        }
    }
}

/// Storage class of a field's slot. Ordering is layout order: smaller
/// representations are placed first.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
#[repr(u8)]
pub enum FieldRep {
    OneByte = 0,
    FourByte = 1,
    StringView = 2,
    EightByte = 3,
}

impl FieldRep {
    pub(crate) fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0 => Self::OneByte,
            1 => Self::FourByte,
            2 => Self::StringView,
            _ => Self::EightByte,
        }
    }

    /// Slot size in bytes.
    pub fn size(self, platform: Platform) -> usize {
        match (self, platform) {
            (Self::OneByte, _) => 1,
            (Self::FourByte, _) => 4,
            (Self::StringView, Platform::Bits32) => 8,
            (Self::StringView, Platform::Bits64) => 16,
            (Self::EightByte, _) => 8,
        }
    }

    /// Slot alignment in bytes.
    pub fn align(self, platform: Platform) -> usize {
        match (self, platform) {
            (Self::OneByte, _) => 1,
            (Self::FourByte, _) => 4,
            (Self::StringView, Platform::Bits32) => 4,
            (Self::StringView, Platform::Bits64) => 8,
            (Self::EightByte, _) => 8,
        }
    }

    /// Representation of a pointer-sized slot.
    pub fn pointer(platform: Platform) -> Self {
        match platform {
            Platform::Bits32 => Self::FourByte,
            Platform::Bits64 => Self::EightByte,
        }
    }
}

/// Target pointer width that layouts are computed for.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum Platform {
    Bits32,
    #[default]
    Bits64,
}

impl Platform {
    /// Pointer width of the running process.
    pub fn native() -> Self {
        if cfg!(target_pointer_width = "32") {
            Self::Bits32
        } else {
            Self::Bits64
        }
    }
}

bitflags! {
    /// Flags stored above the mode and representation bits of a field.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
    pub struct LabelFlags: u8 {
        const IS_PACKED = 1 << 4;
        const IS_EXTENSION = 1 << 5;
        /// Open enums decode as `Int32` and unvalidated strings as `Bytes`;
        /// this flag recovers the logical type.
        const IS_ALTERNATE = 1 << 6;
    }
}

bitflags! {
    /// Extension capabilities of a message table.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct ExtMode: u8 {
        const EXTENDABLE = 1;
        const IS_MESSAGE_SET = 2;
        const IS_MAP_ENTRY = 4;
    }
}
