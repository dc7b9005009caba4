//! Mini descriptor format constants.

/// Type codes of the field characters `' '..='I'`.
pub mod encoded {
    pub const DOUBLE: u8 = 0;
    pub const FLOAT: u8 = 1;
    pub const FIXED32: u8 = 2;
    pub const FIXED64: u8 = 3;
    pub const SFIXED32: u8 = 4;
    pub const SFIXED64: u8 = 5;
    pub const INT32: u8 = 6;
    pub const UINT32: u8 = 7;
    pub const SINT32: u8 = 8;
    pub const INT64: u8 = 9;
    pub const UINT64: u8 = 10;
    pub const SINT64: u8 = 11;
    pub const OPEN_ENUM: u8 = 12;
    pub const BOOL: u8 = 13;
    pub const BYTES: u8 = 14;
    pub const STRING: u8 = 15;
    pub const GROUP: u8 = 16;
    pub const MESSAGE: u8 = 17;
    pub const CLOSED_ENUM: u8 = 18;

    /// Repeated fields add this to the singular code.
    pub const REPEATED_BASE: u8 = 20;
}

/// Per-field modifier bits as they appear in the stream.
pub mod field_modifier {
    pub const FLIP_PACKED: u32 = 1;
    pub const IS_REQUIRED: u32 = 2;
    pub const IS_PROTO3_SINGULAR: u32 = 4;
    pub const FLIP_VALIDATE_UTF8: u32 = 8;
}

/// Character classes of the encoding.
pub mod chars {
    pub const MIN_FIELD: u8 = b' ';
    pub const MAX_FIELD: u8 = b'I';
    pub const MIN_MODIFIER: u8 = b'L';
    pub const MAX_MODIFIER: u8 = b'[';
    pub const END: u8 = b'^';
    pub const MIN_SKIP: u8 = b'_';
    pub const MAX_SKIP: u8 = b'~';
    pub const FIELD_SEPARATOR: u8 = b'|';
    pub const ONEOF_SEPARATOR: u8 = b'~';
    pub const MIN_ONEOF_FIELD: u8 = b' ';
    pub const MAX_ONEOF_FIELD: u8 = b'b';
    pub const MAX_ENUM_MASK: u8 = b'A';
}

/// Leading version characters.
pub mod version {
    pub const ENUM: u8 = b'!';
    pub const EXTENSION: u8 = b'#';
    pub const MAP: u8 = b'%';
    pub const MESSAGE: u8 = b'$';
    pub const MESSAGE_SET: u8 = b'&';
}

/// Space the encoder keeps available before emitting a token.
pub const MIN_EMIT_BUDGET: usize = 10;

/// Hasbit indices below this are reserved.
pub const RESERVED_HASBITS: u32 = 64;

/// Bytes occupied by the reserved hasbits.
pub const RESERVED_HASBYTES: u16 = 8;

/// Largest representable message size.
pub const MAX_MESSAGE_SIZE: usize = u16::MAX as usize;

/// Largest field number.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// `sub_index` of fields without a sub-table slot.
pub const NO_SUB: u16 = u16::MAX;
