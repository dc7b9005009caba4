//! Modifier sets accepted by the encoder.

use bitflags::bitflags;

bitflags! {
    /// Properties of a single field, as seen by the encoder.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct FieldModifiers: u32 {
        const IS_REPEATED = 1;
        const IS_PACKED = 2;
        const IS_CLOSED_ENUM = 4;
        const IS_PROTO3_SINGULAR = 8;
        const IS_REQUIRED = 16;
        const VALIDATE_UTF8 = 32;
    }
}

bitflags! {
    /// Message-wide defaults that individual fields may flip.
    #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
    pub struct MessageModifiers: u32 {
        const VALIDATE_UTF8 = 1;
        const DEFAULT_IS_PACKED = 2;
        const IS_EXTENDABLE = 4;
    }
}
