//! Errors raised while encoding, decoding and linking mini tables.

use crate::types::FieldType;

/// Coarse classification shared by every error in the system.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ErrorCategory {
    /// The input is not a well-formed mini descriptor.
    Malformed,
    /// The input is well-formed but describes an impossible layout.
    Structural,
    /// A size or count limit was exceeded.
    ResourceExceeded,
    /// A reference could not be resolved.
    Unresolved,
    /// A name or number was defined twice.
    Duplicate,
}

/// What went wrong while decoding a mini descriptor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeErrorKind {
    #[error("Invalid message version: {0}")]
    InvalidMessageVersion(char),
    #[error("Invalid enum version: {0}")]
    InvalidEnumVersion(char),
    #[error("Invalid ext version: {0}")]
    InvalidExtensionVersion(char),
    #[error("Invalid char: {0}")]
    InvalidChar(char),
    #[error("Overlong varint")]
    OverlongVarint,
    #[error("Invalid field type: {0}")]
    InvalidFieldType(u8),
    #[error("Zero-length field skip")]
    ZeroSkip,
    #[error("Enum value exceeds 32 bits")]
    EnumValueOverflow,
    #[error("Field number {0} is out of range")]
    FieldNumberOutOfRange(u64),
    #[error("Cannot flip packed on unpackable field {0}")]
    FlipPackedOnUnpackable(u32),
    #[error("Cannot flip ValidateUtf8 on field {0}")]
    FlipValidateUtf8(u32),
    #[error("Invalid modifier(s) for repeated field {0}")]
    ModifierWithoutHasbit(u32),
    #[error("Field {0} cannot be both singular and required")]
    SingularAndRequired(u32),
    #[error("Field {0} cannot be a singular submessage")]
    SingularSubMessage(u32),
    #[error("Extensions cannot have message modifiers")]
    ExtensionModifiers,
    #[error("Extensions cannot have oneofs.")]
    ExtensionOneof,
    #[error("Extension must declare exactly one field, found {0}")]
    ExtensionFieldCount(usize),
    #[error("MessageSet extensions must be singular submessages")]
    MessageSetExtension,
    #[error("Couldn't add field number {0} to oneof, no such field number.")]
    NoSuchOneofField(u32),
    #[error("Cannot add repeated, required, or singular field {0} to oneof.")]
    InvalidOneofField(u32),
    #[error("Field {0} is already a member of a oneof")]
    DuplicateOneofField(u32),
    #[error("Empty oneof")]
    EmptyOneof,
    #[error("Too many required fields")]
    TooManyRequired,
    #[error("Message size exceeded maximum size of {0} bytes")]
    SizeExceeded(usize),
    #[error("{0} fields in map")]
    MapFieldCount(usize),
    #[error("Map entry cannot have oneof")]
    MapOneof,
    #[error("map {name} did not have expected number ({expected} vs {actual})")]
    MapFieldNumber {
        name: &'static str,
        expected: u32,
        actual: u32,
    },
    #[error("map {0} cannot be repeated or map, or be in oneof")]
    MapFieldNotScalar(&'static str),
    #[error("map {name} cannot have type {ty:?}")]
    MapFieldType { name: &'static str, ty: FieldType },
    #[error("Invalid message set encode length: {0}")]
    MessageSetLength(usize),
}

impl DecodeErrorKind {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidMessageVersion(_)
            | Self::InvalidEnumVersion(_)
            | Self::InvalidExtensionVersion(_)
            | Self::InvalidChar(_)
            | Self::OverlongVarint
            | Self::InvalidFieldType(_)
            | Self::ZeroSkip
            | Self::MessageSetLength(_) => ErrorCategory::Malformed,
            Self::FieldNumberOutOfRange(_)
            | Self::EnumValueOverflow
            | Self::TooManyRequired
            | Self::SizeExceeded(_) => ErrorCategory::ResourceExceeded,
            Self::NoSuchOneofField(_) => ErrorCategory::Unresolved,
            Self::DuplicateOneofField(_) => ErrorCategory::Duplicate,
            _ => ErrorCategory::Structural,
        }
    }
}

/// Decoding failure, tagged with the kind of table being built.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("Error building mini table: {0}")]
    Message(DecodeErrorKind),
    #[error("Error building enum MiniTable: {0}")]
    Enum(DecodeErrorKind),
    #[error("Error building extension: {0}")]
    Extension(DecodeErrorKind),
}

impl DecodeError {
    pub fn kind(&self) -> &DecodeErrorKind {
        match self {
            Self::Message(kind) | Self::Enum(kind) | Self::Extension(kind) => kind,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind().category()
    }
}

/// Misuse of the encoder's call protocol.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    #[error("field {number} must be greater than the previous field {last}")]
    FieldOutOfOrder { number: u32, last: u32 },
    #[error("field number {0} is out of range")]
    FieldNumberOutOfRange(u32),
    #[error("enum value {value} must be greater than the previous value {last}")]
    EnumValueOutOfOrder { value: u32, last: u32 },
    #[error("closed enum modifier on {0:?} field")]
    ClosedEnumType(FieldType),
    #[error("field {0} skips UTF-8 validation its message requires")]
    Utf8Downgrade(u32),
    #[error("{0} called in the wrong encoder state")]
    InvalidState(&'static str),
}

impl EncodeError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::FieldNumberOutOfRange(_) => ErrorCategory::ResourceExceeded,
            _ => ErrorCategory::Structural,
        }
    }
}

/// Failure to connect a table to its sub-tables.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LinkError {
    #[error("no field at index {0}")]
    NoSuchField(usize),
    #[error("field {0} is not a message or group")]
    NotSubMessage(u32),
    #[error("field {0} is not a closed enum")]
    NotClosedEnum(u32),
    #[error("map entry field {0} cannot hold another map")]
    NestedMap(u32),
    #[error("group field {0} cannot reference a map entry")]
    GroupOfMapEntry(u32),
    #[error("expected {expected} sub-messages, got {actual}")]
    SubMessageCount { expected: usize, actual: usize },
    #[error("expected {expected} sub-enums, got {actual}")]
    SubEnumCount { expected: usize, actual: usize },
}

impl LinkError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::NoSuchField(_) | Self::SubMessageCount { .. } | Self::SubEnumCount { .. } => {
                ErrorCategory::Unresolved
            }
            _ => ErrorCategory::Structural,
        }
    }
}
