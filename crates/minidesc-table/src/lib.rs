#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Mini descriptors and the layouts they describe.
//!
//! - **Encoder**: writes the compact text form of messages, enums, maps and extensions
//! - **Decoder**: computes field offsets, hasbits and sub-table slots from that form
//! - **Linker**: connects tables to the message and enum tables their fields reference

pub mod compare;
pub mod constants;
pub mod decode;
pub mod encode;
mod enum_table;
mod error;
mod extension;
mod field;
mod link;
pub mod modifiers;
mod store;
mod table;
mod types;

#[cfg(test)]
mod compare_tests;
#[cfg(test)]
mod encode_tests;
#[cfg(test)]
mod link_tests;
#[cfg(test)]
mod roundtrip_tests;
#[cfg(test)]
mod test_utils;

pub use compare::{Equality, compatible, equals, equals_across};
pub use decode::{decode_enum, decode_extension, decode_message};
pub use encode::MtDataEncoder;
pub use enum_table::{EnumTableId, MiniTableEnum};
pub use error::{DecodeError, DecodeErrorKind, EncodeError, ErrorCategory, LinkError};
pub use extension::{ExtensionId, MiniTableExtension};
pub use field::MiniTableField;
pub use modifiers::{FieldModifiers, MessageModifiers};
pub use store::{Checkpoint, MiniTables};
pub use table::{EMPTY_MINI_TABLE, MiniTable, MiniTableId, Sub, SubList};
pub use types::{CType, ExtMode, FieldMode, FieldRep, FieldType, LabelFlags, Platform};
