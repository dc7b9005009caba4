//! Small lexing helpers shared by the mini descriptor codec and the def builder.

mod base92;
mod escape;
mod int;


pub use base92::{decode_varint, encode_varint, from_base92, to_base92};
pub use escape::{parse_escape, unescape};
pub use int::{parse_i64, parse_int_literal, parse_u64, parse_uint_literal};
