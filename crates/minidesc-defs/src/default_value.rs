//! Field default values.

use minidesc_core::lex::{parse_int_literal, parse_uint_literal, unescape};
use minidesc_table::FieldType;

/// Default of a singular field.
///
/// Message fields and repeated fields have no default and report `None`.
#[derive(Clone, PartialEq, Debug)]
pub enum DefaultValue {
    None,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    /// Number of the default enum value.
    Enum(i32),
}

impl DefaultValue {
    /// Implicit default of a field of type `ty`. Enums default to their
    /// first value, which the caller supplies.
    pub(crate) fn zero(ty: FieldType, first_enum_value: i32) -> Self {
        match ty {
            FieldType::Double => Self::Double(0.0),
            FieldType::Float => Self::Float(0.0),
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => Self::Int64(0),
            FieldType::UInt64 | FieldType::Fixed64 => Self::UInt64(0),
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => Self::Int32(0),
            FieldType::UInt32 | FieldType::Fixed32 => Self::UInt32(0),
            FieldType::Bool => Self::Bool(false),
            FieldType::String => Self::String(String::new()),
            FieldType::Bytes => Self::Bytes(Vec::new()),
            FieldType::Enum => Self::Enum(first_enum_value),
            FieldType::Group | FieldType::Message => Self::None,
        }
    }

    /// Parses the textual default of a non-enum field.
    ///
    /// Returns `None` when `text` is not a valid value of `ty`.
    pub(crate) fn parse(ty: FieldType, text: &str) -> Option<Self> {
        Some(match ty {
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => {
                Self::Int32(i32::try_from(parse_int_literal(text)?).ok()?)
            }
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => {
                Self::Int64(parse_int_literal(text)?)
            }
            FieldType::UInt32 | FieldType::Fixed32 => {
                Self::UInt32(u32::try_from(parse_uint_literal(text)?).ok()?)
            }
            FieldType::UInt64 | FieldType::Fixed64 => Self::UInt64(parse_uint_literal(text)?),
            FieldType::Double => Self::Double(parse_float(text)?),
            FieldType::Float => Self::Float(parse_float(text)? as f32),
            FieldType::Bool => match text {
                "true" => Self::Bool(true),
                "false" => Self::Bool(false),
                _ => return None,
            },
            FieldType::String => Self::String(text.to_owned()),
            FieldType::Bytes => Self::Bytes(unescape(text.as_bytes()).ok()?),
            FieldType::Enum | FieldType::Group | FieldType::Message => return None,
        })
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::Int32(v) | Self::Enum(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Int64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            Self::String(s) => Some(s.as_bytes()),
            _ => None,
        }
    }
}

fn parse_float(text: &str) -> Option<f64> {
    match text {
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        "nan" => Some(f64::NAN),
        // `f64::from_str` also accepts spellings protoc never emits.
        _ if text.bytes().any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E')) => None,
        _ => text.parse().ok(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_accept_every_radix() {
        assert_eq!(DefaultValue::parse(FieldType::Int32, "-0x10"), Some(DefaultValue::Int32(-16)));
        assert_eq!(DefaultValue::parse(FieldType::UInt32, "017"), Some(DefaultValue::UInt32(15)));
        assert_eq!(
            DefaultValue::parse(FieldType::SFixed64, "-9223372036854775808"),
            Some(DefaultValue::Int64(i64::MIN))
        );
    }

    #[test]
    fn integers_reject_out_of_range() {
        assert_eq!(DefaultValue::parse(FieldType::Int32, "2147483648"), None);
        assert_eq!(DefaultValue::parse(FieldType::UInt32, "-1"), None);
        assert_eq!(DefaultValue::parse(FieldType::Int64, "12abc"), None);
    }

    #[test]
    fn floats() {
        assert_eq!(DefaultValue::parse(FieldType::Double, "1.5e3"), Some(DefaultValue::Double(1500.0)));
        assert_eq!(
            DefaultValue::parse(FieldType::Float, "-inf"),
            Some(DefaultValue::Float(f32::NEG_INFINITY))
        );
        assert!(matches!(
            DefaultValue::parse(FieldType::Double, "nan"),
            Some(DefaultValue::Double(v)) if v.is_nan()
        ));
        assert_eq!(DefaultValue::parse(FieldType::Double, "infinity"), None);
    }

    #[test]
    fn bools_and_bytes() {
        assert_eq!(DefaultValue::parse(FieldType::Bool, "true"), Some(DefaultValue::Bool(true)));
        assert_eq!(DefaultValue::parse(FieldType::Bool, "1"), None);
        assert_eq!(
            DefaultValue::parse(FieldType::Bytes, r"a\x00\n"),
            Some(DefaultValue::Bytes(vec![b'a', 0, b'\n']))
        );
        assert_eq!(DefaultValue::parse(FieldType::Bytes, r"\q"), None);
    }

    #[test]
    fn zero_values() {
        assert_eq!(DefaultValue::zero(FieldType::Fixed64, 0), DefaultValue::UInt64(0));
        assert_eq!(DefaultValue::zero(FieldType::Enum, 3), DefaultValue::Enum(3));
        assert_eq!(DefaultValue::zero(FieldType::Message, 0), DefaultValue::None);
    }
}
