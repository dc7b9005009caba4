//! Closed enum decoding.

use minidesc_core::lex::{decode_varint, from_base92};

use crate::constants::{chars, version};
use crate::enum_table::MiniTableEnum;
use crate::error::{DecodeError, DecodeErrorKind};

/// Builds the value set of a closed enum.
///
/// Dense values go into a bitmap that grows in 32-bit words. Once a value
/// is far beyond the number of values seen so far, it and every later
/// value are stored in an explicit list instead.
pub fn decode_enum(data: &[u8]) -> Result<MiniTableEnum, DecodeError> {
    build(data).map_err(DecodeError::Enum)
}

fn build(data: &[u8]) -> Result<MiniTableEnum, DecodeErrorKind> {
    let rest = match data.split_first() {
        None => return Ok(MiniTableEnum::default()),
        Some((&version::ENUM, rest)) => rest,
        Some((&other, _)) => return Err(DecodeErrorKind::InvalidEnumVersion(other as char)),
    };

    let mut builder = EnumBuilder::default();
    // Wider than a value so the step past a mask at the top of the range
    // does not overflow.
    let mut base: u64 = 0;
    let mut pos = 0;
    while let Some(&ch) = rest.get(pos) {
        pos += 1;
        if ch <= chars::MAX_ENUM_MASK {
            let mask = from_base92(ch).ok_or(DecodeErrorKind::InvalidChar(ch as char))?;
            for bit in 0..5 {
                if mask & (1 << bit) != 0 {
                    let value = u32::try_from(base + bit)
                        .map_err(|_| DecodeErrorKind::EnumValueOverflow)?;
                    builder.add(value);
                }
            }
            base += 5;
        } else if (chars::MIN_SKIP..=chars::MAX_SKIP).contains(&ch) {
            let (skip, used) = decode_varint(&rest[pos..], ch, chars::MIN_SKIP, chars::MAX_SKIP)
                .ok_or(DecodeErrorKind::OverlongVarint)?;
            pos += used;
            base += skip as u64;
            if base > u32::MAX as u64 {
                return Err(DecodeErrorKind::EnumValueOverflow);
            }
        } else {
            return Err(DecodeErrorKind::InvalidChar(ch as char));
        }
    }

    tracing::trace!(
        mask_limit = builder.table.mask_limit,
        listed = builder.table.value_count,
        "decoded enum table"
    );
    Ok(builder.table)
}

#[derive(Default)]
struct EnumBuilder {
    table: MiniTableEnum,
    values_seen: u32,
}

impl EnumBuilder {
    fn add(&mut self, value: u32) {
        self.values_seen += 1;
        let table = &mut self.table;
        if table.value_count > 0 || (value > 512 && self.values_seen < value / 32) {
            table.data.push(value);
            table.value_count += 1;
            return;
        }
        let needed = (value / 32 + 1) * 32;
        while table.mask_limit < needed {
            table.data.push(0);
            table.mask_limit += 32;
        }
        table.set_bit(value);
    }
}
