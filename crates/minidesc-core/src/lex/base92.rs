//! Base-92: printable ASCII `' '..='~'` minus `"`, `'` and `\`.

use crate::utils::log2_ceil;

const TO_BASE92: &[u8; 92] =
    b" !#$%&()*+,-./0123456789:;<=>?@ABCDEFGHIJKLMNOPQRSTUVWXYZ[]^_`abcdefghijklmnopqrstuvwxyz{|}~";

const FROM_BASE92: [i8; 95] = {
    let mut table = [-1i8; 95];
    let mut i = 0;
    while i < TO_BASE92.len() {
        table[(TO_BASE92[i] - b' ') as usize] = i as i8;
        i += 1;
    }
    table
};

/// Character for digit `n`.
///
/// # Panics
/// Panics if `n >= 92`.
#[inline]
pub fn to_base92(n: u8) -> u8 {
    TO_BASE92[n as usize]
}

/// Digit for character `ch`, or `None` outside the alphabet.
#[inline]
pub fn from_base92(ch: u8) -> Option<u8> {
    let index = ch.checked_sub(b' ')? as usize;
    let digit = *FROM_BASE92.get(index)?;
    (digit >= 0).then_some(digit as u8)
}

#[inline]
fn digit(ch: u8) -> u8 {
    from_base92(ch).unwrap_or_else(|| panic!("{:?} is not a base-92 character", ch as char))
}

/// Append `val` as a little-endian varint over the characters `min..=max`.
pub fn encode_varint(out: &mut String, mut val: u32, min: u8, max: u8) {
    let base = digit(min);
    let shift = log2_ceil((digit(max) - base) as u64 + 1);
    debug_assert!(shift <= 6);
    let mask = (1u32 << shift) - 1;
    loop {
        out.push(to_base92((val & mask) as u8 + base) as char);
        val >>= shift;
        if val == 0 {
            break;
        }
    }
}

/// Decode a varint whose first character `first` was already consumed.
///
/// Continues through `rest` while characters stay inside the digit range.
/// Returns the value and the number of bytes of `rest` consumed, or `None`
/// when the value would need more than 32 bits or a character is not base-92.
pub fn decode_varint(rest: &[u8], first: u8, min: u8, max: u8) -> Option<(u32, usize)> {
    let base = from_base92(min)?;
    let bits_per_char = log2_ceil((from_base92(max)? - base) as u64 + 1);
    let in_range = |ch: u8| (min..=max).contains(&ch) && from_base92(ch).is_some();

    let mut val = 0u32;
    let mut shift = 0u32;
    let mut ch = first;
    let mut consumed = 0;
    loop {
        let bits = (from_base92(ch)?.checked_sub(base)? as u64) << shift;
        if bits > u32::MAX as u64 {
            return None;
        }
        val |= bits as u32;
        match rest.get(consumed) {
            Some(&next) if in_range(next) => {
                ch = next;
                consumed += 1;
                shift += bits_per_char;
                if shift >= 32 {
                    return None;
                }
            }
            _ => return Some((val, consumed)),
        }
    }
}
