//! Integer parsing bounded by the input slice.
//!
//! The prefix parsers stop at the first byte that is not a digit and report
//! how much they consumed. The literal parsers require the whole input to be
//! a number. All of them return `None` on overflow.

/// Leading decimal digits of `input`.
pub fn parse_u64(input: &[u8]) -> Option<(u64, usize)> {
    let mut value = 0u64;
    let mut used = 0;
    for &b in input {
        if !b.is_ascii_digit() {
            break;
        }
        value = value.checked_mul(10)?.checked_add((b - b'0') as u64)?;
        used += 1;
    }
    Some((value, used))
}

/// Optional `-` followed by decimal digits.
pub fn parse_i64(input: &[u8]) -> Option<(i64, usize)> {
    let negative = input.first() == Some(&b'-');
    let sign = negative as usize;
    let (magnitude, used) = parse_u64(&input[sign..])?;
    let value = if negative {
        0i64.checked_sub_unsigned(magnitude)?
    } else {
        i64::try_from(magnitude).ok()?
    };
    Some((value, sign + used))
}

fn split_radix(digits: &str) -> (u32, &str) {
    if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        (16, hex)
    } else if digits.len() > 1 && digits.starts_with('0') {
        (8, &digits[1..])
    } else {
        (10, digits)
    }
}

/// Whole-input unsigned literal: decimal, `0x` hex or leading-`0` octal.
pub fn parse_uint_literal(input: &str) -> Option<u64> {
    let (radix, digits) = split_radix(input);
    if digits.is_empty() || digits.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Whole-input signed literal with an optional `-`, same radix rules as
/// [`parse_uint_literal`].
pub fn parse_int_literal(input: &str) -> Option<i64> {
    let (negative, rest) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };
    let magnitude = parse_uint_literal(rest)?;
    if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    }
}
