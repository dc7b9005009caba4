//! C-style escape sequences as used in descriptor default values.

use crate::error::EscapeError;

fn hex_digit(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

fn octal_digit(b: u8) -> Option<u32> {
    matches!(b, b'0'..=b'7').then(|| (b - b'0') as u32)
}

/// Decode one escape. `input` starts right after the backslash.
///
/// Returns the byte and how many bytes of `input` the escape used.
/// `\xH` / `\xHH` take one or two hex digits, `\O` to `\OOO` up to three octal digits.
pub fn parse_escape(input: &[u8]) -> Result<(u8, usize), EscapeError> {
    let &ch = input.first().ok_or(EscapeError::Unterminated)?;
    let simple = match ch {
        b'n' => Some(b'\n'),
        b'r' => Some(b'\r'),
        b't' => Some(b'\t'),
        b'\\' => Some(b'\\'),
        b'\'' => Some(b'\''),
        b'"' => Some(b'"'),
        b'a' => Some(0x07),
        b'b' => Some(0x08),
        b'f' => Some(0x0c),
        b'v' => Some(0x0b),
        b'?' => Some(b'?'),
        _ => None,
    };
    if let Some(b) = simple {
        return Ok((b, 1));
    }

    match ch {
        b'x' | b'X' => {
            let digits: Vec<u8> = input[1..].iter().take(2).map_while(|&b| hex_digit(b)).collect();
            if digits.is_empty() {
                return Err(EscapeError::MissingHexDigit);
            }
            let value = digits.iter().fold(0u8, |acc, &d| (acc << 4) | d);
            Ok((value, 1 + digits.len()))
        }
        b'0'..=b'7' => {
            let digits: Vec<u32> = input.iter().take(3).map_while(|&b| octal_digit(b)).collect();
            let value = digits.iter().fold(0u32, |acc, &d| (acc << 3) | d);
            let byte = u8::try_from(value).map_err(|_| EscapeError::OctalOverflow(value))?;
            Ok((byte, digits.len()))
        }
        other => Err(EscapeError::Unknown(other as char)),
    }
}

/// Decode every escape in `input`.
pub fn unescape(input: &[u8]) -> Result<Vec<u8>, EscapeError> {
    let mut out = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        if input[i] != b'\\' {
            out.push(input[i]);
            i += 1;
            continue;
        }
        let (byte, used) = parse_escape(&input[i + 1..])?;
        out.push(byte);
        i += 1 + used;
    }
    Ok(out)
}
