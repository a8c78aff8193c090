//! Dense integer-to-string encoding for fingerprint keys
//!
//! Renders an integer in base 64 over a key-safe alphabet, most significant
//! digit first. This is not RFC 4648 base64: there is no padding and the
//! output is the shortest positional representation of the number.

/// Digit alphabet, index = digit value
pub const ALPHABET: &[u8; 64] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz_$";

/// Encode an integer
pub fn encode(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }

    // 64 bits need at most 11 digits of 6 bits
    let mut digits = [0u8; 11];
    let mut len = 0;
    while value > 0 {
        digits[len] = ALPHABET[(value & 63) as usize];
        value >>= 6;
        len += 1;
    }

    digits[..len].iter().rev().map(|&b| b as char).collect()
}

/// Decode a string produced by [`encode`]. Returns `None` on unknown
/// symbols, empty input or overflow.
pub fn decode(encoded: &str) -> Option<u64> {
    if encoded.is_empty() {
        return None;
    }

    encoded.bytes().try_fold(0u64, |acc, byte| {
        let digit = digit_value(byte)?;
        acc.checked_mul(64)?.checked_add(digit)
    })
}

fn digit_value(byte: u8) -> Option<u64> {
    let value = match byte {
        b'0'..=b'9' => byte - b'0',
        b'A'..=b'Z' => byte - b'A' + 10,
        b'a'..=b'z' => byte - b'a' + 36,
        b'_' => 62,
        b'$' => 63,
        _ => return None,
    };
    Some(u64::from(value))
}
