//! Stateless write routines for identifier octets, length octets, and the
//! variable-length integer encodings (base-256 lengths, two's-complement
//! integers, base-128 OID arcs).

use crate::infra::error::{SigningError, SigningResult};

use super::tag;

/// Write a definite length: short form for lengths up to 127, otherwise
/// `0x80 | digit_count` followed by the minimal big-endian base-256 digits.
pub fn write_length(out: &mut Vec<u8>, length: usize) {
    if length <= 127 {
        out.push(length as u8);
    } else {
        let digits = base_n_digits(length as u64, 256);
        out.push(0x80 | digits.len() as u8);
        out.extend_from_slice(&digits);
    }
}

/// Write the indefinite-length octet. Only legal for constructed content;
/// the writer never chooses this form on its own.
pub fn write_indefinite_length(out: &mut Vec<u8>) {
    out.push(0x80);
}

/// Minimal big-endian digits of `value` in the given base (128 for OID
/// arcs, 256 for long-form lengths).
#[must_use]
pub fn base_n_digits(mut value: u64, base: u64) -> Vec<u8> {
    let mut digits = Vec::new();
    while value > base - 1 {
        digits.insert(0, (value % base) as u8);
        value /= base;
    }
    digits.insert(0, value as u8);
    digits
}

/// Minimal two's-complement big-endian representation of `value`.
///
/// Redundant leading 0x00 / 0xFF bytes are stripped as long as the sign bit
/// of the following byte stays unambiguous, so `0` is `[0x00]`, `128` is
/// `[0x00, 0x80]`, and `-128` is `[0x80]`.
#[must_use]
pub fn encode_twos_complement(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant_zero = bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0;
        let redundant_ff = bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0;
        if redundant_zero || redundant_ff {
            start += 1;
        } else {
            break;
        }
    }
    bytes[start..].to_vec()
}

/// Encode a dotted-decimal object identifier: the first two arcs combine
/// into one octet as `40*a + b`, each later arc is big-endian base-128 with
/// the continuation bit set on all but its last octet.
pub fn encode_oid(oid: &str) -> SigningResult<Vec<u8>> {
    let malformed = || SigningError::MalformedEncoding {
        expected_tag: tag::OBJECT_IDENTIFIER,
    };

    let arcs: Vec<u64> = oid
        .split('.')
        .map(|segment| segment.parse::<u64>().map_err(|_| malformed()))
        .collect::<SigningResult<_>>()?;

    if arcs.len() < 2 {
        return Err(malformed());
    }

    let first_octet = arcs[0]
        .checked_mul(40)
        .and_then(|n| n.checked_add(arcs[1]))
        .filter(|n| *n <= u64::from(u8::MAX))
        .ok_or_else(malformed)?;

    let mut content = vec![first_octet as u8];
    for &arc in &arcs[2..] {
        let mut digits = base_n_digits(arc, 128);
        let last = digits.len() - 1;
        for digit in &mut digits[..last] {
            *digit |= 0x80;
        }
        content.extend_from_slice(&digits);
    }

    Ok(content)
}
