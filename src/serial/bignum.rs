//! Schoolbook conversion between decimal strings and little-endian byte
//! integers wider than any native type.

use super::ByteBuffer;
use crate::error::CodecError;

/// Width of a `uint128` on the wire.
pub const UINT128_SIZE: usize = 16;

/// Convert a decimal string, or a `0x`-prefixed little-endian hex string, into
/// a `size`-byte little-endian integer.
///
/// # Errors
/// Returns [`CodecError::InvalidFormat`] for a non-digit character, empty
/// input or malformed hex, and [`CodecError::OutOfRange`] if the value needs
/// more than `size` bytes.
#[expect(
    clippy::cast_possible_truncation,
    reason = "each limb is masked to eight bits"
)]
pub fn decimal_to_binary(size: usize, input: &str) -> Result<Vec<u8>, CodecError> {
    if let Some(digits) = input.strip_prefix("0x") {
        if digits.len() != size * 2 {
            return Err(CodecError::format(
                "uint128",
                format!("expected {} hex digits, got {}", size * 2, digits.len()),
            ));
        }
        return hex::decode(digits).map_err(|e| CodecError::format("uint128", e.to_string()));
    }
    if input.is_empty() {
        return Err(CodecError::format("uint128", "empty number"));
    }
    let mut result = vec![0u8; size];
    for ch in input.chars() {
        let Some(digit) = ch.to_digit(10) else {
            return Err(CodecError::format("uint128", format!("invalid digit {ch:?}")));
        };
        let mut carry = digit;
        for byte in &mut result {
            let x = u32::from(*byte) * 10 + carry;
            *byte = (x & 0xff) as u8;
            carry = x >> 8;
        }
        if carry != 0 {
            return Err(CodecError::range("uint128", input));
        }
    }
    Ok(result)
}

/// Render a little-endian byte integer as decimal, padded to `min_digits`.
#[must_use]
#[expect(
    clippy::cast_possible_truncation,
    clippy::integer_division,
    clippy::integer_division_remainder_used,
    reason = "digits are reduced modulo ten"
)]
pub fn binary_to_decimal(bignum: &[u8], min_digits: usize) -> String {
    // Little-endian decimal digits, most significant last.
    let mut digits = vec![0u8; min_digits.max(1)];
    for &byte in bignum.iter().rev() {
        let mut carry = u32::from(byte);
        for digit in &mut digits {
            let x = (u32::from(*digit) << 8) + carry;
            *digit = (x % 10) as u8;
            carry = x / 10;
        }
        while carry != 0 {
            digits.push((carry % 10) as u8);
            carry /= 10;
        }
    }
    digits.iter().rev().map(|d| char::from(b'0' + d)).collect()
}

impl ByteBuffer {
    /// Append a `uint128` given as decimal or `0x` little-endian hex.
    ///
    /// # Errors
    /// See [`decimal_to_binary`].
    pub fn push_uint128(&mut self, value: &str) -> Result<(), CodecError> {
        let bytes = decimal_to_binary(UINT128_SIZE, value)?;
        self.push_raw(&bytes);
        Ok(())
    }

    /// Read a `uint128` and render it as a decimal string.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than 16 bytes remain.
    pub fn get_uint128(&mut self) -> Result<String, CodecError> {
        Ok(binary_to_decimal(self.take(UINT128_SIZE)?, 1))
    }
}
