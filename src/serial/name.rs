//! Compact account/action names packed into 64 bits.
//!
//! Each of the first twelve characters takes a 5-bit slot starting from the
//! most significant end; a thirteenth character only keeps its low 4 bits in
//! the bottom nibble. The alphabet is `.12345abcdefghijklmnopqrstuvwxyz`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::ByteBuffer;
use crate::error::CodecError;

/// Maximum number of characters a name can carry.
pub const MAX_NAME_LEN: usize = 13;

const CHARMAP: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

const fn char_to_symbol(c: u8) -> u64 {
    match c {
        b'a'..=b'z' => (c - b'a') as u64 + 6,
        b'1'..=b'5' => (c - b'1') as u64 + 1,
        _ => 0,
    }
}

/// Pack `name` into its 64-bit form. Characters outside the alphabet map to
/// the `.` placeholder.
///
/// # Errors
/// Returns [`CodecError::InvalidFormat`] if `name` is longer than 13 bytes.
pub fn encode_name(name: &str) -> Result<u64, CodecError> {
    let bytes = name.as_bytes();
    if bytes.len() > MAX_NAME_LEN {
        return Err(CodecError::format(
            "name",
            format!("{name:?} is longer than {MAX_NAME_LEN} characters"),
        ));
    }
    let mut value = 0u64;
    for (i, &c) in bytes.iter().take(12).enumerate() {
        value |= (char_to_symbol(c) & 0x1f) << (64 - 5 * (i + 1));
    }
    if let Some(&last) = bytes.get(12) {
        value |= char_to_symbol(last) & 0x0f;
    }
    Ok(value)
}

/// Unpack a 64-bit name, dropping trailing `.` placeholders.
#[must_use]
pub fn decode_name(value: u64) -> String {
    let mut chars = [b'.'; MAX_NAME_LEN];
    let mut rest = value;
    for (i, slot) in chars.iter_mut().rev().enumerate() {
        let (mask, width) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
        *slot = usize::try_from(rest & mask)
            .ok()
            .and_then(|index| CHARMAP.get(index))
            .copied()
            .unwrap_or(b'.');
        rest >>= width;
    }
    let end = chars.iter().rposition(|&c| c != b'.').map_or(0, |pos| pos + 1);
    chars
        .get(..end)
        .map(|used| used.iter().map(|&c| char::from(c)).collect())
        .unwrap_or_default()
}

/// A packed name such as an account, action or permission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(u64);

impl Name {
    /// Wrap an already packed value.
    #[must_use]
    pub const fn from_u64(value: u64) -> Self { Self(value) }

    /// The packed 64-bit value.
    #[must_use]
    pub const fn as_u64(self) -> u64 { self.0 }
}

impl FromStr for Name {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { encode_name(s).map(Self) }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&decode_name(self.0)) }
}

impl Serialize for Name {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Name {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

impl ByteBuffer {
    /// Append a name as its little-endian 64-bit packing.
    ///
    /// # Errors
    /// See [`encode_name`].
    pub fn push_name(&mut self, name: &str) -> Result<(), CodecError> {
        self.push_u64(encode_name(name)?);
        Ok(())
    }

    /// Read an 8-byte name and unpack it.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than 8 bytes remain.
    pub fn get_name(&mut self) -> Result<String, CodecError> { Ok(decode_name(self.get_u64()?)) }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("bitsfleamain", 0x3bb3_85c5_4691_9d30)]
    #[case("eosio", 0x5530_ea00_0000_0000)]
    #[case("", 0)]
    fn packs_known_names(#[case] name: &str, #[case] packed: u64) {
        assert_eq!(encode_name(name).expect("encode"), packed);
        assert_eq!(decode_name(packed), name);
    }

    #[test]
    fn buffer_writes_little_endian() {
        let mut buf = ByteBuffer::new();
        buf.push_name("bitsfleamain").expect("push");
        assert_eq!(buf.to_hex(), "309d9146c585b33b");
        assert_eq!(buf.get_name().expect("get"), "bitsfleamain");
    }

    #[rstest]
    #[case("zzzzzzzzzzzzj", "zzzzzzzzzzzzj")]
    #[case("aaaaaaaaaaaa1", "aaaaaaaaaaaa1")]
    #[case("zzzzzzzzzzzzz", "zzzzzzzzzzzzj")]
    fn thirteenth_character_keeps_four_bits(#[case] input: &str, #[case] decoded: &str) {
        let packed = encode_name(input).expect("encode");
        assert_eq!(packed & 0x0f, char_to_symbol(input.as_bytes()[12]) & 0x0f);
        assert_eq!(decode_name(packed), decoded);
    }

    #[test]
    fn rejects_names_longer_than_thirteen() {
        assert!(matches!(
            encode_name("aaaaaaaaaaaaaa"),
            Err(CodecError::InvalidFormat { kind: "name", .. })
        ));
    }

    #[test]
    fn serde_uses_the_string_form() {
        let name: Name = serde_json::from_str("\"eosio.token\"").expect("deserialize");
        assert_eq!(name.to_string(), "eosio.token");
        assert_eq!(serde_json::to_string(&name).expect("serialize"), "\"eosio.token\"");
    }

    proptest! {
        #[test]
        fn valid_names_round_trip(name in "[a-z1-5]{1,12}") {
            let packed = encode_name(&name).expect("encode");
            prop_assert_eq!(decode_name(packed), name);
        }
    }
}
