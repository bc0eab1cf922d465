//! Base58 public keys and signatures with embedded RIPEMD-160 checksums.
//!
//! A key or signature is a curve tag plus a fixed-size payload. Text forms
//! append the first four bytes of `ripemd160(payload ++ salt)` before base58
//! encoding. Typed forms (`PUB_K1_`, `SIG_R1_`, ...) salt with the curve
//! name; the legacy `EOS` key form is unsalted.

use std::{fmt, str::FromStr};

use ripemd::{Digest, Ripemd160};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::CodecError, serial::ByteBuffer};

/// Length of a compressed public key payload.
pub const PUBLIC_KEY_DATA_SIZE: usize = 33;

/// Length of a recoverable signature payload.
pub const SIGNATURE_DATA_SIZE: usize = 65;

const CHECKSUM_SIZE: usize = 4;
const LEGACY_KEY_PREFIX: &str = "EOS";

/// Curve family of a key or signature; the discriminant is the wire tag.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum KeyType {
    /// secp256k1.
    #[default]
    K1 = 0,
    /// secp256r1.
    R1 = 1,
}

impl KeyType {
    /// Curve name used in typed prefixes and as the checksum salt.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::K1 => "K1",
            Self::R1 => "R1",
        }
    }

    fn from_tag(kind: &'static str, tag: u8) -> Result<Self, CodecError> {
        match tag {
            0 => Ok(Self::K1),
            1 => Ok(Self::R1),
            other => Err(CodecError::format(kind, format!("unknown key type {other}"))),
        }
    }
}

/// Text rendering for decoded public keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyFormat {
    /// `EOS…` for K1 keys.
    #[default]
    Legacy,
    /// `PUB_K1_…` for every key.
    Typed,
}

/// Base58-encode `data` with the Bitcoin alphabet, one leading `1` per
/// leading zero byte.
#[must_use]
pub fn base58_encode(data: &[u8]) -> String { bs58::encode(data).into_string() }

/// Decode a base58 string.
///
/// # Errors
/// Returns [`CodecError::InvalidFormat`] for characters outside the alphabet.
pub fn base58_decode(text: &str) -> Result<Vec<u8>, CodecError> {
    bs58::decode(text)
        .into_vec()
        .map_err(|e| CodecError::format("base58", e.to_string()))
}

/// First four bytes of `ripemd160(data ++ salt)`.
#[must_use]
pub fn checksum(data: &[u8], salt: Option<&str>) -> [u8; CHECKSUM_SIZE] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    if let Some(suffix) = salt {
        hasher.update(suffix.as_bytes());
    }
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_SIZE];
    for (slot, byte) in out.iter_mut().zip(digest.iter()) {
        *slot = *byte;
    }
    out
}

fn encode_check(data: &[u8], salt: Option<&str>) -> String {
    let mut whole = data.to_vec();
    whole.extend_from_slice(&checksum(data, salt));
    base58_encode(&whole)
}

fn decode_check<const N: usize>(
    kind: &'static str,
    body: &str,
    salt: Option<&str>,
) -> Result<[u8; N], CodecError> {
    let whole = base58_decode(body)?;
    if whole.len() != N + CHECKSUM_SIZE {
        return Err(CodecError::format(
            kind,
            format!("expected {} bytes, got {}", N + CHECKSUM_SIZE, whole.len()),
        ));
    }
    let (payload, expected) = whole.split_at(N);
    if checksum(payload, salt) != expected {
        return Err(CodecError::ChecksumMismatch(kind));
    }
    let mut data = [0u8; N];
    data.copy_from_slice(payload);
    Ok(data)
}

fn split_typed<'a>(text: &'a str, prefix: &str) -> Option<(KeyType, &'a str)> {
    let rest = text.strip_prefix(prefix)?;
    [KeyType::K1, KeyType::R1].into_iter().find_map(|key_type| {
        rest.strip_prefix(key_type.suffix())
            .and_then(|r| r.strip_prefix('_'))
            .map(|body| (key_type, body))
    })
}

/// A tagged compressed public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    key_type: KeyType,
    data: [u8; PUBLIC_KEY_DATA_SIZE],
}

impl PublicKey {
    /// Wrap a raw payload.
    #[must_use]
    pub const fn new(key_type: KeyType, data: [u8; PUBLIC_KEY_DATA_SIZE]) -> Self {
        Self { key_type, data }
    }

    /// Curve family.
    #[must_use]
    pub const fn key_type(&self) -> KeyType { self.key_type }

    /// Raw compressed point.
    #[must_use]
    pub const fn data(&self) -> &[u8; PUBLIC_KEY_DATA_SIZE] { &self.data }

    /// Typed `PUB_<curve>_` rendering with a salted checksum.
    #[must_use]
    pub fn to_typed_string(&self) -> String {
        let suffix = self.key_type.suffix();
        format!("PUB_{suffix}_{}", encode_check(&self.data, Some(suffix)))
    }

    /// Render in `format`. R1 keys have no legacy form and always render typed.
    #[must_use]
    pub fn to_string_as(&self, format: KeyFormat) -> String {
        match (format, self.key_type) {
            (KeyFormat::Legacy, KeyType::K1) => {
                format!("{LEGACY_KEY_PREFIX}{}", encode_check(&self.data, None))
            }
            _ => self.to_typed_string(),
        }
    }
}

impl FromStr for PublicKey {
    type Err = CodecError;

    /// Accepts `EOS…`, `PUB_K1_…` and `PUB_R1_…`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((key_type, typed_body)) = split_typed(s, "PUB_") {
            let data = decode_check("public key", typed_body, Some(key_type.suffix()))?;
            return Ok(Self::new(key_type, data));
        }
        let body = s.strip_prefix(LEGACY_KEY_PREFIX).ok_or_else(|| {
            CodecError::format("public key", format!("unrecognised prefix in {s:?}"))
        })?;
        Ok(Self::new(KeyType::K1, decode_check("public key", body, None)?))
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_as(KeyFormat::Legacy))
    }
}

/// A tagged recoverable signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    key_type: KeyType,
    data: [u8; SIGNATURE_DATA_SIZE],
}

impl Signature {
    /// Wrap a raw payload.
    #[must_use]
    pub const fn new(key_type: KeyType, data: [u8; SIGNATURE_DATA_SIZE]) -> Self {
        Self { key_type, data }
    }

    /// Curve family.
    #[must_use]
    pub const fn key_type(&self) -> KeyType { self.key_type }

    /// Raw signature bytes.
    #[must_use]
    pub const fn data(&self) -> &[u8; SIGNATURE_DATA_SIZE] { &self.data }
}

impl FromStr for Signature {
    type Err = CodecError;

    /// Accepts `SIG_K1_…` and `SIG_R1_…`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key_type, body) = split_typed(s, "SIG_").ok_or_else(|| {
            CodecError::format("signature", format!("unrecognised prefix in {s:?}"))
        })?;
        let data = decode_check("signature", body, Some(key_type.suffix()))?;
        Ok(Self::new(key_type, data))
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let suffix = self.key_type.suffix();
        write!(f, "SIG_{suffix}_{}", encode_check(&self.data, Some(suffix)))
    }
}

macro_rules! string_serde {
    ($($ty:ty),*) => {
        $(
            impl Serialize for $ty {
                fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                    serializer.collect_str(self)
                }
            }

            impl<'de> Deserialize<'de> for $ty {
                fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                    let raw = String::deserialize(deserializer)?;
                    raw.parse().map_err(serde::de::Error::custom)
                }
            }
        )*
    };
}

string_serde!(PublicKey, Signature);

impl ByteBuffer {
    /// Append a key as its type byte and 33-byte payload.
    pub fn push_public_key(&mut self, key: &PublicKey) {
        self.push_u8(key.key_type as u8);
        self.push_raw(&key.data);
    }

    /// Read a type byte and 33-byte payload.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if the key is truncated, or
    /// [`CodecError::InvalidFormat`] for an unknown type byte.
    pub fn get_public_key(&mut self) -> Result<PublicKey, CodecError> {
        let key_type = KeyType::from_tag("public key", self.get_u8()?)?;
        Ok(PublicKey::new(key_type, self.take_array()?))
    }

    /// Append a signature as its type byte and 65-byte payload.
    pub fn push_signature(&mut self, signature: &Signature) {
        self.push_u8(signature.key_type as u8);
        self.push_raw(&signature.data);
    }

    /// Read a type byte and 65-byte payload.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if the signature is truncated, or
    /// [`CodecError::InvalidFormat`] for an unknown type byte.
    pub fn get_signature(&mut self) -> Result<Signature, CodecError> {
        let key_type = KeyType::from_tag("signature", self.get_u8()?)?;
        Ok(Signature::new(key_type, self.take_array()?))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    const LEGACY: &str = "EOS5BiYrPwXwFmrjLQ3ZUa3BX9crdomJNfYdu6uC863XAXrHNyWbo";
    const TYPED_K1: &str = "PUB_K1_5BiYrPwXwFmrjLQ3ZUa3BX9crdomJNfYdu6uC863XAXrJJkRbz";
    const TYPED_R1: &str = "PUB_R1_5BiYrPwXwFmrjLQ3ZUa3BX9crdomJNfYdu6uC863XAXrLrTpHT";
    const KEY_HEX: &str = "02271e00bde7ea56bfa78210ebb026ec9e16d6d02948880e7a39589b62ba418634";
    const SIG_K1: &str = "SIG_K1_18eZoZozC16DxAWsfGzwNnJfZkCJ3Yw3VEogWoNy59BmoiJN734Q65SP7pvu88BSxoNUG691Agzde6e742NK27B5v6Umn";
    const SIG_R1: &str = "SIG_R1_18eZoZozC16DxAWsfGzwNnJfZkCJ3Yw3VEogWoNy59BmoiJN734Q65SP7pvu88BSxoNUG691Agzde6e742NK27B4pZmWV";

    fn counting_bytes() -> [u8; SIGNATURE_DATA_SIZE] {
        let mut data = [0u8; SIGNATURE_DATA_SIZE];
        for (slot, value) in data.iter_mut().zip(0u8..) {
            *slot = value;
        }
        data
    }

    #[test]
    fn base58_keeps_leading_zeros() {
        assert_eq!(base58_encode(&[0, 0, 1, 2]), "115T");
        assert_eq!(base58_decode("115T").expect("decode"), vec![0, 0, 1, 2]);
        assert!(base58_decode("0OIl").is_err());
    }

    #[rstest]
    #[case(LEGACY, KeyType::K1)]
    #[case(TYPED_K1, KeyType::K1)]
    #[case(TYPED_R1, KeyType::R1)]
    fn parses_every_key_form(#[case] text: &str, #[case] key_type: KeyType) {
        let key: PublicKey = text.parse().expect("parse");
        assert_eq!(key.key_type(), key_type);
        assert_eq!(hex::encode(key.data()), KEY_HEX);
    }

    #[test]
    fn k1_renders_in_both_formats() {
        let key: PublicKey = LEGACY.parse().expect("parse");
        assert_eq!(key.to_string_as(KeyFormat::Legacy), LEGACY);
        assert_eq!(key.to_string_as(KeyFormat::Typed), TYPED_K1);
        assert_eq!(key.to_string(), LEGACY);
    }

    #[test]
    fn r1_always_renders_typed() {
        let key: PublicKey = TYPED_R1.parse().expect("parse");
        assert_eq!(key.to_string_as(KeyFormat::Legacy), TYPED_R1);
    }

    #[rstest]
    #[case(0)]
    #[case(1)]
    #[case(2)]
    #[case(3)]
    fn corrupted_checksum_is_rejected(#[case] index: usize) {
        let body = LEGACY.strip_prefix("EOS").expect("prefix");
        let mut whole = base58_decode(body).expect("decode");
        let at = PUBLIC_KEY_DATA_SIZE + index;
        whole[at] ^= 0x01;
        let tampered = format!("EOS{}", base58_encode(&whole));
        assert!(matches!(
            tampered.parse::<PublicKey>(),
            Err(CodecError::ChecksumMismatch("public key"))
        ));
    }

    /// Flip one bit of the decoded payload or checksum and re-encode.
    fn tamper(prefix: &str, text: &str, from_end: usize) -> String {
        let body = text.strip_prefix(prefix).expect("prefix");
        let mut whole = base58_decode(body).expect("decode");
        let at = whole.len() - 1 - from_end;
        *whole.get_mut(at).expect("byte in range") ^= 0x01;
        format!("{prefix}{}", base58_encode(&whole))
    }

    #[rstest]
    #[case("PUB_K1_", TYPED_K1, 0)]
    #[case("PUB_K1_", TYPED_K1, 3)]
    #[case("PUB_K1_", TYPED_K1, CHECKSUM_SIZE)]
    #[case("PUB_R1_", TYPED_R1, 0)]
    #[case("PUB_R1_", TYPED_R1, CHECKSUM_SIZE)]
    fn corrupted_typed_key_is_rejected(#[case] prefix: &str, #[case] text: &str, #[case] from_end: usize) {
        assert!(matches!(
            tamper(prefix, text, from_end).parse::<PublicKey>(),
            Err(CodecError::ChecksumMismatch("public key"))
        ));
    }

    #[rstest]
    #[case("SIG_K1_", SIG_K1, 0)]
    #[case("SIG_K1_", SIG_K1, 2)]
    #[case("SIG_K1_", SIG_K1, CHECKSUM_SIZE)]
    #[case("SIG_R1_", SIG_R1, 0)]
    #[case("SIG_R1_", SIG_R1, CHECKSUM_SIZE + 10)]
    fn corrupted_signature_is_rejected(#[case] prefix: &str, #[case] text: &str, #[case] from_end: usize) {
        assert!(matches!(
            tamper(prefix, text, from_end).parse::<Signature>(),
            Err(CodecError::ChecksumMismatch("signature"))
        ));
    }

    #[test]
    fn k1_checksum_does_not_validate_r1_form() {
        let body = TYPED_K1.strip_prefix("PUB_K1_").expect("prefix");
        assert!(matches!(
            format!("PUB_R1_{body}").parse::<PublicKey>(),
            Err(CodecError::ChecksumMismatch("public key"))
        ));
        let sig_body = SIG_K1.strip_prefix("SIG_K1_").expect("prefix");
        assert!(matches!(
            format!("SIG_R1_{sig_body}").parse::<Signature>(),
            Err(CodecError::ChecksumMismatch("signature"))
        ));
    }

    #[test]
    fn legacy_checksum_does_not_validate_typed_form() {
        let body = LEGACY.strip_prefix("EOS").expect("prefix");
        assert!(matches!(
            format!("PUB_K1_{body}").parse::<PublicKey>(),
            Err(CodecError::ChecksumMismatch(_))
        ));
    }

    #[rstest]
    #[case("PUB_X1_5BiYrPwXwFmrjLQ3ZUa3BX9crdomJNfYdu6uC863XAXrJJkRbz")]
    #[case("BTC5BiYrPwXwFmrjLQ3ZUa3BX9crdomJNfYdu6uC863XAXrHNyWbo")]
    #[case("EOS115T")]
    fn malformed_keys_are_format_errors(#[case] text: &str) {
        assert!(matches!(
            text.parse::<PublicKey>(),
            Err(CodecError::InvalidFormat { kind: "public key", .. })
        ));
    }

    #[rstest]
    #[case(SIG_K1, KeyType::K1)]
    #[case(SIG_R1, KeyType::R1)]
    fn signatures_round_trip(#[case] text: &str, #[case] key_type: KeyType) {
        let signature: Signature = text.parse().expect("parse");
        assert_eq!(signature.key_type(), key_type);
        assert_eq!(signature.data(), &counting_bytes());
        assert_eq!(signature.to_string(), text);
        assert!(matches!(
            "SIG_X1_abc".parse::<Signature>(),
            Err(CodecError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn buffer_carries_type_byte_then_payload() {
        let key: PublicKey = TYPED_R1.parse().expect("parse");
        let signature = Signature::new(KeyType::K1, counting_bytes());
        let mut buf = ByteBuffer::new();
        buf.push_public_key(&key);
        buf.push_signature(&signature);
        assert_eq!(buf.len(), 1 + PUBLIC_KEY_DATA_SIZE + 1 + SIGNATURE_DATA_SIZE);
        assert_eq!(buf.as_bytes()[0], 1);
        assert_eq!(buf.get_public_key().expect("key"), key);
        assert_eq!(buf.get_signature().expect("signature"), signature);
    }

    #[test]
    fn unknown_type_byte_is_rejected() {
        let mut buf = ByteBuffer::from_slice(&[7; 34]);
        assert!(matches!(
            buf.get_public_key(),
            Err(CodecError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn serde_uses_text_forms() {
        let key: PublicKey = serde_json::from_str(&format!("\"{TYPED_K1}\"")).expect("key");
        assert_eq!(serde_json::to_string(&key).expect("json"), format!("\"{LEGACY}\""));
    }
}
