//! Growable byte buffer with a forward-only read cursor.
//!
//! Writes append to the end of the buffer; reads consume from the cursor and
//! fail with [`CodecError::BufferOverrun`] rather than reading out of range.
//! All fixed-width integers and floats are little-endian on the wire.
#![expect(
    clippy::little_endian_bytes,
    reason = "the chain wire format is little-endian"
)]

use bytes::BytesMut;

use crate::error::CodecError;

/// Decimal places kept when widening a decoded `float32`.
const FLOAT32_DECIMALS: i32 = 7;

/// Byte sequence plus read cursor shared by every codec in the crate.
///
/// Invariant: `0 <= read_pos <= data.len()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteBuffer {
    data: BytesMut,
    read_pos: usize,
}

macro_rules! fixed_width {
    ($($push:ident, $get:ident, $ty:ty, $width:literal;)*) => {
        $(
            #[doc = concat!("Append a little-endian `", stringify!($ty), "`.")]
            pub fn $push(&mut self, value: $ty) { self.push_raw(&value.to_le_bytes()); }

            #[doc = concat!("Read a little-endian `", stringify!($ty), "`.")]
            ///
            /// # Errors
            /// Returns [`CodecError::BufferOverrun`] if too few bytes remain.
            pub fn $get(&mut self) -> Result<$ty, CodecError> {
                Ok(<$ty>::from_le_bytes(self.take_array::<$width>()?))
            }
        )*
    };
}

impl ByteBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Create a buffer holding a copy of `bytes`, cursor at the start.
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: BytesMut::from(bytes),
            read_pos: 0,
        }
    }

    /// Create a buffer from a hex string, with or without a `0x` prefix.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if `hex_str` is not valid hex.
    pub fn from_hex(hex_str: &str) -> Result<Self, CodecError> {
        Ok(Self::from_slice(&decode_hex("hex", hex_str)?))
    }

    /// Total number of bytes written.
    #[must_use]
    pub fn len(&self) -> usize { self.data.len() }

    /// Whether nothing has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.data.is_empty() }

    /// Current cursor position.
    #[must_use]
    pub const fn read_position(&self) -> usize { self.read_pos }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize { self.data.len().saturating_sub(self.read_pos) }

    /// Whether unread bytes remain.
    #[must_use]
    pub fn has_read_data(&self) -> bool { self.remaining() > 0 }

    /// Drop all bytes and rewind the cursor.
    pub fn clear(&mut self) {
        self.data.clear();
        self.read_pos = 0;
    }

    /// Rewind the cursor so the contents can be read again.
    pub const fn restart_read(&mut self) { self.read_pos = 0; }

    /// Borrow the written bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] { &self.data }

    /// Consume the buffer, returning the written bytes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> { self.data.to_vec() }

    /// Lowercase hex rendering of the written bytes.
    #[must_use]
    pub fn to_hex(&self) -> String { hex::encode(&self.data) }

    /// Append bytes verbatim.
    pub fn push_raw(&mut self, bytes: &[u8]) { self.data.extend_from_slice(bytes); }

    /// Append exactly `size` bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if `bytes` has a different length.
    pub fn push_fixed(
        &mut self,
        kind: &'static str,
        bytes: &[u8],
        size: usize,
    ) -> Result<(), CodecError> {
        if bytes.len() != size {
            return Err(CodecError::format(
                kind,
                format!("expected {size} bytes, got {}", bytes.len()),
            ));
        }
        self.push_raw(bytes);
        Ok(())
    }

    /// Append the bytes encoded by a hex string verbatim (no length prefix).
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if `hex_str` is not valid hex.
    pub fn push_hex(&mut self, hex_str: &str) -> Result<(), CodecError> {
        self.push_raw(&decode_hex("hex", hex_str)?);
        Ok(())
    }

    fn overrun(&self, needed: usize) -> CodecError {
        CodecError::BufferOverrun {
            offset: self.read_pos,
            needed,
            available: self.remaining(),
        }
    }

    /// Check that at least `needed` unread bytes remain without consuming
    /// them.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than `needed` remain.
    pub fn ensure_remaining(&self, needed: usize) -> Result<(), CodecError> {
        if needed > self.remaining() {
            return Err(self.overrun(needed));
        }
        Ok(())
    }

    /// Consume `len` bytes from the cursor.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than `len` bytes remain;
    /// the cursor is left untouched in that case.
    #[expect(
        clippy::indexing_slicing,
        reason = "range is checked against the buffer length"
    )]
    pub fn take(&mut self, len: usize) -> Result<&[u8], CodecError> {
        let start = self.read_pos;
        let Some(end) = start
            .checked_add(len)
            .filter(|stop| *stop <= self.data.len())
        else {
            return Err(self.overrun(len));
        };
        self.read_pos = end;
        Ok(&self.data[start..end])
    }

    /// Consume exactly `N` bytes into an array.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than `N` bytes remain.
    pub fn take_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fixed_width! {
        push_u8, get_u8, u8, 1;
        push_i8, get_i8, i8, 1;
        push_u16, get_u16, u16, 2;
        push_i16, get_i16, i16, 2;
        push_u32, get_u32, u32, 4;
        push_i32, get_i32, i32, 4;
        push_u64, get_u64, u64, 8;
        push_i64, get_i64, i64, 8;
        push_f64, get_f64, f64, 8;
    }

    /// Append a little-endian `f32`.
    pub fn push_f32(&mut self, value: f32) { self.push_raw(&value.to_le_bytes()); }

    /// Read a little-endian `f32`, widened to `f64` and rounded to seven
    /// decimal places so values such as `3.2` read back exactly.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if too few bytes remain.
    #[expect(
        clippy::float_arithmetic,
        reason = "decimal rounding of the widened value"
    )]
    pub fn get_f32(&mut self) -> Result<f64, CodecError> {
        let raw = f64::from(f32::from_le_bytes(self.take_array::<4>()?));
        let scale = 10f64.powi(FLOAT32_DECIMALS);
        Ok((raw * scale).round() / scale)
    }

    /// Append a boolean as a single `0`/`1` byte.
    pub fn push_bool(&mut self, value: bool) { self.push_u8(u8::from(value)); }

    /// Read a boolean; any non-zero byte is `true`.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if the buffer is exhausted.
    pub fn get_bool(&mut self) -> Result<bool, CodecError> { Ok(self.get_u8()? != 0) }

    /// Append an unsigned LEB128 integer (7-bit groups, low group first).
    #[expect(
        clippy::cast_possible_truncation,
        reason = "each group is masked to seven bits"
    )]
    pub fn push_varuint32(&mut self, value: u32) {
        let mut rest = value;
        while rest >= 0x80 {
            self.push_u8((rest & 0x7f) as u8 | 0x80);
            rest >>= 7;
        }
        self.push_u8(rest as u8);
    }

    /// Read an unsigned LEB128 integer.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if the encoding is truncated, or
    /// [`CodecError::OutOfRange`] if it does not fit in 32 bits.
    pub fn get_varuint32(&mut self) -> Result<u32, CodecError> {
        let mut value = 0u32;
        let mut shift = 0u32;
        loop {
            let byte = self.get_u8()?;
            if shift == 28 && byte & 0x70 != 0 {
                return Err(CodecError::range("varuint32", "more than 32 bits"));
            }
            value |= u32::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
            if shift > 28 {
                return Err(CodecError::range("varuint32", "more than five bytes"));
            }
        }
    }

    /// Append a zig-zag encoded signed varint.
    #[expect(
        clippy::cast_sign_loss,
        reason = "zig-zag maps the signed value onto the unsigned domain"
    )]
    pub fn push_varint32(&mut self, value: i32) {
        self.push_varuint32(((value << 1) ^ (value >> 31)) as u32);
    }

    /// Read a zig-zag encoded signed varint.
    ///
    /// # Errors
    /// Propagates [`ByteBuffer::get_varuint32`] failures.
    #[expect(
        clippy::cast_possible_wrap,
        reason = "zig-zag maps the unsigned value back onto the signed domain"
    )]
    pub fn get_varint32(&mut self) -> Result<i32, CodecError> {
        let raw = self.get_varuint32()?;
        Ok(((raw >> 1) as i32) ^ -((raw & 1) as i32))
    }

    /// Append a varuint32 length prefix followed by `bytes`.
    ///
    /// # Errors
    /// Returns [`CodecError::OutOfRange`] if the length exceeds `u32::MAX`.
    pub fn push_bytes(&mut self, bytes: &[u8]) -> Result<(), CodecError> {
        self.push_length(bytes.len())?;
        self.push_raw(bytes);
        Ok(())
    }

    /// Read a varuint32 length prefix and that many bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if the payload is truncated.
    pub fn get_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.get_length()?;
        Ok(self.take(len)?.to_vec())
    }

    /// Append a length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns [`CodecError::OutOfRange`] if the length exceeds `u32::MAX`.
    pub fn push_string(&mut self, value: &str) -> Result<(), CodecError> {
        self.push_bytes(value.as_bytes())
    }

    /// Read a length-prefixed UTF-8 string.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if the bytes are not UTF-8.
    pub fn get_string(&mut self) -> Result<String, CodecError> {
        let bytes = self.get_bytes()?;
        String::from_utf8(bytes).map_err(|e| CodecError::format("string", e.to_string()))
    }

    /// Append a collection length as varuint32.
    ///
    /// # Errors
    /// Returns [`CodecError::OutOfRange`] if `len` exceeds `u32::MAX`.
    pub fn push_length(&mut self, len: usize) -> Result<(), CodecError> {
        let count = u32::try_from(len).map_err(|_| CodecError::range("varuint32", len))?;
        self.push_varuint32(count);
        Ok(())
    }

    /// Read a collection length encoded as varuint32.
    ///
    /// # Errors
    /// Propagates [`ByteBuffer::get_varuint32`] failures.
    pub fn get_length(&mut self) -> Result<usize, CodecError> {
        let len = self.get_varuint32()?;
        usize::try_from(len).map_err(|_| CodecError::range("varuint32", len))
    }

    /// Append a fixed-size digest given as hex (optionally `0x`-prefixed).
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for bad hex or a wrong length.
    pub fn push_checksum(
        &mut self,
        kind: &'static str,
        hex_str: &str,
        size: usize,
    ) -> Result<(), CodecError> {
        let bytes = decode_hex(kind, hex_str)?;
        self.push_fixed(kind, &bytes, size)
    }

    /// Read a fixed-size digest and render it as lowercase hex.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than `size` bytes remain.
    pub fn get_checksum(&mut self, size: usize) -> Result<String, CodecError> {
        Ok(hex::encode(self.take(size)?))
    }
}

/// Decode a hex string, tolerating a leading `0x`.
pub(crate) fn decode_hex(kind: &'static str, hex_str: &str) -> Result<Vec<u8>, CodecError> {
    let digits = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    hex::decode(digits).map_err(|e| CodecError::format(kind, e.to_string()))
}
