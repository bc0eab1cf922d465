//! Symbol codes, symbols and fixed-point assets.

use std::{cmp::Ordering, fmt, str::FromStr};

use super::ByteBuffer;
use crate::error::CodecError;

/// Longest symbol code that fits beside the precision byte.
pub const MAX_SYMBOL_CODE_LEN: usize = 7;

fn validate_code(code: &str) -> Result<(), CodecError> {
    if code.is_empty()
        || code.len() > MAX_SYMBOL_CODE_LEN
        || !code.bytes().all(|b| b.is_ascii_uppercase())
    {
        return Err(CodecError::format(
            "symbol_code",
            format!("{code:?} is not 1-{MAX_SYMBOL_CODE_LEN} uppercase letters"),
        ));
    }
    Ok(())
}

fn code_from_bytes(bytes: &[u8]) -> Result<String, CodecError> {
    let used = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let code = bytes.get(..used).unwrap_or_default();
    String::from_utf8(code.to_vec()).map_err(|e| CodecError::format("symbol_code", e.to_string()))
}

/// Token symbol: decimal precision plus code, e.g. `4,EOS`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    precision: u8,
    code: String,
}

impl Symbol {
    /// Build a symbol after validating the code.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for a malformed code.
    pub fn new(precision: u8, code: &str) -> Result<Self, CodecError> {
        validate_code(code)?;
        Ok(Self {
            precision,
            code: code.to_owned(),
        })
    }

    /// Number of decimal places.
    #[must_use]
    pub const fn precision(&self) -> u8 { self.precision }

    /// Symbol code such as `EOS`.
    #[must_use]
    pub fn code(&self) -> &str { &self.code }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl FromStr for Symbol {
    type Err = CodecError;

    /// Parse the `precision,CODE` form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (digits, code) = s
            .split_once(',')
            .ok_or_else(|| CodecError::format("symbol", format!("{s:?} is not precision,CODE")))?;
        let precision = digits
            .trim()
            .parse::<u8>()
            .map_err(|e| CodecError::format("symbol", e.to_string()))?;
        Self::new(precision, code.trim())
    }
}

/// Fixed-point amount paired with its symbol. The wire carries
/// `amount * 10^precision` as a signed 64-bit integer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Asset {
    amount: i64,
    symbol: Symbol,
}

impl Asset {
    /// Build an asset from an already scaled integer amount.
    #[must_use]
    pub const fn new(amount: i64, symbol: Symbol) -> Self { Self { amount, symbol } }

    /// Parse `"<amount> <CODE>"`. Without an explicit `precision`, the number
    /// of digits after the decimal point decides it. Surplus digits are
    /// rounded half away from zero.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for a missing symbol or a bad
    /// number, and [`CodecError::OutOfRange`] if the scaled amount overflows.
    pub fn parse_with_precision(input: &str, precision: Option<u8>) -> Result<Self, CodecError> {
        let mut parts = input.split_whitespace();
        let (Some(number), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(CodecError::format(
                "asset",
                format!("{input:?} is not in the form <amount> <symbol>"),
            ));
        };
        let (negative, unsigned) = number.strip_prefix('-').map_or_else(
            || (false, number.strip_prefix('+').unwrap_or(number)),
            |rest| (true, rest),
        );
        let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
        if (whole.is_empty() && frac.is_empty())
            || !whole.bytes().chain(frac.bytes()).all(|b| b.is_ascii_digit())
        {
            return Err(CodecError::format("asset", format!("invalid amount {number:?}")));
        }
        let places = precision.map_or_else(
            || u8::try_from(frac.len()).map_err(|_| CodecError::range("asset precision", frac.len())),
            Ok,
        )?;
        let symbol = Symbol::new(places, code)?;
        let amount = scale_amount(negative, whole, frac, places)
            .ok_or_else(|| CodecError::range("asset", input))?;
        Ok(Self { amount, symbol })
    }

    /// Scaled integer amount as carried on the wire.
    #[must_use]
    pub const fn amount(&self) -> i64 { self.amount }

    /// Asset symbol.
    #[must_use]
    pub const fn symbol(&self) -> &Symbol { &self.symbol }

    fn check_symbol(&self, other: &Self) -> Result<(), CodecError> {
        if self.symbol != other.symbol {
            return Err(CodecError::SymbolMismatch {
                left: self.symbol.to_string(),
                right: other.symbol.to_string(),
            });
        }
        Ok(())
    }

    /// Sum two assets of the same symbol.
    ///
    /// # Errors
    /// Returns [`CodecError::SymbolMismatch`] for different symbols and
    /// [`CodecError::OutOfRange`] on overflow.
    pub fn checked_add(&self, other: &Self) -> Result<Self, CodecError> {
        self.check_symbol(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or_else(|| CodecError::range("asset", format!("{self} + {other}")))?;
        Ok(Self::new(amount, self.symbol.clone()))
    }

    /// Subtract `other`; the result may not be negative.
    ///
    /// # Errors
    /// Returns [`CodecError::SymbolMismatch`] for different symbols and
    /// [`CodecError::OutOfRange`] if the result would be negative.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, CodecError> {
        self.check_symbol(other)?;
        match self.amount.checked_sub(other.amount) {
            Some(amount) if amount >= 0 => Ok(Self::new(amount, self.symbol.clone())),
            _ => Err(CodecError::range("asset", format!("{self} - {other}"))),
        }
    }
}

/// Combine integer and fractional digit strings into `value * 10^precision`,
/// rounding half away from zero on the first dropped digit.
///
/// Negative amounts accumulate downwards so `i64::MIN` stays reachable.
fn scale_amount(negative: bool, whole: &str, frac: &str, precision: u8) -> Option<i64> {
    let step = |acc: i64, digit: u8| {
        let shifted = acc.checked_mul(10)?;
        if negative {
            shifted.checked_sub(i64::from(digit))
        } else {
            shifted.checked_add(i64::from(digit))
        }
    };
    let mut value: i64 = 0;
    for b in whole.bytes() {
        value = step(value, b - b'0')?;
    }
    let mut frac_digits = frac.bytes();
    for _ in 0..precision {
        let digit = frac_digits.next().map_or(0, |b| b - b'0');
        value = step(value, digit)?;
    }
    if frac_digits.next().is_some_and(|b| b >= b'5') {
        value = if negative {
            value.checked_sub(1)?
        } else {
            value.checked_add(1)?
        };
    }
    Some(value)
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = usize::from(self.symbol.precision);
        let sign = if self.amount < 0 { "-" } else { "" };
        let digits = format!(
            "{:0>width$}",
            self.amount.unsigned_abs(),
            width = precision + 1
        );
        let (whole, frac) = digits.split_at(digits.len() - precision);
        if frac.is_empty() {
            write!(f, "{sign}{whole} {}", self.symbol.code)
        } else {
            write!(f, "{sign}{whole}.{frac} {}", self.symbol.code)
        }
    }
}

impl FromStr for Asset {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse_with_precision(s, None) }
}

impl PartialOrd for Asset {
    /// Assets only compare when their symbols match.
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        (self.symbol == other.symbol).then(|| self.amount.cmp(&other.amount))
    }
}

impl ByteBuffer {
    /// Append a symbol code left-aligned in an 8-byte zero-padded field.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if `code` is not 1-7 uppercase letters.
    pub fn push_symbol_code(&mut self, code: &str) -> Result<(), CodecError> {
        validate_code(code)?;
        let mut field = [0u8; 8];
        for (slot, b) in field.iter_mut().zip(code.bytes()) {
            *slot = b;
        }
        self.push_raw(&field);
        Ok(())
    }

    /// Read an 8-byte symbol code field.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than 8 bytes remain.
    pub fn get_symbol_code(&mut self) -> Result<String, CodecError> {
        code_from_bytes(&self.take_array::<8>()?)
    }

    /// Append a precision byte followed by a 7-byte code field.
    pub fn push_symbol(&mut self, symbol: &Symbol) {
        let mut field = [0u8; 8];
        let (precision, code) = field.split_at_mut(1);
        precision.fill(symbol.precision);
        for (slot, b) in code.iter_mut().zip(symbol.code.bytes()) {
            *slot = b;
        }
        self.push_raw(&field);
    }

    /// Read a precision byte and a 7-byte code field.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] if fewer than 8 bytes remain.
    pub fn get_symbol(&mut self) -> Result<Symbol, CodecError> {
        let precision = self.get_u8()?;
        let code = code_from_bytes(&self.take_array::<7>()?)?;
        Ok(Symbol { precision, code })
    }

    /// Append an asset: signed 64-bit amount then its symbol.
    pub fn push_asset(&mut self, asset: &Asset) {
        self.push_i64(asset.amount);
        self.push_symbol(&asset.symbol);
    }

    /// Parse an asset string and append it.
    ///
    /// # Errors
    /// See [`Asset::parse_with_precision`].
    pub fn push_asset_str(&mut self, input: &str, precision: Option<u8>) -> Result<(), CodecError> {
        self.push_asset(&Asset::parse_with_precision(input, precision)?);
        Ok(())
    }

    /// Read an asset.
    ///
    /// # Errors
    /// See [`ByteBuffer::get_symbol`].
    pub fn get_asset(&mut self) -> Result<Asset, CodecError> {
        let amount = self.get_i64()?;
        let symbol = self.get_symbol()?;
        Ok(Asset { amount, symbol })
    }
}
