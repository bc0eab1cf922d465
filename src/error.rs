//! Error types for buffer access, value conversion and ABI processing.

use thiserror::Error;

use crate::chain::AbiProviderError;

/// Errors raised while encoding or decoding chain data.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A read needed more bytes than remain in the buffer.
    #[error("read past end of buffer: {needed} bytes needed at offset {offset}, {available} left")]
    BufferOverrun {
        /// Cursor position at the time of the read.
        offset: usize,
        /// Number of bytes the read required.
        needed: usize,
        /// Number of unread bytes.
        available: usize,
    },
    /// A value does not fit the target width or domain.
    #[error("{kind} value {value} is out of range")]
    OutOfRange {
        /// Wire type being written.
        kind: &'static str,
        /// Offending value, rendered for diagnostics.
        value: String,
    },
    /// Structured input (key, asset, number, hex, ...) is malformed.
    #[error("invalid {kind}: {reason}")]
    InvalidFormat {
        /// Wire type being parsed.
        kind: &'static str,
        /// Human readable cause.
        reason: String,
    },
    /// A key or signature failed its embedded checksum.
    #[error("{0} checksum doesn't match")]
    ChecksumMismatch(&'static str),
    /// A type referenced by an ABI is neither built in nor declared.
    #[error("{0} is not a known abi type")]
    UnknownType(String),
    /// The ABI declares no action with this name.
    #[error("{0} is not a valid action for this contract")]
    UnknownAction(String),
    /// Struct composition refers back to a struct still being resolved.
    #[error("type {0} refers to itself")]
    CyclicType(String),
    /// The input uses a wire feature this crate does not decode.
    #[error("unsupported: {0}")]
    Unsupported(&'static str),
    /// Asset arithmetic across two different symbols.
    #[error("symbols must match: {left} != {right}")]
    SymbolMismatch {
        /// Symbol of the left operand.
        left: String,
        /// Symbol of the right operand.
        right: String,
    },
    /// The ABI provider could not supply an account's ABI.
    #[error("ABI for account {account} is unavailable")]
    AbiUnavailable {
        /// Account whose ABI was requested.
        account: String,
        /// Failure reported by the provider.
        #[source]
        source: AbiProviderError,
    },
}

impl CodecError {
    /// Build an [`CodecError::InvalidFormat`] for `kind`.
    #[must_use]
    pub fn format(kind: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            kind,
            reason: reason.into(),
        }
    }

    /// Build an [`CodecError::OutOfRange`] for `kind`.
    #[must_use]
    pub fn range(kind: &'static str, value: impl ToString) -> Self {
        Self::OutOfRange {
            kind,
            value: value.to_string(),
        }
    }
}
