//! Transaction envelopes and the ABI lookup they depend on.
//!
//! A [`Transaction`] encodes to the canonical bytes its id is hashed from;
//! a [`PackedTransaction`] carries those bytes and decodes them back into
//! structured actions, asking an [`AbiProvider`] for each contract's ABI.

pub mod packed;
pub mod provider;
pub mod transaction;

pub use packed::{Compression, DecodedAction, DecodedTransaction, PackedTransaction};
pub use provider::{AbiProvider, AbiProviderError, StaticAbiProvider};
pub use transaction::{
    Action,
    ActionData,
    DEFAULT_EXPIRATION_SECS,
    PermissionLevel,
    Transaction,
    TransactionExtension,
    TransactionHeader,
};
