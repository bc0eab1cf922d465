//! Canonical binary serialisation for EOSIO-style chains.
//!
//! The crate converts typed values to and from the chain's byte-exact wire
//! format and drives that conversion from a contract ABI, so JSON payloads can
//! be packed into action data without per-contract code. Layers, leaf first:
//!
//! - [`serial`]: the [`serial::ByteBuffer`] cursor plus primitive, name,
//!   currency, big-integer and time codecs.
//! - [`keys`]: base58 checksum encodings for public keys and signatures.
//! - [`abi`]: ABI documents, schema resolution and the dynamic JSON codec.
//! - [`chain`]: transactions, packed transactions and the ABI provider seam.
//!
//! Runtime knobs live in [`config::SerializerConfig`]; every fallible call
//! reports a [`CodecError`].

pub mod abi;
pub mod chain;
pub mod config;
pub mod error;
pub mod keys;
pub mod serial;

pub use abi::{AbiCodec, AbiDefinition, ResolvedSchema};
pub use chain::{AbiProvider, DecodedTransaction, PackedTransaction, StaticAbiProvider, Transaction};
pub use config::SerializerConfig;
pub use error::CodecError;
pub use serial::ByteBuffer;
