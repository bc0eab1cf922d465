//! Transactions, their canonical encoding and id.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::debug;

use super::{
    packed::{Compression, PackedTransaction},
    provider::{AbiCache, AbiProvider},
};
use crate::{
    abi::AbiCodec,
    config::SerializerConfig,
    error::CodecError,
    serial::{ByteBuffer, Name, TimePointSec},
};

/// Seconds a freshly built transaction stays valid.
pub const DEFAULT_EXPIRATION_SECS: u32 = 30;

/// An `actor@permission` pair authorising an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PermissionLevel {
    /// Authorising account.
    pub actor: Name,
    /// Permission of that account, usually `active`.
    pub permission: Name,
}

impl PermissionLevel {
    pub(crate) fn write(self, buf: &mut ByteBuffer) {
        buf.push_u64(self.actor.as_u64());
        buf.push_u64(self.permission.as_u64());
    }

    pub(crate) fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            actor: Name::from_u64(buf.get_u64()?),
            permission: Name::from_u64(buf.get_u64()?),
        })
    }
}

/// Action payload: already encoded, or JSON still waiting for its ABI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionData {
    /// Encoded bytes, hex in JSON.
    Packed(#[serde(with = "hex")] Vec<u8>),
    /// Structured value to encode with the contract ABI.
    Pending(Value),
}

/// A contract call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Contract account.
    pub account: Name,
    /// Action name.
    pub name: Name,
    /// Required authorisations, in order.
    #[serde(default)]
    pub authorization: Vec<PermissionLevel>,
    /// Payload.
    pub data: ActionData,
}

impl Action {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        let ActionData::Packed(data) = &self.data else {
            return Err(CodecError::format(
                "action",
                format!("data for {}::{} has not been packed", self.account, self.name),
            ));
        };
        buf.push_u64(self.account.as_u64());
        buf.push_u64(self.name.as_u64());
        buf.push_length(self.authorization.len())?;
        for level in &self.authorization {
            level.write(buf);
        }
        buf.push_bytes(data)
    }
}

/// Tagged transaction extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionExtension {
    /// Extension type.
    #[serde(rename = "type")]
    pub tag: u16,
    /// Raw payload, hex in JSON.
    #[serde(with = "hex")]
    pub data: Vec<u8>,
}

/// Fixed-layout fields every transaction starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionHeader {
    /// Last second the transaction may be included.
    pub expiration: TimePointSec,
    /// Low 16 bits of the reference block number.
    pub ref_block_num: u16,
    /// Bytes 8..12 of the reference block id.
    pub ref_block_prefix: u32,
    /// Net bandwidth limit in 8-byte words, 0 for none.
    #[serde(default)]
    pub max_net_usage_words: u32,
    /// CPU limit in milliseconds, 0 for none.
    #[serde(default)]
    pub max_cpu_usage_ms: u8,
    /// Delay before execution.
    #[serde(default)]
    pub delay_sec: u32,
}

impl TransactionHeader {
    pub(crate) fn write(&self, buf: &mut ByteBuffer) {
        buf.push_u32(self.expiration.as_secs());
        buf.push_u16(self.ref_block_num);
        buf.push_u32(self.ref_block_prefix);
        buf.push_varuint32(self.max_net_usage_words);
        buf.push_u8(self.max_cpu_usage_ms);
        buf.push_varuint32(self.delay_sec);
    }

    pub(crate) fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            expiration: TimePointSec::from_secs(buf.get_u32()?),
            ref_block_num: buf.get_u16()?,
            ref_block_prefix: buf.get_u32()?,
            max_net_usage_words: buf.get_varuint32()?,
            max_cpu_usage_ms: buf.get_u8()?,
            delay_sec: buf.get_varuint32()?,
        })
    }
}

/// An unsigned transaction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Header fields.
    #[serde(flatten)]
    pub header: TransactionHeader,
    /// Actions run without authorisation checks.
    #[serde(default)]
    pub context_free_actions: Vec<Action>,
    /// Actions in execution order.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Extensions.
    #[serde(default)]
    pub transaction_extensions: Vec<TransactionExtension>,
}

impl Transaction {
    /// Empty transaction expiring at `expiration`.
    #[must_use]
    pub fn new(expiration: TimePointSec) -> Self {
        Self {
            header: TransactionHeader {
                expiration,
                ..TransactionHeader::default()
            },
            ..Self::default()
        }
    }

    /// Empty transaction expiring `secs` from now.
    ///
    /// # Errors
    /// Returns [`CodecError::OutOfRange`] if the clock is outside the `u32`
    /// seconds range.
    pub fn expiring_in(secs: u32) -> Result<Self, CodecError> {
        Ok(Self::new(TimePointSec::now()?.saturating_add(secs)))
    }

    /// Append an action.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Set the reference block; only the low 16 bits of the number are kept.
    #[expect(
        clippy::little_endian_bytes,
        reason = "the low two bytes are the chain's block number tag"
    )]
    pub const fn set_reference_block(&mut self, block_num: u32, block_prefix: u32) {
        let [lo, hi, _, _] = block_num.to_le_bytes();
        self.header.ref_block_num = u16::from_le_bytes([lo, hi]);
        self.header.ref_block_prefix = block_prefix;
    }

    /// Encode every [`ActionData::Pending`] payload with its contract's ABI.
    ///
    /// # Errors
    /// Returns [`CodecError::AbiUnavailable`] if the provider fails,
    /// [`CodecError::UnknownAction`] for an action missing from the ABI, and
    /// any encoding failure.
    pub fn pack_actions<P: AbiProvider + ?Sized>(
        &mut self,
        provider: &P,
        config: &SerializerConfig,
    ) -> Result<(), CodecError> {
        let mut abis = AbiCache::new(provider);
        let codec = AbiCodec::from_config(config);
        for action in self
            .context_free_actions
            .iter_mut()
            .chain(self.actions.iter_mut())
        {
            let ActionData::Pending(value) = &action.data else {
                continue;
            };
            let schema = abis.action_schema(action.account, action.name, config.max_type_depth)?;
            let bytes = codec.encode(&schema, value)?;
            debug!(
                account = %action.account,
                action = %action.name,
                len = bytes.len(),
                "packed action data"
            );
            action.data = ActionData::Packed(bytes);
        }
        Ok(())
    }

    /// Canonical binary encoding.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if an action still holds pending
    /// JSON; call [`Transaction::pack_actions`] first.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = ByteBuffer::new();
        self.header.write(&mut buf);
        for list in [&self.context_free_actions, &self.actions] {
            buf.push_length(list.len())?;
            for action in list {
                action.write(&mut buf)?;
            }
        }
        buf.push_length(self.transaction_extensions.len())?;
        for extension in &self.transaction_extensions {
            buf.push_u16(extension.tag);
            buf.push_bytes(&extension.data)?;
        }
        Ok(buf.into_vec())
    }

    /// Lowercase hex SHA-256 of [`Transaction::encode`].
    ///
    /// # Errors
    /// See [`Transaction::encode`].
    pub fn id(&self) -> Result<String, CodecError> { Ok(hex::encode(Sha256::digest(self.encode()?))) }

    /// Unsigned, uncompressed envelope around the encoding.
    ///
    /// # Errors
    /// See [`Transaction::encode`].
    pub fn to_packed(&self) -> Result<PackedTransaction, CodecError> {
        Ok(PackedTransaction {
            signatures: Vec::new(),
            compression: Compression::None,
            packed_context_free_data: Vec::new(),
            packed_trx: self.encode()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use serde_json::json;

    use super::*;

    fn name(s: &str) -> Name { s.parse().expect("name") }

    #[fixture]
    fn transfer() -> Transaction {
        let mut trx = Transaction::new("2020-01-20T00:00:00".parse().expect("time"));
        trx.set_reference_block(0x0001_2345, 0xdead_beef);
        trx.with_action(Action {
            account: name("eosio.token"),
            name: name("transfer"),
            authorization: vec![PermissionLevel {
                actor: name("bitsfleamain"),
                permission: name("active"),
            }],
            data: ActionData::Packed(vec![0xaa, 0xbb]),
        })
    }

    #[rstest]
    fn header_layout(transfer: Transaction) {
        let bytes = transfer.encode().expect("encode");
        assert_eq!(hex::encode(&bytes[..13]), "80ed245e4523efbeadde000000");
        // cfa count, one action, then the extension count last
        assert_eq!(bytes[13], 0);
        assert_eq!(bytes[14], 1);
        assert_eq!(bytes.last(), Some(&0));
        assert_eq!(bytes.len(), 14 + 1 + 16 + 1 + 16 + 1 + 2 + 1);
    }

    #[rstest]
    fn id_is_sha256_of_the_encoding(transfer: Transaction) {
        let bytes = transfer.encode().expect("encode");
        let expected = hex::encode(Sha256::digest(&bytes));
        assert_eq!(transfer.id().expect("id"), expected);
        assert_eq!(expected.len(), 64);
    }

    #[test]
    fn empty_transaction_id_hashes_header_only() {
        let trx = Transaction::default();
        assert_eq!(
            trx.encode().expect("encode"),
            vec![0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]
        );
    }

    #[rstest]
    fn pending_data_cannot_be_encoded(mut transfer: Transaction) {
        transfer.actions[0].data = ActionData::Pending(json!({"memo": "x"}));
        assert!(matches!(
            transfer.encode(),
            Err(CodecError::InvalidFormat { kind: "action", .. })
        ));
    }

    #[test]
    fn reference_block_keeps_low_sixteen_bits() {
        let mut trx = Transaction::default();
        trx.set_reference_block(0xabcd_1234, 7);
        assert_eq!(trx.header.ref_block_num, 0x1234);
        assert_eq!(trx.header.ref_block_prefix, 7);
    }

    #[test]
    fn expiry_is_in_the_future() {
        let now = TimePointSec::now().expect("clock");
        let trx = Transaction::expiring_in(DEFAULT_EXPIRATION_SECS).expect("trx");
        assert!(trx.header.expiration > now);
    }

    #[rstest]
    fn json_form_round_trips(transfer: Transaction) {
        let text = serde_json::to_value(&transfer).expect("serialize");
        assert_eq!(text["expiration"], "2020-01-20T00:00:00");
        assert_eq!(text["ref_block_num"], 0x2345);
        assert_eq!(text["actions"][0]["data"], "aabb");
        assert_eq!(text["actions"][0]["authorization"][0]["actor"], "bitsfleamain");
        let back: Transaction = serde_json::from_value(text).expect("deserialize");
        assert_eq!(back, transfer);
    }

    #[test]
    fn structured_data_deserialises_as_pending() {
        let action: Action = serde_json::from_value(json!({
            "account": "eosio.token",
            "name": "transfer",
            "authorization": [],
            "data": {"from": "a", "to": "b"}
        }))
        .expect("action");
        assert!(matches!(action.data, ActionData::Pending(_)));
    }
}
