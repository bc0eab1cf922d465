//! Packed transactions and their decoding back into structured actions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use super::{
    provider::{AbiCache, AbiProvider},
    transaction::{
        Action,
        ActionData,
        PermissionLevel,
        Transaction,
        TransactionExtension,
        TransactionHeader,
    },
};
use crate::{
    abi::AbiCodec,
    config::SerializerConfig,
    error::CodecError,
    keys::Signature,
    serial::{ByteBuffer, Name, buffer::decode_hex},
};

/// Compression applied to `packed_trx`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Raw bytes.
    #[default]
    None,
    /// zlib-deflated bytes; recognised but not decoded.
    Zlib,
}

/// A transaction in its broadcast envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackedTransaction {
    /// Signatures over the transaction digest.
    #[serde(default)]
    pub signatures: Vec<Signature>,
    /// Encoding of `packed_trx`.
    #[serde(default)]
    pub compression: Compression,
    /// Encoded context-free data, hex in JSON.
    #[serde(default, with = "hex")]
    pub packed_context_free_data: Vec<u8>,
    /// Canonical transaction bytes, hex in JSON.
    #[serde(with = "hex")]
    pub packed_trx: Vec<u8>,
}

impl PackedTransaction {
    /// Unsigned envelope around hex-encoded transaction bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if `packed_trx` is not hex.
    pub fn from_hex(packed_trx: &str) -> Result<Self, CodecError> {
        Ok(Self {
            packed_trx: decode_hex("packed_trx", packed_trx)?,
            ..Self::default()
        })
    }

    /// Lowercase hex SHA-256 of `packed_trx`, equal to the inner
    /// [`Transaction::id`] for uncompressed envelopes.
    #[must_use]
    pub fn id(&self) -> String { hex::encode(Sha256::digest(&self.packed_trx)) }

    /// [`PackedTransaction::decode_with`] using default settings.
    ///
    /// # Errors
    /// See [`PackedTransaction::decode_with`].
    pub fn decode<P: AbiProvider + ?Sized>(
        &self,
        provider: &P,
    ) -> Result<DecodedTransaction, CodecError> {
        self.decode_with(provider, &SerializerConfig::default())
    }

    /// Parse `packed_trx` and decode every action's data with its contract
    /// ABI. Each account's ABI is fetched at most once per call.
    ///
    /// # Errors
    /// Returns [`CodecError::Unsupported`] for compressed input, context-free
    /// actions or transaction extensions, [`CodecError::AbiUnavailable`] when
    /// the provider fails, [`CodecError::InvalidFormat`] for trailing bytes,
    /// and any decoding failure of the action data.
    pub fn decode_with<P: AbiProvider + ?Sized>(
        &self,
        provider: &P,
        config: &SerializerConfig,
    ) -> Result<DecodedTransaction, CodecError> {
        if self.compression == Compression::Zlib {
            warn!("refusing compressed packed transaction");
            return Err(CodecError::Unsupported("zlib compression"));
        }
        let mut buf = ByteBuffer::from_slice(&self.packed_trx);
        let header = TransactionHeader::read(&mut buf)?;

        let context_free = buf.get_length()?;
        if context_free != 0 {
            warn!(count = context_free, "packed transaction has context free actions");
            return Err(CodecError::Unsupported("context free actions"));
        }

        let mut abis = AbiCache::new(provider);
        let codec = AbiCodec::from_config(config);
        let count = buf.get_length()?;
        let mut actions = Vec::with_capacity(count.min(buf.remaining()));
        for _ in 0..count {
            actions.push(DecodedAction::read(&mut buf, &mut abis, codec, config)?);
        }

        let extensions = buf.get_length()?;
        if extensions != 0 {
            warn!(count = extensions, "packed transaction has extensions");
            return Err(CodecError::Unsupported("transaction extensions"));
        }
        if buf.has_read_data() {
            return Err(CodecError::format(
                "packed_trx",
                format!("{} trailing bytes", buf.remaining()),
            ));
        }
        Ok(DecodedTransaction {
            header,
            context_free_actions: Vec::new(),
            actions,
            transaction_extensions: Vec::new(),
        })
    }
}

/// An action whose data has been decoded with its ABI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedAction {
    /// Contract account.
    pub account: Name,
    /// Action name.
    pub name: Name,
    /// Authorisations in wire order.
    pub authorization: Vec<PermissionLevel>,
    /// Decoded payload.
    pub data: Value,
    /// Payload bytes as they appeared on the wire.
    #[serde(with = "hex")]
    pub hex_data: Vec<u8>,
}

impl DecodedAction {
    fn read<P: AbiProvider + ?Sized>(
        buf: &mut ByteBuffer,
        abis: &mut AbiCache<'_, P>,
        codec: AbiCodec,
        config: &SerializerConfig,
    ) -> Result<Self, CodecError> {
        let account = Name::from_u64(buf.get_u64()?);
        let name = Name::from_u64(buf.get_u64()?);
        let levels = buf.get_length()?;
        let mut authorization = Vec::with_capacity(levels.min(buf.remaining()));
        for _ in 0..levels {
            authorization.push(PermissionLevel::read(buf)?);
        }
        let hex_data = buf.get_bytes()?;
        let schema = abis.action_schema(account, name, config.max_type_depth)?;
        let data = codec.decode(&schema, &hex_data)?;
        debug!(%account, action = %name, len = hex_data.len(), "decoded action data");
        Ok(Self {
            account,
            name,
            authorization,
            data,
            hex_data,
        })
    }
}

/// Structured view of a [`PackedTransaction`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodedTransaction {
    /// Header fields.
    #[serde(flatten)]
    pub header: TransactionHeader,
    /// Always empty; non-empty input is rejected.
    pub context_free_actions: Vec<DecodedAction>,
    /// Actions with decoded data.
    pub actions: Vec<DecodedAction>,
    /// Always empty; non-empty input is rejected.
    pub transaction_extensions: Vec<TransactionExtension>,
}

impl DecodedTransaction {
    /// Rebuild the [`Transaction`] from the wire bytes of each action.
    #[must_use]
    pub fn to_transaction(&self) -> Transaction {
        Transaction {
            header: self.header,
            context_free_actions: Vec::new(),
            actions: self
                .actions
                .iter()
                .map(|action| Action {
                    account: action.account,
                    name: action.name,
                    authorization: action.authorization.clone(),
                    data: ActionData::Packed(action.hex_data.clone()),
                })
                .collect(),
            transaction_extensions: self.transaction_extensions.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use rstest::{fixture, rstest};
    use serde_json::json;
    use test_util::TOKEN_ABI;

    use super::*;
    use crate::{
        abi::AbiDefinition,
        chain::{AbiProviderError, StaticAbiProvider},
    };

    struct CountingProvider {
        inner: StaticAbiProvider,
        calls: Cell<usize>,
    }

    impl AbiProvider for CountingProvider {
        fn fetch_abi(&self, account: &str) -> Result<AbiDefinition, AbiProviderError> {
            self.calls.set(self.calls.get() + 1);
            self.inner.fetch_abi(account)
        }
    }

    #[fixture]
    fn provider() -> CountingProvider {
        let abi = AbiDefinition::from_json(TOKEN_ABI).expect("token abi");
        CountingProvider {
            inner: StaticAbiProvider::new().with_abi("eosio.token", abi),
            calls: Cell::new(0),
        }
    }

    fn transfer(memo: &str) -> Action {
        Action {
            account: "eosio.token".parse().expect("name"),
            name: "transfer".parse().expect("name"),
            authorization: vec![PermissionLevel {
                actor: "alice".parse().expect("name"),
                permission: "active".parse().expect("name"),
            }],
            data: ActionData::Pending(json!({
                "from": "alice",
                "to": "bob",
                "quantity": "1.0000 EOS",
                "memo": memo,
            })),
        }
    }

    fn packed(provider: &CountingProvider) -> PackedTransaction {
        let mut trx = Transaction::new("2020-01-20T00:00:00".parse().expect("time"))
            .with_action(transfer("one"))
            .with_action(transfer("two"));
        trx.pack_actions(provider, &SerializerConfig::default())
            .expect("pack");
        trx.to_packed().expect("to_packed")
    }

    #[rstest]
    fn decodes_actions_fetching_each_abi_once(provider: CountingProvider) {
        let envelope = packed(&provider);
        let decoded = envelope.decode(&provider).expect("decode");
        assert_eq!(decoded.actions.len(), 2);
        assert_eq!(decoded.actions[1].data["memo"], "two");
        assert_eq!(decoded.actions[0].data["quantity"], "1.0000 EOS");
        assert_eq!(decoded.actions[0].authorization[0].actor.to_string(), "alice");
        // one fetch while packing, one while decoding
        assert_eq!(provider.calls.get(), 2);
    }

    #[rstest]
    fn decoded_transaction_rebuilds_the_same_id(provider: CountingProvider) {
        let envelope = packed(&provider);
        let decoded = envelope.decode(&provider).expect("decode");
        let rebuilt = decoded.to_transaction();
        assert_eq!(rebuilt.id().expect("id"), envelope.id());
        assert_eq!(rebuilt.encode().expect("encode"), envelope.packed_trx);
    }

    #[rstest]
    fn rejects_context_free_actions(provider: CountingProvider) {
        // 13 header bytes, then a context-free action count of one
        let mut bytes = vec![0_u8; 13];
        bytes.extend([1, 0, 0]);
        let envelope = PackedTransaction {
            packed_trx: bytes,
            ..PackedTransaction::default()
        };
        assert!(matches!(
            envelope.decode(&provider),
            Err(CodecError::Unsupported("context free actions"))
        ));
        assert_eq!(provider.calls.get(), 0);
    }

    #[rstest]
    fn rejects_extensions(provider: CountingProvider) {
        let mut bytes = vec![0_u8; 13];
        bytes.extend([0, 0, 1, 0, 0, 0]);
        let envelope = PackedTransaction {
            packed_trx: bytes,
            ..PackedTransaction::default()
        };
        assert!(matches!(
            envelope.decode(&provider),
            Err(CodecError::Unsupported("transaction extensions"))
        ));
    }

    #[rstest]
    fn rejects_compressed_input(provider: CountingProvider) {
        let envelope = PackedTransaction {
            compression: Compression::Zlib,
            ..packed(&provider)
        };
        assert!(matches!(
            envelope.decode(&provider),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[rstest]
    fn rejects_trailing_bytes(provider: CountingProvider) {
        let mut envelope = packed(&provider);
        envelope.packed_trx.push(0);
        assert!(matches!(
            envelope.decode(&provider),
            Err(CodecError::InvalidFormat { kind: "packed_trx", .. })
        ));
    }

    #[rstest]
    fn truncated_input_is_an_overrun(provider: CountingProvider) {
        let mut envelope = packed(&provider);
        envelope.packed_trx.truncate(20);
        assert!(matches!(
            envelope.decode(&provider),
            Err(CodecError::BufferOverrun { .. })
        ));
    }

    #[rstest]
    fn missing_abi_stops_decoding(provider: CountingProvider) {
        let envelope = packed(&provider);
        let empty = StaticAbiProvider::new();
        let err = envelope.decode(&empty).expect_err("no abi");
        assert!(matches!(
            err,
            CodecError::AbiUnavailable {
                source: AbiProviderError::NotFound(_),
                ..
            }
        ));
    }

    #[test]
    fn json_envelope_defaults() {
        let envelope: PackedTransaction =
            serde_json::from_value(json!({"packed_trx": "00ff"})).expect("envelope");
        assert_eq!(envelope.packed_trx, vec![0x00, 0xff]);
        assert_eq!(envelope.compression, Compression::None);
        assert!(envelope.signatures.is_empty());
        assert_eq!(
            PackedTransaction::from_hex("00ff").expect("hex"),
            envelope
        );
    }
}
