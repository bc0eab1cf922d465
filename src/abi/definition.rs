//! ABI documents: the JSON shape contracts publish and its binary form.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::resolver::is_builtin_struct;
use crate::{error::CodecError, serial::ByteBuffer};

/// Type alias entry such as `account_name` → `name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiTypeDef {
    /// Alias being introduced.
    pub new_type_name: String,
    /// Type the alias stands for.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// One named, typed struct field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiField {
    /// Field name as it appears in JSON.
    pub name: String,
    /// Declared type, possibly suffixed with `[]`, `?` or `$`.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// A struct whose fields follow those of its optional base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiStruct {
    /// Struct name.
    pub name: String,
    /// Base struct name, empty when there is none.
    #[serde(default)]
    pub base: String,
    /// Fields in wire order.
    #[serde(default)]
    pub fields: Vec<AbiField>,
}

/// Binding from an action name to the struct carrying its data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiAction {
    /// Action name.
    pub name: String,
    /// Struct (or alias) describing the action data.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Ricardian contract text.
    #[serde(default)]
    pub ricardian_contract: String,
}

/// Contract table description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiTable {
    /// Table name.
    pub name: String,
    /// Primary index type, usually `i64`.
    pub index_type: String,
    /// Key column names.
    pub key_names: Vec<String>,
    /// Key column types.
    pub key_types: Vec<String>,
    /// Row struct name.
    #[serde(rename = "type")]
    pub type_name: String,
}

/// Ricardian clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiClause {
    /// Clause identifier.
    pub id: String,
    /// Clause text.
    pub body: String,
}

/// Contract error code and message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiErrorMessage {
    /// Numeric error code.
    pub error_code: u64,
    /// Message text.
    pub error_msg: String,
}

/// Tagged extension payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiExtension {
    /// Extension tag.
    pub tag: u16,
    /// Raw payload, hex in JSON.
    #[serde(with = "hex")]
    pub value: Vec<u8>,
}

/// A tagged union over a list of types.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiVariant {
    /// Variant name.
    pub name: String,
    /// Alternatives; the wire index is the position in this list.
    pub types: Vec<String>,
}

/// A contract ABI as returned by `get_abi`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AbiDefinition {
    /// Format version, e.g. `eosio::abi/1.1`.
    pub version: String,
    /// Type aliases.
    pub types: Vec<AbiTypeDef>,
    /// Struct definitions.
    pub structs: Vec<AbiStruct>,
    /// Action bindings.
    pub actions: Vec<AbiAction>,
    /// Tables.
    pub tables: Vec<AbiTable>,
    /// Ricardian clauses.
    pub ricardian_clauses: Vec<AbiClause>,
    /// Error messages.
    pub error_messages: Vec<AbiErrorMessage>,
    /// Extensions.
    pub abi_extensions: Vec<AbiExtension>,
    /// Variants.
    pub variants: Vec<AbiVariant>,
}

/// Binary layout of one ABI section entry.
trait AbiBinary: Sized {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError>;
    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError>;
}

fn write_list<T: AbiBinary>(buf: &mut ByteBuffer, items: &[T]) -> Result<(), CodecError> {
    buf.push_length(items.len())?;
    items.iter().try_for_each(|item| item.write(buf))
}

fn read_list<T: AbiBinary>(buf: &mut ByteBuffer) -> Result<Vec<T>, CodecError> {
    let len = buf.get_length()?;
    let mut items = Vec::with_capacity(len.min(buf.remaining()));
    for _ in 0..len {
        items.push(T::read(buf)?);
    }
    Ok(items)
}

/// Sections added after the first ABI revision may be absent from older
/// binaries.
fn read_trailing_list<T: AbiBinary>(buf: &mut ByteBuffer) -> Result<Vec<T>, CodecError> {
    if buf.has_read_data() {
        read_list(buf)
    } else {
        Ok(Vec::new())
    }
}

impl AbiBinary for String {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> { buf.push_string(self) }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> { buf.get_string() }
}

impl AbiBinary for AbiTypeDef {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_string(&self.new_type_name)?;
        buf.push_string(&self.type_name)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            new_type_name: buf.get_string()?,
            type_name: buf.get_string()?,
        })
    }
}

impl AbiBinary for AbiField {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_string(&self.name)?;
        buf.push_string(&self.type_name)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            name: buf.get_string()?,
            type_name: buf.get_string()?,
        })
    }
}

impl AbiBinary for AbiStruct {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_string(&self.name)?;
        buf.push_string(&self.base)?;
        write_list(buf, &self.fields)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            name: buf.get_string()?,
            base: buf.get_string()?,
            fields: read_list(buf)?,
        })
    }
}

impl AbiBinary for AbiAction {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_name(&self.name)?;
        buf.push_string(&self.type_name)?;
        buf.push_string(&self.ricardian_contract)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            name: buf.get_name()?,
            type_name: buf.get_string()?,
            ricardian_contract: buf.get_string()?,
        })
    }
}

impl AbiBinary for AbiTable {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_name(&self.name)?;
        buf.push_string(&self.index_type)?;
        write_list(buf, &self.key_names)?;
        write_list(buf, &self.key_types)?;
        buf.push_string(&self.type_name)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            name: buf.get_name()?,
            index_type: buf.get_string()?,
            key_names: read_list(buf)?,
            key_types: read_list(buf)?,
            type_name: buf.get_string()?,
        })
    }
}

impl AbiBinary for AbiClause {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_string(&self.id)?;
        buf.push_string(&self.body)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            id: buf.get_string()?,
            body: buf.get_string()?,
        })
    }
}

impl AbiBinary for AbiErrorMessage {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_u64(self.error_code);
        buf.push_string(&self.error_msg)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            error_code: buf.get_u64()?,
            error_msg: buf.get_string()?,
        })
    }
}

impl AbiBinary for AbiExtension {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_u16(self.tag);
        buf.push_bytes(&self.value)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            tag: buf.get_u16()?,
            value: buf.get_bytes()?,
        })
    }
}

impl AbiBinary for AbiVariant {
    fn write(&self, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        buf.push_string(&self.name)?;
        write_list(buf, &self.types)
    }

    fn read(buf: &mut ByteBuffer) -> Result<Self, CodecError> {
        Ok(Self {
            name: buf.get_string()?,
            types: read_list(buf)?,
        })
    }
}

fn check_unique<'a>(
    section: &str,
    names: impl IntoIterator<Item = &'a str>,
) -> Result<(), CodecError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(CodecError::format(
                "abi",
                format!("duplicate {section} definition {name:?}"),
            ));
        }
    }
    Ok(())
}

impl AbiDefinition {
    /// Parse an ABI from its JSON document.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] if `json` is not an ABI document.
    pub fn from_json(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str(json).map_err(|e| CodecError::format("abi", e.to_string()))
    }

    /// Find an action binding.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&AbiAction> {
        self.actions.iter().find(|action| action.name == name)
    }

    /// Find a struct definition.
    #[must_use]
    pub fn struct_def(&self, name: &str) -> Option<&AbiStruct> {
        self.structs.iter().find(|def| def.name == name)
    }

    /// Target of a type alias.
    #[must_use]
    pub fn alias(&self, name: &str) -> Option<&str> {
        self.types
            .iter()
            .find(|def| def.new_type_name == name)
            .map(|def| def.type_name.as_str())
    }

    /// Find a variant definition.
    #[must_use]
    pub fn variant(&self, name: &str) -> Option<&AbiVariant> {
        self.variants.iter().find(|def| def.name == name)
    }

    /// Names of every declared action.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.actions.iter().map(|action| action.name.as_str())
    }

    /// Check that names are unique within each section and that every base
    /// struct exists.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for duplicates and
    /// [`CodecError::UnknownType`] for a missing base.
    pub fn validate(&self) -> Result<(), CodecError> {
        check_unique("type", self.types.iter().map(|def| def.new_type_name.as_str()))?;
        check_unique("struct", self.structs.iter().map(|def| def.name.as_str()))?;
        check_unique("action", self.action_names())?;
        check_unique("variant", self.variants.iter().map(|def| def.name.as_str()))?;
        for def in &self.structs {
            let base = def.base.as_str();
            if !base.is_empty() && self.struct_def(base).is_none() && !is_builtin_struct(base) {
                return Err(CodecError::UnknownType(base.to_owned()));
            }
        }
        Ok(())
    }

    /// Serialise every section in wire order.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for an action or table name that
    /// cannot be packed.
    pub fn to_bin(&self) -> Result<Vec<u8>, CodecError> {
        let mut buf = ByteBuffer::new();
        buf.push_string(&self.version)?;
        write_list(&mut buf, &self.types)?;
        write_list(&mut buf, &self.structs)?;
        write_list(&mut buf, &self.actions)?;
        write_list(&mut buf, &self.tables)?;
        write_list(&mut buf, &self.ricardian_clauses)?;
        write_list(&mut buf, &self.error_messages)?;
        write_list(&mut buf, &self.abi_extensions)?;
        write_list(&mut buf, &self.variants)?;
        Ok(buf.into_vec())
    }

    /// Hex of the binary ABI prefixed by its varuint32 byte length, the form
    /// a `setabi` action carries.
    ///
    /// # Errors
    /// See [`AbiDefinition::to_bin`].
    pub fn encode_self(&self) -> Result<String, CodecError> {
        let mut buf = ByteBuffer::new();
        buf.push_bytes(&self.to_bin()?)?;
        Ok(buf.to_hex())
    }

    /// Read a binary ABI. The error message, extension and variant sections
    /// may be missing.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] for truncated input and
    /// [`CodecError::InvalidFormat`] for trailing bytes.
    pub fn from_bin(bytes: &[u8]) -> Result<Self, CodecError> {
        let mut buf = ByteBuffer::from_slice(bytes);
        let abi = Self {
            version: buf.get_string()?,
            types: read_list(&mut buf)?,
            structs: read_list(&mut buf)?,
            actions: read_list(&mut buf)?,
            tables: read_list(&mut buf)?,
            ricardian_clauses: read_list(&mut buf)?,
            error_messages: read_trailing_list(&mut buf)?,
            abi_extensions: read_trailing_list(&mut buf)?,
            variants: read_trailing_list(&mut buf)?,
        };
        if buf.has_read_data() {
            return Err(CodecError::format(
                "abi",
                format!("{} trailing bytes", buf.remaining()),
            ));
        }
        Ok(abi)
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};

    use super::*;

    #[fixture]
    fn token_abi() -> AbiDefinition {
        AbiDefinition::from_json(
            r#"{
                "version": "eosio::abi/1.1",
                "types": [{"new_type_name": "account_name", "type": "name"}],
                "structs": [{
                    "name": "transfer",
                    "base": "",
                    "fields": [
                        {"name": "from", "type": "account_name"},
                        {"name": "to", "type": "account_name"},
                        {"name": "quantity", "type": "asset"},
                        {"name": "memo", "type": "string"}
                    ]
                }],
                "actions": [{"name": "transfer", "type": "transfer", "ricardian_contract": ""}]
            }"#,
        )
        .expect("abi json")
    }

    #[rstest]
    fn lookups_find_declared_entries(token_abi: AbiDefinition) {
        assert_eq!(token_abi.action("transfer").map(|a| a.type_name.as_str()), Some("transfer"));
        assert_eq!(token_abi.alias("account_name"), Some("name"));
        assert!(token_abi.struct_def("issue").is_none());
        assert_eq!(token_abi.action_names().collect::<Vec<_>>(), vec!["transfer"]);
    }

    #[test]
    fn minimal_abi_encodes_every_section() {
        let abi = AbiDefinition {
            version: "v".to_owned(),
            ..AbiDefinition::default()
        };
        // length 10, "v", then eight empty sections
        assert_eq!(abi.encode_self().expect("encode"), "0a01760000000000000000");
    }

    #[test]
    fn later_sections_are_serialised() {
        let abi = AbiDefinition {
            version: "v".to_owned(),
            error_messages: vec![AbiErrorMessage {
                error_code: 2,
                error_msg: "no".to_owned(),
            }],
            abi_extensions: vec![AbiExtension {
                tag: 1,
                value: vec![0xab],
            }],
            variants: vec![AbiVariant {
                name: "v".to_owned(),
                types: vec!["int8".to_owned()],
            }],
            ..AbiDefinition::default()
        };
        let bin = abi.to_bin().expect("encode");
        assert_eq!(
            hex::encode(&bin),
            "01760000000000010200000000000000026e6f01010001ab0101760104696e7438"
        );
        assert_eq!(AbiDefinition::from_bin(&bin).expect("decode"), abi);
    }

    #[rstest]
    fn binary_form_reads_back(token_abi: AbiDefinition) {
        let bin = token_abi.to_bin().expect("encode");
        assert_eq!(AbiDefinition::from_bin(&bin).expect("decode"), token_abi);
    }

    #[test]
    fn older_binaries_may_omit_trailing_sections() {
        // version "v" and five empty sections only
        let abi = AbiDefinition::from_bin(&[1, b'v', 0, 0, 0, 0, 0]).expect("decode");
        assert_eq!(abi.version, "v");
        assert!(abi.variants.is_empty());
    }

    #[rstest]
    fn duplicate_structs_fail_validation(mut token_abi: AbiDefinition) {
        token_abi.validate().expect("valid");
        let copy = token_abi.structs[0].clone();
        token_abi.structs.push(copy);
        assert!(matches!(
            token_abi.validate(),
            Err(CodecError::InvalidFormat { kind: "abi", .. })
        ));
    }

    #[rstest]
    fn missing_base_fails_validation(mut token_abi: AbiDefinition) {
        token_abi.structs[0].base = "nothing".to_owned();
        assert!(matches!(
            token_abi.validate(),
            Err(CodecError::UnknownType(name)) if name == "nothing"
        ));
        token_abi.structs[0].base = "permission_level".to_owned();
        token_abi.validate().expect("builtin base");
    }

    #[test]
    fn extension_value_is_hex_in_json() {
        let ext: AbiExtension = serde_json::from_str(r#"{"tag": 3, "value": "beef"}"#).expect("json");
        assert_eq!(ext.value, vec![0xbe, 0xef]);
    }
}
