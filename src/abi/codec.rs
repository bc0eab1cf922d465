//! JSON ⇄ binary conversion driven by a [`ResolvedSchema`].
//!
//! The wire format carries no field tags, so both directions walk the schema
//! in declaration order. Integers are accepted as JSON numbers or decimal
//! strings; every value is range-checked against its wire width.

use serde_json::{Map, Value};

use super::{
    definition::AbiDefinition,
    resolver::{AbiResolver, FieldKind, PrimitiveKind, ResolvedSchema, ResolvedVariant},
};
use crate::{
    config::SerializerConfig,
    error::CodecError,
    keys::{KeyFormat, PublicKey, Signature},
    serial::{ByteBuffer, Symbol, buffer::decode_hex},
};

/// Most elements a decoded array may hold when its element type occupies no
/// bytes, such as an array of empty structs.
pub const MAX_ZERO_WIDTH_ELEMENTS: usize = 1024;

/// Encoder/decoder for schema-described values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AbiCodec {
    key_format: KeyFormat,
}

fn expected(kind: &'static str, what: &str, value: &Value) -> CodecError {
    CodecError::format(kind, format!("expected {what}, got {value}"))
}

fn as_str<'v>(kind: &'static str, value: &'v Value) -> Result<&'v str, CodecError> {
    value.as_str().ok_or_else(|| expected(kind, "a string", value))
}

fn integer<T: TryFrom<i128>>(kind: &'static str, value: &Value) -> Result<T, CodecError> {
    let wide = match value {
        Value::Number(n) => n
            .as_i64()
            .map(i128::from)
            .or_else(|| n.as_u64().map(i128::from)),
        Value::String(s) => s.trim().parse::<i128>().ok(),
        _ => None,
    }
    .ok_or_else(|| expected(kind, "an integer", value))?;
    T::try_from(wide).map_err(|_| CodecError::range(kind, wide))
}

fn float(kind: &'static str, value: &Value) -> Result<f64, CodecError> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .ok_or_else(|| expected(kind, "a number", value))?;
    if number.is_finite() {
        Ok(number)
    } else {
        Err(CodecError::range(kind, number))
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "magnitude is checked against f32::MAX first"
)]
fn narrow_f32(value: f64) -> Result<f32, CodecError> {
    if value.abs() > f64::from(f32::MAX) {
        return Err(CodecError::range("float32", value));
    }
    Ok(value as f32)
}

impl AbiCodec {
    /// Codec rendering decoded public keys in `key_format`.
    #[must_use]
    pub const fn new(key_format: KeyFormat) -> Self { Self { key_format } }

    /// Codec configured from `config`.
    #[must_use]
    pub const fn from_config(config: &SerializerConfig) -> Self { Self::new(config.key_format) }

    /// Encode `value` against `schema`.
    ///
    /// # Errors
    /// Returns [`CodecError::InvalidFormat`] for values of the wrong shape or
    /// missing fields, [`CodecError::OutOfRange`] for values too wide for
    /// their field, and any primitive codec failure.
    pub fn encode(&self, schema: &ResolvedSchema, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut buf = ByteBuffer::new();
        self.encode_into(schema, value, &mut buf)?;
        Ok(buf.into_vec())
    }

    /// Encode `value` against `schema`, appending to `buf`.
    ///
    /// # Errors
    /// See [`AbiCodec::encode`].
    pub fn encode_into(
        &self,
        schema: &ResolvedSchema,
        value: &Value,
        buf: &mut ByteBuffer,
    ) -> Result<(), CodecError> {
        self.encode_struct(schema, value, buf)
    }

    /// Decode exactly one `schema` record from `bytes`.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] for truncated input and
    /// [`CodecError::InvalidFormat`] if bytes remain after the record.
    pub fn decode(&self, schema: &ResolvedSchema, bytes: &[u8]) -> Result<Value, CodecError> {
        let mut buf = ByteBuffer::from_slice(bytes);
        let value = self.decode_from(schema, &mut buf)?;
        if buf.has_read_data() {
            return Err(CodecError::format(
                "struct",
                format!("{} trailing bytes after {}", buf.remaining(), schema.name),
            ));
        }
        Ok(value)
    }

    /// Decode one `schema` record from the cursor of `buf`.
    ///
    /// # Errors
    /// Returns [`CodecError::BufferOverrun`] for truncated input and any
    /// primitive codec failure.
    pub fn decode_from(
        &self,
        schema: &ResolvedSchema,
        buf: &mut ByteBuffer,
    ) -> Result<Value, CodecError> {
        let mut object = Map::new();
        for field in &schema.fields {
            if field.binary_extension && !buf.has_read_data() {
                break;
            }
            object.insert(field.name.clone(), self.decode_kind(&field.kind, buf)?);
        }
        Ok(Value::Object(object))
    }

    fn encode_struct(
        &self,
        schema: &ResolvedSchema,
        value: &Value,
        buf: &mut ByteBuffer,
    ) -> Result<(), CodecError> {
        let object = match value {
            // An absent record is written as an empty count.
            Value::Null => {
                buf.push_varuint32(0);
                return Ok(());
            }
            Value::Object(object) => object,
            other => return Err(expected("struct", "an object", other)),
        };
        for (position, field) in schema.fields.iter().enumerate() {
            match object.get(&field.name) {
                Some(item) => self.encode_kind(&field.kind, item, buf)?,
                None if field.binary_extension => {
                    return check_extension_tail(schema, object, position);
                }
                None if matches!(field.kind, FieldKind::Optional(_)) => buf.push_u8(0),
                None => {
                    return Err(CodecError::format(
                        "struct",
                        format!("{} is missing field {}", schema.name, field.name),
                    ));
                }
            }
        }
        Ok(())
    }

    fn encode_kind(&self, kind: &FieldKind, value: &Value, buf: &mut ByteBuffer) -> Result<(), CodecError> {
        match kind {
            FieldKind::Primitive(primitive) => encode_primitive(*primitive, value, buf),
            FieldKind::Struct(schema) => self.encode_struct(schema, value, buf),
            FieldKind::Variant(variant) => self.encode_variant(variant, value, buf),
            FieldKind::Array(inner) => {
                let items = value
                    .as_array()
                    .ok_or_else(|| expected("array", "an array", value))?;
                buf.push_length(items.len())?;
                items
                    .iter()
                    .try_for_each(|item| self.encode_kind(inner, item, buf))
            }
            FieldKind::Optional(inner) => {
                if value.is_null() {
                    buf.push_u8(0);
                    Ok(())
                } else {
                    buf.push_u8(1);
                    self.encode_kind(inner, value, buf)
                }
            }
        }
    }

    fn encode_variant(
        &self,
        variant: &ResolvedVariant,
        value: &Value,
        buf: &mut ByteBuffer,
    ) -> Result<(), CodecError> {
        let (Some(case_name), Some(inner), 2) = (
            value.get(0).and_then(Value::as_str),
            value.get(1),
            value.as_array().map_or(0, Vec::len),
        ) else {
            return Err(expected("variant", "[\"type\", value]", value));
        };
        let (index, (_, case_kind)) = variant
            .cases
            .iter()
            .enumerate()
            .find(|(_, (name, _))| name == case_name)
            .ok_or_else(|| {
                CodecError::format(
                    "variant",
                    format!("{case_name} is not a case of {}", variant.name),
                )
            })?;
        let wire_index = u32::try_from(index).map_err(|_| CodecError::range("variant", index))?;
        buf.push_varuint32(wire_index);
        self.encode_kind(case_kind, inner, buf)
    }

    fn decode_kind(&self, kind: &FieldKind, buf: &mut ByteBuffer) -> Result<Value, CodecError> {
        match kind {
            FieldKind::Primitive(primitive) => self.decode_primitive(*primitive, buf),
            FieldKind::Struct(schema) => self.decode_from(schema, buf),
            FieldKind::Variant(variant) => {
                let index = buf.get_varuint32()?;
                let (name, case_kind) = usize::try_from(index)
                    .ok()
                    .and_then(|i| variant.cases.get(i))
                    .ok_or_else(|| CodecError::range("variant", index))?;
                Ok(Value::Array(vec![
                    Value::String(name.clone()),
                    self.decode_kind(case_kind, buf)?,
                ]))
            }
            FieldKind::Array(inner) => {
                let len = buf.get_length()?;
                match inner.min_wire_size() {
                    0 if len > MAX_ZERO_WIDTH_ELEMENTS => {
                        return Err(CodecError::range("array length", len));
                    }
                    0 => {}
                    width => buf.ensure_remaining(len.saturating_mul(width))?,
                }
                let mut items = Vec::with_capacity(len);
                for _ in 0..len {
                    items.push(self.decode_kind(inner, buf)?);
                }
                Ok(Value::Array(items))
            }
            FieldKind::Optional(inner) => match buf.get_u8()? {
                0 => Ok(Value::Null),
                1 => self.decode_kind(inner, buf),
                other => Err(CodecError::format(
                    "optional",
                    format!("presence byte {other}"),
                )),
            },
        }
    }

    fn decode_primitive(&self, kind: PrimitiveKind, buf: &mut ByteBuffer) -> Result<Value, CodecError> {
        Ok(match kind {
            PrimitiveKind::Bool => Value::Bool(buf.get_bool()?),
            PrimitiveKind::Int8 => buf.get_i8()?.into(),
            PrimitiveKind::Uint8 => buf.get_u8()?.into(),
            PrimitiveKind::Int16 => buf.get_i16()?.into(),
            PrimitiveKind::Uint16 => buf.get_u16()?.into(),
            PrimitiveKind::Int32 => buf.get_i32()?.into(),
            PrimitiveKind::Uint32 => buf.get_u32()?.into(),
            PrimitiveKind::Int64 => buf.get_i64()?.into(),
            PrimitiveKind::Uint64 => buf.get_u64()?.into(),
            PrimitiveKind::Uint128 => buf.get_uint128()?.into(),
            PrimitiveKind::VarUint32 => buf.get_varuint32()?.into(),
            PrimitiveKind::VarInt32 => buf.get_varint32()?.into(),
            PrimitiveKind::Float32 => buf.get_f32()?.into(),
            PrimitiveKind::Float64 => buf.get_f64()?.into(),
            PrimitiveKind::Name => buf.get_name()?.into(),
            PrimitiveKind::Bytes => hex::encode(buf.get_bytes()?).into(),
            PrimitiveKind::String => buf.get_string()?.into(),
            PrimitiveKind::SymbolCode => buf.get_symbol_code()?.into(),
            PrimitiveKind::Symbol => buf.get_symbol()?.to_string().into(),
            PrimitiveKind::Asset => buf.get_asset()?.to_string().into(),
            PrimitiveKind::Checksum160 => buf.get_checksum(20)?.into(),
            PrimitiveKind::Checksum256 => buf.get_checksum(32)?.into(),
            PrimitiveKind::Checksum512 => buf.get_checksum(64)?.into(),
            PrimitiveKind::PublicKey => buf.get_public_key()?.to_string_as(self.key_format).into(),
            PrimitiveKind::Signature => buf.get_signature()?.to_string().into(),
            PrimitiveKind::TimePoint => buf.get_time_point()?.into(),
            PrimitiveKind::TimePointSec => buf.get_time_point_sec()?.into(),
            PrimitiveKind::BlockTimestamp => buf.get_block_timestamp()?.into(),
        })
    }
}

/// Binary extensions are positional: once one is omitted, every later field
/// must be omitted too.
fn check_extension_tail(
    schema: &ResolvedSchema,
    object: &Map<String, Value>,
    omitted: usize,
) -> Result<(), CodecError> {
    let Some(present) = schema
        .fields
        .iter()
        .skip(omitted.saturating_add(1))
        .find(|field| object.contains_key(&field.name))
    else {
        return Ok(());
    };
    Err(CodecError::format(
        "struct",
        format!(
            "{} sets {} after an omitted extension field",
            schema.name, present.name
        ),
    ))
}

fn encode_primitive(kind: PrimitiveKind, value: &Value, buf: &mut ByteBuffer) -> Result<(), CodecError> {
    let name = kind.type_name();
    match kind {
        PrimitiveKind::Bool => match value {
            Value::Bool(flag) => buf.push_bool(*flag),
            other => buf.push_bool(integer::<u8>(name, other).and_then(|n| match n {
                0 | 1 => Ok(n == 1),
                _ => Err(CodecError::range(name, n)),
            })?),
        },
        PrimitiveKind::Int8 => buf.push_i8(integer(name, value)?),
        PrimitiveKind::Uint8 => buf.push_u8(integer(name, value)?),
        PrimitiveKind::Int16 => buf.push_i16(integer(name, value)?),
        PrimitiveKind::Uint16 => buf.push_u16(integer(name, value)?),
        PrimitiveKind::Int32 => buf.push_i32(integer(name, value)?),
        PrimitiveKind::Uint32 => buf.push_u32(integer(name, value)?),
        PrimitiveKind::Int64 => buf.push_i64(integer(name, value)?),
        PrimitiveKind::Uint64 => buf.push_u64(integer(name, value)?),
        PrimitiveKind::VarUint32 => buf.push_varuint32(integer(name, value)?),
        PrimitiveKind::VarInt32 => buf.push_varint32(integer(name, value)?),
        PrimitiveKind::Uint128 => match value {
            Value::Number(n) => buf.push_uint128(&n.to_string())?,
            other => buf.push_uint128(as_str(name, other)?)?,
        },
        PrimitiveKind::Float32 => buf.push_f32(narrow_f32(float(name, value)?)?),
        PrimitiveKind::Float64 => buf.push_f64(float(name, value)?),
        PrimitiveKind::Name => buf.push_name(as_str(name, value)?)?,
        PrimitiveKind::Bytes => buf.push_bytes(&decode_hex(name, as_str(name, value)?)?)?,
        PrimitiveKind::String => buf.push_string(as_str(name, value)?)?,
        PrimitiveKind::SymbolCode => buf.push_symbol_code(as_str(name, value)?)?,
        PrimitiveKind::Symbol => buf.push_symbol(&as_str(name, value)?.parse::<Symbol>()?),
        PrimitiveKind::Asset => buf.push_asset_str(as_str(name, value)?, None)?,
        PrimitiveKind::Checksum160 => buf.push_checksum(name, as_str(name, value)?, 20)?,
        PrimitiveKind::Checksum256 => buf.push_checksum(name, as_str(name, value)?, 32)?,
        PrimitiveKind::Checksum512 => buf.push_checksum(name, as_str(name, value)?, 64)?,
        PrimitiveKind::PublicKey => buf.push_public_key(&as_str(name, value)?.parse::<PublicKey>()?),
        PrimitiveKind::Signature => buf.push_signature(&as_str(name, value)?.parse::<Signature>()?),
        PrimitiveKind::TimePoint => buf.push_time_point(as_str(name, value)?)?,
        PrimitiveKind::TimePointSec => buf.push_time_point_sec(as_str(name, value)?)?,
        PrimitiveKind::BlockTimestamp => buf.push_block_timestamp(as_str(name, value)?)?,
    }
    Ok(())
}

impl AbiDefinition {
    /// Encode an action's (or struct's) JSON data with default settings.
    ///
    /// # Errors
    /// Propagates resolution and encoding failures.
    pub fn json_to_bin(&self, name: &str, data: &Value) -> Result<Vec<u8>, CodecError> {
        let schema = AbiResolver::new(self).resolve(name)?;
        AbiCodec::default().encode(&schema, data)
    }

    /// Decode an action's (or struct's) binary data with default settings.
    ///
    /// # Errors
    /// Propagates resolution and decoding failures.
    pub fn bin_to_json(&self, name: &str, bytes: &[u8]) -> Result<Value, CodecError> {
        let schema = AbiResolver::new(self).resolve(name)?;
        AbiCodec::default().decode(&schema, bytes)
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;
    use test_util::{LEGACY_KEY, NEWACCOUNT_HEX, TYPED_KEY};

    use super::*;

    fn schema(abi_json: &str, name: &str) -> ResolvedSchema {
        let abi = AbiDefinition::from_json(abi_json).expect("abi json");
        AbiResolver::new(&abi).resolve(name).expect("resolve")
    }

    fn single(type_name: &str) -> ResolvedSchema {
        schema(
            &format!(
                r#"{{"structs": [{{"name": "s", "base": "", "fields": [{{"name": "v", "type": "{type_name}"}}]}}]}}"#
            ),
            "s",
        )
    }

    fn newaccount_data() -> Value {
        let auth = json!({
            "threshold": 1,
            "keys": [{"key": LEGACY_KEY, "weight": 1}],
            "accounts": [],
            "waits": []
        });
        json!({
            "creator": "bitsfleamain",
            "newact": "n1h3qsftu5bm",
            "owner": auth,
            "active": auth
        })
    }

    #[test]
    fn builtin_authority_matches_reference_bytes() {
        let schema = schema(
            r#"{"structs": [{"name": "newaccount", "base": "", "fields": [
                {"name": "creator", "type": "name"},
                {"name": "newact", "type": "name"},
                {"name": "owner", "type": "authority"},
                {"name": "active", "type": "authority"}
            ]}]}"#,
            "newaccount",
        );
        let codec = AbiCodec::default();
        let bytes = codec.encode(&schema, &newaccount_data()).expect("encode");
        assert_eq!(hex::encode(&bytes), NEWACCOUNT_HEX);
        assert_eq!(codec.decode(&schema, &bytes).expect("decode"), newaccount_data());
    }

    #[test]
    fn typed_key_format_changes_decoded_keys() {
        let schema = single("public_key");
        let bytes = AbiCodec::default().encode(&schema, &json!({"v": LEGACY_KEY})).expect("encode");
        let decoded = AbiCodec::new(KeyFormat::Typed).decode(&schema, &bytes).expect("decode");
        assert_eq!(decoded, json!({"v": TYPED_KEY}));
    }

    #[rstest]
    #[case("uint8", json!(300))]
    #[case("int8", json!(-129))]
    #[case("uint16", json!(-1))]
    #[case("uint32", json!("4294967296"))]
    #[case("varint32", json!(2_147_483_648_i64))]
    #[case("float32", json!(1e39))]
    fn values_wider_than_the_field_are_range_errors(#[case] type_name: &str, #[case] value: Value) {
        assert!(matches!(
            AbiCodec::default().encode(&single(type_name), &json!({ "v": value })),
            Err(CodecError::OutOfRange { .. })
        ));
    }

    #[rstest]
    #[case("uint64", json!("18446744073709551615"), json!(18_446_744_073_709_551_615_u64))]
    #[case("int32", json!(-5), json!(-5))]
    #[case("varuint32", json!(332), json!(332))]
    #[case("varint32", json!(-3332), json!(-3332))]
    #[case("float32", json!(3.2), json!(3.2))]
    #[case("float64", json!(6.4), json!(6.4))]
    #[case("bool", json!(1), json!(true))]
    #[case("bytes", json!("00ff"), json!("00ff"))]
    #[case("uint128", json!("36893488153293773579"), json!("36893488153293773579"))]
    #[case("symbol", json!("4,FMP"), json!("4,FMP"))]
    #[case("symbol_code", json!("FMP"), json!("FMP"))]
    #[case("asset", json!("-123.4560 FMP"), json!("-123.4560 FMP"))]
    #[case("time_point", json!("2020-03-03T15:17:13"), json!("2020-03-03T15:17:13"))]
    #[case("time_point_sec", json!("2020-01-20T00:00:00Z"), json!("2020-01-20T00:00:00"))]
    #[case("string[]", json!(["a", "b"]), json!(["a", "b"]))]
    #[case("uint8?", Value::Null, Value::Null)]
    fn primitives_decode_to_canonical_json(
        #[case] type_name: &str,
        #[case] input: Value,
        #[case] output: Value,
    ) {
        let schema = single(type_name);
        let codec = AbiCodec::default();
        let bytes = codec.encode(&schema, &json!({ "v": input })).expect("encode");
        assert_eq!(codec.decode(&schema, &bytes).expect("decode"), json!({ "v": output }));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        assert!(matches!(
            AbiCodec::default().encode(&single("uint8"), &json!({})),
            Err(CodecError::InvalidFormat { kind: "struct", .. })
        ));
    }

    #[test]
    fn missing_optional_field_is_written_absent() {
        let bytes = AbiCodec::default().encode(&single("string?"), &json!({})).expect("encode");
        assert_eq!(bytes, vec![0]);
    }

    #[test]
    fn null_record_writes_an_empty_count() {
        let schema = schema(
            r#"{"structs": [
                {"name": "outer", "base": "", "fields": [{"name": "id", "type": "uint8"}, {"name": "inner", "type": "inner"}]},
                {"name": "inner", "base": "", "fields": [{"name": "x", "type": "uint32"}]}
            ]}"#,
            "outer",
        );
        let bytes = AbiCodec::default().encode(&schema, &json!({"id": 7, "inner": null})).expect("encode");
        assert_eq!(bytes, vec![7, 0]);
    }

    #[test]
    fn binary_extensions_may_be_omitted() {
        let schema = schema(
            r#"{"structs": [{"name": "s", "base": "", "fields": [
                {"name": "a", "type": "uint8"},
                {"name": "b", "type": "uint8$"}
            ]}]}"#,
            "s",
        );
        let codec = AbiCodec::default();
        let short = codec.encode(&schema, &json!({"a": 1})).expect("encode");
        assert_eq!(short, vec![1]);
        assert_eq!(codec.decode(&schema, &short).expect("decode"), json!({"a": 1}));
        let full = codec.encode(&schema, &json!({"a": 1, "b": 2})).expect("encode");
        assert_eq!(codec.decode(&schema, &full).expect("decode"), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn extension_gap_is_rejected() {
        let schema = schema(
            r#"{"structs": [{"name": "s", "base": "", "fields": [
                {"name": "a", "type": "uint8"},
                {"name": "b", "type": "uint8$"},
                {"name": "c", "type": "uint8$"}
            ]}]}"#,
            "s",
        );
        let codec = AbiCodec::default();
        assert!(matches!(
            codec.encode(&schema, &json!({"a": 1, "c": 3})),
            Err(CodecError::InvalidFormat { kind: "struct", .. })
        ));
        assert_eq!(codec.encode(&schema, &json!({"a": 1, "b": 2})).expect("encode"), vec![1, 2]);
    }

    #[test]
    fn variants_carry_their_case_index() {
        let schema = schema(
            r#"{
                "variants": [{"name": "value", "types": ["uint8", "string"]}],
                "structs": [{"name": "s", "base": "", "fields": [{"name": "v", "type": "value"}]}]
            }"#,
            "s",
        );
        let codec = AbiCodec::default();
        let bytes = codec.encode(&schema, &json!({"v": ["string", "hi"]})).expect("encode");
        assert_eq!(hex::encode(&bytes), "01026869");
        assert_eq!(codec.decode(&schema, &bytes).expect("decode"), json!({"v": ["string", "hi"]}));
        assert!(codec.encode(&schema, &json!({"v": ["int64", 1]})).is_err());
        assert!(matches!(
            codec.decode(&schema, &[5]),
            Err(CodecError::OutOfRange { .. })
        ));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        assert!(matches!(
            AbiCodec::default().decode(&single("uint8"), &[1, 2]),
            Err(CodecError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn oversized_array_count_overruns_instead_of_allocating() {
        assert!(matches!(
            AbiCodec::default().decode(&single("uint64[]"), &[0xff, 0xff, 0xff, 0xff, 0x0f]),
            Err(CodecError::BufferOverrun { .. })
        ));
    }

    #[rstest]
    #[case("uint8[]", &[4, 1, 2, 3])]
    #[case("asset[]", &[2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])]
    fn array_count_is_checked_against_element_width(#[case] type_name: &str, #[case] bytes: &[u8]) {
        assert!(matches!(
            AbiCodec::default().decode(&single(type_name), bytes),
            Err(CodecError::BufferOverrun { .. })
        ));
    }

    #[test]
    fn zero_width_arrays_are_capped() {
        let empty = schema(
            r#"{"structs": [
                {"name": "empty", "base": "", "fields": []},
                {"name": "s", "base": "", "fields": [{"name": "v", "type": "empty[]"}]}
            ]}"#,
            "s",
        );
        let codec = AbiCodec::default();
        let mut huge = ByteBuffer::new();
        huge.push_varuint32(2_000_000);
        assert!(matches!(
            codec.decode(&empty, huge.as_bytes()),
            Err(CodecError::OutOfRange { kind: "array length", .. })
        ));
        let decoded = codec.decode(&empty, &[3]).expect("decode");
        assert_eq!(decoded, json!({"v": [{}, {}, {}]}));
    }

    #[test]
    fn bad_presence_byte_is_rejected() {
        assert!(matches!(
            AbiCodec::default().decode(&single("uint8?"), &[2, 0]),
            Err(CodecError::InvalidFormat { kind: "optional", .. })
        ));
    }
}
