//! Ahead-of-time resolution of ABI type names into codec kinds.
//!
//! Resolution walks aliases, base structs, arrays, optionals and variants
//! once and produces a [`ResolvedSchema`] tree the codec can switch on
//! without consulting the ABI again.

use tracing::{debug, trace};

use super::definition::AbiDefinition;
use crate::{
    error::CodecError,
    keys::{PUBLIC_KEY_DATA_SIZE, SIGNATURE_DATA_SIZE},
};

/// Default bound on nested type resolution.
pub const DEFAULT_MAX_TYPE_DEPTH: usize = 32;

/// Default bound on type nodes visited while resolving one name. Structs
/// that reuse a type in several fields expand it once per use.
pub const DEFAULT_MAX_TYPE_NODES: usize = 4096;

/// Wire types with a fixed codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    /// `bool`
    Bool,
    /// `int8`
    Int8,
    /// `uint8`
    Uint8,
    /// `int16`
    Int16,
    /// `uint16`
    Uint16,
    /// `int32`
    Int32,
    /// `uint32`
    Uint32,
    /// `int64`
    Int64,
    /// `uint64`
    Uint64,
    /// `uint128`
    Uint128,
    /// `varuint32`
    VarUint32,
    /// `varint32`
    VarInt32,
    /// `float32`
    Float32,
    /// `float64`
    Float64,
    /// `name`
    Name,
    /// `bytes`
    Bytes,
    /// `string`
    String,
    /// `symbol_code`
    SymbolCode,
    /// `symbol`
    Symbol,
    /// `asset`
    Asset,
    /// `checksum160`
    Checksum160,
    /// `checksum256`
    Checksum256,
    /// `checksum512`
    Checksum512,
    /// `public_key`
    PublicKey,
    /// `signature`
    Signature,
    /// `time_point`
    TimePoint,
    /// `time_point_sec`
    TimePointSec,
    /// `block_timestamp_type`
    BlockTimestamp,
}

const PRIMITIVES: &[(&str, PrimitiveKind)] = &[
    ("bool", PrimitiveKind::Bool),
    ("int8", PrimitiveKind::Int8),
    ("uint8", PrimitiveKind::Uint8),
    ("int16", PrimitiveKind::Int16),
    ("uint16", PrimitiveKind::Uint16),
    ("int32", PrimitiveKind::Int32),
    ("uint32", PrimitiveKind::Uint32),
    ("int64", PrimitiveKind::Int64),
    ("uint64", PrimitiveKind::Uint64),
    ("uint128", PrimitiveKind::Uint128),
    ("varuint32", PrimitiveKind::VarUint32),
    ("varint32", PrimitiveKind::VarInt32),
    ("float32", PrimitiveKind::Float32),
    ("float64", PrimitiveKind::Float64),
    ("name", PrimitiveKind::Name),
    ("bytes", PrimitiveKind::Bytes),
    ("string", PrimitiveKind::String),
    ("symbol_code", PrimitiveKind::SymbolCode),
    ("symbol", PrimitiveKind::Symbol),
    ("asset", PrimitiveKind::Asset),
    ("checksum160", PrimitiveKind::Checksum160),
    ("checksum256", PrimitiveKind::Checksum256),
    ("checksum512", PrimitiveKind::Checksum512),
    ("public_key", PrimitiveKind::PublicKey),
    ("signature", PrimitiveKind::Signature),
    ("time_point", PrimitiveKind::TimePoint),
    ("time_point_sec", PrimitiveKind::TimePointSec),
    ("block_timestamp_type", PrimitiveKind::BlockTimestamp),
];

/// System structs every chain understands, independent of any contract ABI.
const BUILTIN_STRUCTS: &[(&str, &[(&str, &str)])] = &[
    ("permission_level", &[("actor", "name"), ("permission", "name")]),
    ("key_weight", &[("key", "public_key"), ("weight", "uint16")]),
    (
        "permission_level_weight",
        &[("permission", "permission_level"), ("weight", "uint16")],
    ),
    ("wait_weight", &[("wait_sec", "uint32"), ("weight", "uint16")]),
    (
        "authority",
        &[
            ("threshold", "uint32"),
            ("keys", "key_weight[]"),
            ("accounts", "permission_level_weight[]"),
            ("waits", "wait_weight[]"),
        ],
    ),
];

impl PrimitiveKind {
    /// Look up a built-in wire type by its ABI name.
    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        PRIMITIVES
            .iter()
            .find(|(type_name, _)| *type_name == name)
            .map(|(_, kind)| *kind)
    }

    /// ABI name of this type.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        PRIMITIVES
            .iter()
            .find(|(_, kind)| *kind == self)
            .map_or("unknown", |(name, _)| *name)
    }

    /// Fewest bytes one value of this type occupies on the wire.
    #[must_use]
    pub const fn min_wire_size(self) -> usize {
        match self {
            Self::Bool
            | Self::Int8
            | Self::Uint8
            | Self::VarUint32
            | Self::VarInt32
            | Self::Bytes
            | Self::String => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32
            | Self::Uint32
            | Self::Float32
            | Self::TimePointSec
            | Self::BlockTimestamp => 4,
            Self::Int64
            | Self::Uint64
            | Self::Float64
            | Self::Name
            | Self::SymbolCode
            | Self::Symbol
            | Self::TimePoint => 8,
            Self::Uint128 | Self::Asset => 16,
            Self::Checksum160 => 20,
            Self::Checksum256 => 32,
            Self::Checksum512 => 64,
            Self::PublicKey => 1 + PUBLIC_KEY_DATA_SIZE,
            Self::Signature => 1 + SIGNATURE_DATA_SIZE,
        }
    }
}

/// Whether `name` is one of the system structs such as `authority`.
#[must_use]
pub fn is_builtin_struct(name: &str) -> bool {
    BUILTIN_STRUCTS.iter().any(|(builtin, _)| *builtin == name)
}

/// How one value is laid out on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    /// Fixed codec.
    Primitive(PrimitiveKind),
    /// Nested record.
    Struct(ResolvedSchema),
    /// Tagged union.
    Variant(ResolvedVariant),
    /// Varuint32 count followed by the elements.
    Array(Box<FieldKind>),
    /// Presence byte followed by the value when present.
    Optional(Box<FieldKind>),
}

impl FieldKind {
    /// Fewest bytes one value of this kind occupies on the wire. Zero only
    /// for records whose every field is an empty record or an extension.
    #[must_use]
    pub const fn min_wire_size(&self) -> usize {
        match self {
            Self::Primitive(primitive) => primitive.min_wire_size(),
            Self::Struct(schema) => schema.min_wire_size,
            Self::Variant(_) | Self::Array(_) | Self::Optional(_) => 1,
        }
    }
}

/// A variant with every alternative resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedVariant {
    /// Variant name.
    pub name: String,
    /// Alternatives as `(type name, kind)`, in wire index order.
    pub cases: Vec<(String, FieldKind)>,
}

/// A struct field bound to its kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedField {
    /// JSON key.
    pub name: String,
    /// Wire layout.
    pub kind: FieldKind,
    /// Declared with `$`: may be omitted at the end of a record.
    pub binary_extension: bool,
}

/// Fields of a struct, base fields first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSchema {
    /// Struct name.
    pub name: String,
    /// Fields in wire order.
    pub fields: Vec<ResolvedField>,
    /// Fewest bytes one record occupies, counting only required fields.
    pub min_wire_size: usize,
}

impl ResolvedSchema {
    /// Bind `fields` to `name`, summing their minimum wire size.
    #[must_use]
    pub fn new(name: impl Into<String>, fields: Vec<ResolvedField>) -> Self {
        let min_wire_size = fields
            .iter()
            .filter(|field| !field.binary_extension)
            .fold(0_usize, |total, field| {
                total.saturating_add(field.kind.min_wire_size())
            });
        Self {
            name: name.into(),
            fields,
            min_wire_size,
        }
    }
}

/// State carried through one resolution.
#[derive(Debug, Default)]
struct Walk {
    /// Named types being resolved, outermost first.
    stack: Vec<String>,
    /// Type nodes visited so far.
    nodes: usize,
}

/// Resolves names against one ABI.
#[derive(Debug, Clone, Copy)]
pub struct AbiResolver<'a> {
    abi: &'a AbiDefinition,
    max_depth: usize,
    max_nodes: usize,
}

impl<'a> AbiResolver<'a> {
    /// Resolver with the default depth and node bounds.
    #[must_use]
    pub const fn new(abi: &'a AbiDefinition) -> Self {
        Self {
            abi,
            max_depth: DEFAULT_MAX_TYPE_DEPTH,
            max_nodes: DEFAULT_MAX_TYPE_NODES,
        }
    }

    /// Replace the nesting bound.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the bound on type nodes visited per resolution.
    #[must_use]
    pub const fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Resolve an action's data struct, or a struct named directly.
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownAction`] if `name` is neither an action
    /// nor a struct, [`CodecError::OutOfRange`] if the expansion exceeds the
    /// depth or node bound, and propagates any field resolution failure.
    pub fn resolve(&self, name: &str) -> Result<ResolvedSchema, CodecError> {
        let target = match self.abi.action(name) {
            Some(action) => action.type_name.as_str(),
            None if self.is_struct(name) => name,
            None => return Err(CodecError::UnknownAction(name.to_owned())),
        };
        match self.kind(target, &mut Walk::default())? {
            FieldKind::Struct(schema) => Ok(schema),
            _ => Err(CodecError::format(
                "abi",
                format!("{name} does not resolve to a struct"),
            )),
        }
    }

    /// Resolve any type expression, including `[]` and `?` suffixes.
    ///
    /// # Errors
    /// Returns [`CodecError::UnknownType`], [`CodecError::CyclicType`] or
    /// [`CodecError::OutOfRange`] when nesting or expansion exceeds a bound.
    pub fn resolve_type(&self, type_name: &str) -> Result<FieldKind, CodecError> {
        self.kind(type_name, &mut Walk::default())
    }

    fn is_struct(&self, name: &str) -> bool {
        is_builtin_struct(name) || self.abi.struct_def(name).is_some()
    }

    fn kind(&self, type_name: &str, walk: &mut Walk) -> Result<FieldKind, CodecError> {
        walk.nodes = walk.nodes.saturating_add(1);
        if walk.nodes > self.max_nodes {
            return Err(CodecError::range("abi type nodes", walk.nodes));
        }
        if let Some(inner) = type_name.strip_suffix("[]") {
            return Ok(FieldKind::Array(Box::new(self.kind(inner, walk)?)));
        }
        if let Some(inner) = type_name.strip_suffix('?') {
            return Ok(FieldKind::Optional(Box::new(self.kind(inner, walk)?)));
        }
        if let Some(kind) = PrimitiveKind::from_type_name(type_name) {
            return Ok(FieldKind::Primitive(kind));
        }
        if walk.stack.iter().any(|seen| seen == type_name) {
            return Err(CodecError::CyclicType(type_name.to_owned()));
        }
        if walk.stack.len() >= self.max_depth {
            return Err(CodecError::range("abi type depth", walk.stack.len()));
        }
        walk.stack.push(type_name.to_owned());
        let resolved = self.named_kind(type_name, walk);
        walk.stack.pop();
        resolved
    }

    fn named_kind(&self, type_name: &str, walk: &mut Walk) -> Result<FieldKind, CodecError> {
        if let Some((_, members)) = BUILTIN_STRUCTS.iter().find(|(name, _)| *name == type_name) {
            let fields = members
                .iter()
                .map(|(name, ty)| self.field(name, ty, walk))
                .collect::<Result<_, _>>()?;
            return Ok(FieldKind::Struct(ResolvedSchema::new(type_name, fields)));
        }
        if let Some(target) = self.abi.alias(type_name) {
            trace!(alias = type_name, to = target, "following abi type alias");
            return self.kind(target, walk);
        }
        if let Some(def) = self.abi.struct_def(type_name) {
            let mut fields = Vec::new();
            if !def.base.is_empty() {
                match self.kind(&def.base, walk)? {
                    FieldKind::Struct(base) => fields.extend(base.fields),
                    _ => {
                        return Err(CodecError::format(
                            "abi",
                            format!("base {} of {type_name} is not a struct", def.base),
                        ));
                    }
                }
            }
            for field in &def.fields {
                fields.push(self.field(&field.name, &field.type_name, walk)?);
            }
            debug!(
                name = type_name,
                fields = fields.len(),
                "resolved abi struct"
            );
            return Ok(FieldKind::Struct(ResolvedSchema::new(type_name, fields)));
        }
        if let Some(def) = self.abi.variant(type_name) {
            let cases = def
                .types
                .iter()
                .map(|case| Ok((case.clone(), self.kind(case, walk)?)))
                .collect::<Result<_, CodecError>>()?;
            return Ok(FieldKind::Variant(ResolvedVariant {
                name: type_name.to_owned(),
                cases,
            }));
        }
        Err(CodecError::UnknownType(type_name.to_owned()))
    }

    fn field(&self, name: &str, declared: &str, walk: &mut Walk) -> Result<ResolvedField, CodecError> {
        let (type_name, binary_extension) = declared
            .strip_suffix('$')
            .map_or((declared, false), |inner| (inner, true));
        Ok(ResolvedField {
            name: name.to_owned(),
            kind: self.kind(type_name, walk)?,
            binary_extension,
        })
    }
}
