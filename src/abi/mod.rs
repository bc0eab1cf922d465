//! Contract ABIs and the codec they drive.
//!
//! [`AbiDefinition`] is the published document, [`AbiResolver`] turns an
//! action or struct name into a [`ResolvedSchema`], and [`AbiCodec`] walks
//! that schema to convert JSON values to and from bytes.

pub mod codec;
pub mod definition;
pub mod resolver;

pub use codec::AbiCodec;
pub use definition::{
    AbiAction,
    AbiClause,
    AbiDefinition,
    AbiErrorMessage,
    AbiExtension,
    AbiField,
    AbiStruct,
    AbiTable,
    AbiTypeDef,
    AbiVariant,
};
pub use resolver::{
    AbiResolver,
    DEFAULT_MAX_TYPE_DEPTH,
    FieldKind,
    PrimitiveKind,
    ResolvedField,
    ResolvedSchema,
    ResolvedVariant,
};
