//! Schema model.
//!
//! A [`SchemaModel`] is the assembled tree of schemas, procedures,
//! parameters and result sets. It is built from bound catalog rows by
//! [`build_model`] and consumed read-only by the snapshot store, the
//! emitter and the JSON shape auditor.

mod builder;
mod descriptors;
pub mod types;

pub use builder::{build_model, SchemaIntegrityError};
pub use descriptors::{
    ColumnDescriptor, FieldDescriptor, InputDescriptor, OperationKind, ResultSetDescriptor,
    SchemaDescriptor, SchemaModel, StoredProcedureDescriptor,
};
pub use types::LangType;
