//! # Sprocket
//!
//! Stored-procedure introspection, schema snapshots and typed data-access
//! code generation.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         MetadataSource (worker process / fixture)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │ rows
//!                          ▼ [metadata: FromRow mapping tables]
//! ┌─────────────────────────────────────────────────────────┐
//! │                     CatalogRows                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [model::build_model]
//! ┌─────────────────────────────────────────────────────────┐
//! │   SchemaModel (schema → procedure → params/result sets)  │
//! └─────────────────────────────────────────────────────────┘
//!            │                    │                   │
//!            ▼ [snapshot]         ▼ [emit]            ▼ [audit]
//!   capture / diff / clean   versioned templates   JSON shape findings
//!            │                    ▲
//!            └── drift selects ───┘◄── [naming] namespace
//! ```
//!
//! [`pipeline::run`] drives the whole pass; the `sprocket` binary is a thin
//! CLI over it.

pub mod audit;
pub mod config;
pub mod emit;
pub mod error;
pub mod metadata;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod snapshot;
pub mod telemetry;
pub mod worker;

pub use error::{Error, ExitStatus, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::audit::{audit, Finding, SuggestionKind};
    pub use crate::config::Settings;
    pub use crate::emit::{EmitConfig, Emitter, GenerationUnit, OutputWriter, TemplateVariant};
    pub use crate::error::{Error, ExitStatus};
    pub use crate::metadata::{
        fetch_catalog, CancellationFlag, FetchOptions, FixtureMetadataSource, MetadataSource,
    };
    pub use crate::model::{build_model, LangType, SchemaModel, StoredProcedureDescriptor};
    pub use crate::naming::resolve_namespace;
    pub use crate::pipeline::{run, RunOptions, RunReport};
    pub use crate::snapshot::{CleanOptions, SnapshotDiff, SnapshotRecord, SnapshotStore};
}
