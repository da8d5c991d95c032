//! Metadata reader.
//!
//! Fetches the stored-procedure catalog from a [`MetadataSource`] and binds
//! each loosely-typed [`Row`] to a typed row descriptor through that
//! descriptor's static mapping table.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    MetadataSource                        │
//! │  WorkerMetadataSource (database)  FixtureMetadataSource  │
//! └──────────────────────────────────────────────────────────┘
//!                          │ Vec<Row>
//!                          ▼ fetch_catalog (timeout, cancel)
//! ┌──────────────────────────────────────────────────────────┐
//! │   bind_rows::<T: FromRow>  →  CatalogRows                │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use sprocket::metadata::{fetch_catalog, FetchOptions, FixtureMetadataSource};
//!
//! let source = FixtureMetadataSource::from_file("catalog.json")?;
//! let rows = fetch_catalog(&source, &FetchOptions::default()).await?;
//! ```

mod fetch;
mod fixture_provider;
pub mod mapping;
mod provider;
pub mod queries;
mod row;
mod types;
mod worker_provider;

pub use fetch::{fetch_catalog, retain_schemas, CancellationFlag, FetchError, FetchOptions, FetchResult};
pub use fixture_provider::{FixtureCatalog, FixtureMetadataSource};
pub use mapping::{bind_row, bind_rows, FieldBinding, FromRow, MappingError, MappingResult};
pub use provider::{MetadataSource, SourceError, SourceResult};
pub use row::Row;
pub use types::*;
pub use worker_provider::WorkerMetadataSource;
