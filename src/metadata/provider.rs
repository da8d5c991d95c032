//! MetadataSource trait definition.
//!
//! A metadata source answers the five catalog queries the schema model is
//! built from. Each query returns loosely-typed [`Row`]s; binding them to
//! typed descriptors happens in [`fetch_catalog`](super::fetch_catalog).

use async_trait::async_trait;

use super::row::Row;
use crate::worker::WorkerError;

/// Errors raised by a metadata source while answering a query.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("failed to read fixture '{path}': {source}")]
    FixtureRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse fixture '{path}': {source}")]
    FixtureParse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("metadata source unavailable: {0}")]
    Unavailable(String),
}

pub type SourceResult<T> = Result<T, SourceError>;

/// Trait for fetching raw catalog rows.
///
/// Row order is significant: descriptors are assembled in the order the
/// source returns them.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Schema rows (`schema_id`, `name`).
    async fn schemas(&self) -> SourceResult<Vec<Row>>;

    /// Procedure rows (`object_id`, `schema_id`, `name`, `modify_date`).
    async fn procedures(&self) -> SourceResult<Vec<Row>>;

    /// Parameter rows, ordered by procedure then parameter ordinal.
    async fn inputs(&self) -> SourceResult<Vec<Row>>;

    /// Result-set column rows, ordered by procedure, result set, column.
    async fn result_columns(&self) -> SourceResult<Vec<Row>>;

    /// Table-type column rows, ordered by user type then column.
    async fn table_type_columns(&self) -> SourceResult<Vec<Row>>;

    /// Short human-readable description for logs.
    fn describe(&self) -> String {
        "metadata source".to_string()
    }
}
