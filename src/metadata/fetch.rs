//! Catalog retrieval with timeout and cancellation.
//!
//! This is the only step of a run that blocks on the database. Either every
//! catalog query completes and binds, or the whole fetch fails and nothing
//! downstream runs.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info};

use super::mapping::{bind_rows, MappingError};
use super::provider::{MetadataSource, SourceError};
use super::row::Row;
use super::types::CatalogRows;

/// Errors from [`fetch_catalog`].
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("metadata retrieval timed out after {0} seconds")]
    Timeout(u64),

    #[error("metadata retrieval was cancelled")]
    Cancelled,
}

pub type FetchResult<T> = Result<T, FetchError>;

#[derive(Debug, Default)]
struct CancelState {
    cancelled: AtomicBool,
    notify: Notify,
}

/// Caller-owned cancellation signal. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag {
    state: Arc<CancelState>,
}

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::SeqCst);
        self.state.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once [`cancel`](Self::cancel) has been called.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.state.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Options for a catalog fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub cancel: CancellationFlag,
    /// Restrict the catalog to these schema names (case-insensitive).
    pub schemas: Option<Vec<String>>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            cancel: CancellationFlag::new(),
            schemas: None,
        }
    }
}

impl FetchOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_schemas(mut self, schemas: Vec<String>) -> Self {
        self.schemas = Some(schemas);
        self
    }
}

struct RawCatalog {
    schemas: Vec<Row>,
    procedures: Vec<Row>,
    inputs: Vec<Row>,
    result_columns: Vec<Row>,
    table_type_columns: Vec<Row>,
}

async fn fetch_raw(source: &dyn MetadataSource, cancel: &CancellationFlag) -> FetchResult<RawCatalog> {
    let check = || {
        if cancel.is_cancelled() {
            Err(FetchError::Cancelled)
        } else {
            Ok(())
        }
    };

    check()?;
    let schemas = source.schemas().await?;
    check()?;
    let procedures = source.procedures().await?;
    check()?;
    let inputs = source.inputs().await?;
    check()?;
    let result_columns = source.result_columns().await?;
    check()?;
    let table_type_columns = source.table_type_columns().await?;
    check()?;

    Ok(RawCatalog {
        schemas,
        procedures,
        inputs,
        result_columns,
        table_type_columns,
    })
}

/// Fetch and bind every catalog row set.
///
/// # Errors
///
/// `Timeout` if the queries do not finish within `options.timeout`,
/// `Cancelled` if the flag fires first, `Source` for connectivity failures
/// and `Mapping` if a row lacks an identity column.
pub async fn fetch_catalog(
    source: &dyn MetadataSource,
    options: &FetchOptions,
) -> FetchResult<CatalogRows> {
    info!(source = %source.describe(), "fetching catalog metadata");

    let raw = tokio::select! {
        biased;
        _ = options.cancel.cancelled() => return Err(FetchError::Cancelled),
        result = tokio::time::timeout(options.timeout, fetch_raw(source, &options.cancel)) => {
            match result {
                Ok(raw) => raw?,
                Err(_) => return Err(FetchError::Timeout(options.timeout.as_secs())),
            }
        }
    };

    let mut rows = CatalogRows {
        schemas: bind_rows(&raw.schemas)?,
        procedures: bind_rows(&raw.procedures)?,
        inputs: bind_rows(&raw.inputs)?,
        result_columns: bind_rows(&raw.result_columns)?,
        table_type_columns: bind_rows(&raw.table_type_columns)?,
    };

    if let Some(allowed) = &options.schemas {
        retain_schemas(&mut rows, allowed);
    }

    debug!(
        schemas = rows.schemas.len(),
        procedures = rows.procedures.len(),
        inputs = rows.inputs.len(),
        result_columns = rows.result_columns.len(),
        "catalog rows bound"
    );

    Ok(rows)
}

/// Drop schemas not in `allowed`, along with their procedures and the
/// parameters/result columns of those procedures.
pub fn retain_schemas(rows: &mut CatalogRows, allowed: &[String]) {
    rows.schemas
        .retain(|s| allowed.iter().any(|a| a.eq_ignore_ascii_case(&s.name)));

    let schema_ids: HashSet<i64> = rows.schemas.iter().map(|s| s.id).collect();
    rows.procedures.retain(|p| schema_ids.contains(&p.schema_id));

    let procedure_ids: HashSet<i64> = rows.procedures.iter().map(|p| p.id).collect();
    rows.inputs.retain(|i| procedure_ids.contains(&i.procedure_id));
    rows.result_columns
        .retain(|c| procedure_ids.contains(&c.procedure_id));
}
