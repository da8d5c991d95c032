//! WorkerMetadataSource implementation.
//!
//! Runs the catalog queries through the database worker process and turns
//! its positional result rows into named [`Row`]s.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::provider::{MetadataSource, SourceResult};
use super::queries;
use super::row::Row;
use crate::worker::protocol::{ConnectionParams, ExecuteQueryResponse};
use crate::worker::WorkerClient;

/// MetadataSource backed by the worker's `query.execute` method.
///
/// # Example
///
/// ```ignore
/// use sprocket::worker::WorkerClient;
/// use sprocket::metadata::WorkerMetadataSource;
///
/// let client = WorkerClient::spawn("./sprocket-worker").await?;
/// let source = WorkerMetadataSource::with_client(client, "mssql", "server=.;database=app");
/// let rows = source.procedures().await?;
/// ```
pub struct WorkerMetadataSource {
    client: Arc<WorkerClient>,
    connection: ConnectionParams,
}

impl WorkerMetadataSource {
    pub fn new(
        client: Arc<WorkerClient>,
        driver: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self {
            client,
            connection: ConnectionParams {
                driver: driver.into(),
                connection_string: connection_string.into(),
            },
        }
    }

    /// Convenience constructor that wraps an owned client in an Arc.
    pub fn with_client(
        client: WorkerClient,
        driver: impl Into<String>,
        connection_string: impl Into<String>,
    ) -> Self {
        Self::new(Arc::new(client), driver, connection_string)
    }

    pub fn driver(&self) -> &str {
        &self.connection.driver
    }

    async fn query(&self, name: &str, sql: &str) -> SourceResult<Vec<Row>> {
        let response = self
            .client
            .execute_query(&self.connection, sql)
            .await?;
        let rows = response_to_rows(response);
        debug!(query = name, rows = rows.len(), "catalog query finished");
        Ok(rows)
    }
}

/// Zip each positional row with the response's column names.
pub(crate) fn response_to_rows(response: ExecuteQueryResponse) -> Vec<Row> {
    let columns: Vec<String> = response.columns.into_iter().map(|c| c.name).collect();
    response
        .rows
        .into_iter()
        .map(|values| Row::from_columns(&columns, values))
        .collect()
}

#[async_trait]
impl MetadataSource for WorkerMetadataSource {
    async fn schemas(&self) -> SourceResult<Vec<Row>> {
        self.query("schemas", queries::SCHEMAS).await
    }

    async fn procedures(&self) -> SourceResult<Vec<Row>> {
        self.query("procedures", queries::PROCEDURES).await
    }

    async fn inputs(&self) -> SourceResult<Vec<Row>> {
        self.query("inputs", queries::INPUTS).await
    }

    async fn result_columns(&self) -> SourceResult<Vec<Row>> {
        self.query("result_columns", queries::RESULT_COLUMNS).await
    }

    async fn table_type_columns(&self) -> SourceResult<Vec<Row>> {
        self.query("table_type_columns", queries::TABLE_TYPE_COLUMNS)
            .await
    }

    fn describe(&self) -> String {
        format!("worker ({})", self.connection.driver)
    }
}
