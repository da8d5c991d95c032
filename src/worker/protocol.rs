//! Wire types for the worker's line protocol.
//!
//! One JSON object per line in each direction. Requests carry an `id` that
//! the worker echoes back so responses can arrive out of order.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod methods {
    pub const EXECUTE_QUERY: &str = "query.execute";
}

#[derive(Debug, Clone, Serialize)]
pub struct RequestEnvelope {
    pub id: String,
    pub method: String,
    pub params: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub id: String,
    pub success: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<ErrorInfo>,
}

impl ResponseEnvelope {
    pub fn failure(id: String, error: ErrorInfo) -> Self {
        Self {
            id,
            success: false,
            result: None,
            error: Some(error),
        }
    }

    /// The result payload, or the error the worker reported. A failed
    /// response without error details is reported as `UNKNOWN`.
    pub fn into_result(self) -> Result<Value, ErrorInfo> {
        if self.success {
            Ok(self.result.unwrap_or(Value::Null))
        } else {
            Err(self
                .error
                .unwrap_or_else(|| ErrorInfo::new("UNKNOWN", "worker reported failure without details")))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

impl ErrorInfo {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Driver and connection string, flattened into each request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionParams {
    pub driver: String,
    pub connection_string: String,
}

/// Parameters for `query.execute`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteQueryParams {
    #[serde(flatten)]
    pub connection: ConnectionParams,
    pub sql: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QueryResultColumn {
    pub name: String,
    /// Driver-reported type, informational only.
    pub data_type: String,
}

/// Result of `query.execute`: column descriptions plus positional rows.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecuteQueryResponse {
    pub columns: Vec<QueryResultColumn>,
    pub rows: Vec<Vec<Value>>,
    pub row_count: i32,
    #[serde(default)]
    pub rows_affected: Option<i64>,
}
