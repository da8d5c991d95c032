//! Worker errors.

use std::io;

use super::protocol::ErrorInfo;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("failed to spawn worker process: {0}")]
    SpawnFailed(#[source] io::Error),

    #[error("worker stdio was not captured")]
    StdioUnavailable,

    #[error("failed to write to worker: {0}")]
    WriteFailed(#[source] io::Error),

    #[error("failed to serialize request: {0}")]
    SerializeFailed(#[source] serde_json::Error),

    #[error("failed to decode worker response: {0}")]
    DeserializeFailed(#[source] serde_json::Error),

    #[error("worker request timed out after {0} seconds")]
    Timeout(u64),

    #[error("worker process exited unexpectedly")]
    WorkerExited,

    #[error("worker response channel closed")]
    ChannelClosed,

    #[error("database driver not found: {0}")]
    DriverNotFound(String),

    #[error("database connection failed: {0}")]
    ConnectionFailed(String),

    #[error("worker rejected request: {0}")]
    InvalidRequest(String),

    #[error("worker does not support method: {0}")]
    MethodNotFound(String),

    /// Any other error code the worker reports.
    #[error("worker error {code}: {message}")]
    Remote { code: String, message: String },
}

impl From<ErrorInfo> for WorkerError {
    fn from(info: ErrorInfo) -> Self {
        match info.code.as_str() {
            "DRIVER_NOT_FOUND" => WorkerError::DriverNotFound(info.message),
            "CONNECTION_FAILED" => WorkerError::ConnectionFailed(info.message),
            "INVALID_REQUEST" => WorkerError::InvalidRequest(info.message),
            "METHOD_NOT_FOUND" => WorkerError::MethodNotFound(info.message),
            "WORKER_EXITED" => WorkerError::WorkerExited,
            _ => WorkerError::Remote {
                code: info.code,
                message: info.message,
            },
        }
    }
}

impl WorkerError {
    pub fn is_worker_exited(&self) -> bool {
        matches!(self, Self::WorkerExited | Self::ChannelClosed)
    }

    /// The request itself was malformed, as opposed to the database or the
    /// process being unavailable.
    pub fn is_protocol_defect(&self) -> bool {
        matches!(
            self,
            Self::SerializeFailed(_)
                | Self::DeserializeFailed(_)
                | Self::InvalidRequest(_)
                | Self::MethodNotFound(_)
        )
    }
}
