//! Crate-level error and exit-status mapping.

use std::fmt;

use crate::config::SettingsError;
use crate::emit::EmitError;
use crate::metadata::{FetchError, MappingError, SourceError};
use crate::model::SchemaIntegrityError;
use crate::snapshot::SnapshotError;
use crate::worker::WorkerError;

/// Process exit statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitStatus {
    Success,
    Validation,
    Generation,
    Dependency,
    Configuration,
    Internal,
    Reserved,
}

impl ExitStatus {
    pub fn code(&self) -> u8 {
        match self {
            ExitStatus::Success => 0,
            ExitStatus::Validation => 10,
            ExitStatus::Generation => 20,
            ExitStatus::Dependency => 30,
            ExitStatus::Configuration => 70,
            ExitStatus::Internal => 80,
            ExitStatus::Reserved => 99,
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ExitStatus::Success => "success",
            ExitStatus::Validation => "validation error",
            ExitStatus::Generation => "generation error",
            ExitStatus::Dependency => "dependency error",
            ExitStatus::Configuration => "configuration error",
            ExitStatus::Internal => "internal error",
            ExitStatus::Reserved => "reserved",
        };
        write!(f, "{} ({})", label, self.code())
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// Any error a run can end with.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Schema(#[from] SchemaIntegrityError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error(transparent)]
    Worker(#[from] WorkerError),

    /// One or more generation units failed; the rest of the batch completed.
    #[error("generation failed for {} procedure(s): {}", .0.len(), .0.join(", "))]
    GenerationFailed(Vec<String>),
}

impl From<SourceError> for Error {
    fn from(err: SourceError) -> Self {
        Error::Fetch(FetchError::Source(err))
    }
}

impl From<MappingError> for Error {
    fn from(err: MappingError) -> Self {
        Error::Fetch(FetchError::Mapping(err))
    }
}

impl Error {
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            Error::Settings(_) => ExitStatus::Configuration,
            Error::Fetch(FetchError::Mapping(_)) => ExitStatus::Validation,
            Error::Fetch(FetchError::Source(SourceError::FixtureParse { .. })) => {
                ExitStatus::Validation
            }
            Error::Fetch(_) => ExitStatus::Dependency,
            Error::Schema(_) => ExitStatus::Validation,
            Error::Snapshot(_) => ExitStatus::Internal,
            Error::Emit(EmitError::Write { .. }) => ExitStatus::Internal,
            Error::Emit(_) | Error::GenerationFailed(_) => ExitStatus::Generation,
            Error::Worker(err) if err.is_protocol_defect() => ExitStatus::Internal,
            Error::Worker(_) => ExitStatus::Dependency,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
