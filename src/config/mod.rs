//! Configuration module for sprocket.
//!
//! Handles project, connection, snapshot and telemetry settings.

mod settings;

pub use settings::{
    expand_env_vars, ConnectionSettings, ProjectSettings, Settings, SettingsError,
    SnapshotSettings, TelemetrySettings, WorkerSettings,
};
