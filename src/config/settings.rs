//! TOML-based configuration for sprocket.
//!
//! Supports a config file (sprocket.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [project]
//! name = "sprocket"
//! namespace = "billing_app"     # skip namespace discovery
//! output_dir = "src/generated"
//! template = "v3"
//! schemas = ["dbo", "billing"]
//!
//! [connection]
//! driver = "mssql"
//! connection_string = "${BILLING_DB}"
//! timeout_seconds = 30
//!
//! [worker]
//! path = "./bin/sprocket-worker"
//!
//! [snapshot]
//! dir = ".sprocket/snapshots"
//! keep = 5
//!
//! [telemetry]
//! enabled = false
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::emit::{EmitError, TemplateVariant};

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}. Supported: mssql")]
    UnsupportedDriver(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub project: ProjectSettings,
    pub connection: ConnectionSettings,
    pub worker: WorkerSettings,
    pub snapshot: SnapshotSettings,
    pub telemetry: TelemetrySettings,
}

/// Project and output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectSettings {
    /// Tool name written into generated headers.
    pub name: String,

    /// Explicit root module for generated code. Skips discovery when set.
    pub namespace: Option<String>,

    /// Directory generated files are written under.
    pub output_dir: PathBuf,

    /// Template variant: "v1", "v2" or "v3".
    pub template: String,

    /// Only introspect these schemas.
    pub schemas: Option<Vec<String>>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            name: "sprocket".to_string(),
            namespace: None,
            output_dir: PathBuf::from("generated"),
            template: "v3".to_string(),
            schemas: None,
        }
    }
}

/// Connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConnectionSettings {
    /// Database driver.
    pub driver: String,

    /// Connection string (supports ${ENV_VAR} expansion).
    pub connection_string: String,

    /// Metadata retrieval timeout.
    pub timeout_seconds: u64,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            driver: "mssql".to_string(),
            connection_string: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl ConnectionSettings {
    /// Get the canonical driver name for the worker.
    pub fn driver_name(&self) -> Result<&'static str, SettingsError> {
        match self.driver.to_lowercase().as_str() {
            "mssql" | "sqlserver" | "sql_server" => Ok("mssql"),
            other => Err(SettingsError::UnsupportedDriver(other.to_string())),
        }
    }

    /// Get the connection string with environment variables expanded.
    pub fn resolved_connection_string(&self) -> Result<String, SettingsError> {
        expand_env_vars(&self.connection_string)
    }
}

/// Worker configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary. Searched for when unset.
    pub path: Option<String>,
}

/// Snapshot history configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SnapshotSettings {
    pub dir: PathBuf,

    /// Records kept by `snapshot clean` without `--keep`.
    pub keep: usize,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(".sprocket/snapshots"),
            keep: crate::snapshot::DEFAULT_KEEP,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetrySettings {
    pub enabled: bool,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `SPROCKET_CONFIG`
    /// 2. `./sprocket.toml`
    /// 3. `~/.config/sprocket/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("SPROCKET_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("sprocket.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("sprocket").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Check everything that can be checked without touching the database.
    ///
    /// The template name is checked separately by [`Self::template_variant`],
    /// since an unknown variant is a generation error rather than a
    /// configuration one.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.snapshot.keep == 0 {
            return Err(SettingsError::InvalidConfig(
                "snapshot.keep must be at least 1".to_string(),
            ));
        }
        if self.connection.timeout_seconds == 0 {
            return Err(SettingsError::InvalidConfig(
                "connection.timeout_seconds must be at least 1".to_string(),
            ));
        }
        if self.project.name.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "project.name must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Additional checks for runs that read from a live database.
    pub fn validate_connection(&self) -> Result<(), SettingsError> {
        self.connection.driver_name()?;
        if self.connection.resolved_connection_string()?.trim().is_empty() {
            return Err(SettingsError::InvalidConfig(
                "connection.connection_string is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn template_variant(&self) -> Result<TemplateVariant, EmitError> {
        self.project.template.parse()
    }

    /// Get the configured worker binary path, with environment variables
    /// expanded.
    pub fn worker_path(&self) -> Option<PathBuf> {
        let path = self.worker.path.as_ref()?;
        let expanded = expand_env_vars(path).ok()?;
        Some(PathBuf::from(expanded))
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'{') {
            chars.next();
            let mut var_name = String::new();
            for ch in chars.by_ref() {
                if ch == '}' {
                    break;
                }
                var_name.push(ch);
            }
            let value =
                env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
            result.push_str(&value);
        } else {
            // $VAR ends at the first non-alphanumeric, non-underscore char.
            let mut var_name = String::new();
            while let Some(&ch) = chars.peek() {
                if ch.is_alphanumeric() || ch == '_' {
                    var_name.push(ch);
                    chars.next();
                } else {
                    break;
                }
            }
            if var_name.is_empty() {
                result.push('$');
            } else {
                let value = env::var(&var_name)
                    .map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
                result.push_str(&value);
            }
        }
    }

    Ok(result)
}
