//! End-to-end generation run.
//!
//! One sequential pass per invocation:
//!
//! ```text
//! fetch_catalog ─► build_model ─► SnapshotDiff (latest vs current)
//!                                       │ added ∪ changed (or all with --full)
//!                                       ▼
//!                               Emitter::emit_batch ─► audit ─► OutputWriter
//!                                       │
//!                                       ▼
//!                  SnapshotStore::persist_locked (drift or first run, no failures)
//! ```
//!
//! The snapshot writer lock is taken before the fetch and held to the end,
//! so concurrent runs against one history fail fast instead of racing.
//! Cancellation or a fetch failure stops the run before anything is written.
//! The snapshot is persisted last, so procedures whose generation failed are
//! picked up again on the next run.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::audit::{audit, Finding};
use crate::config::Settings;
use crate::emit::{EmitConfig, EmitFailure, Emitter, OutputWriter, WriteSummary};
use crate::error::{Error, ExitStatus, Result};
use crate::metadata::{fetch_catalog, CancellationFlag, FetchError, FetchOptions, MetadataSource};
use crate::model::{build_model, SchemaModel};
use crate::naming::{resolve_namespace, ResolvedNamespace};
use crate::snapshot::{SnapshotDiff, SnapshotRecord, SnapshotStore};
use crate::telemetry::Telemetry;

/// Per-invocation options.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Regenerate every procedure, not only drifted ones.
    pub full: bool,
    pub cancel: CancellationFlag,
    /// Relative output and snapshot paths resolve against this directory;
    /// it is also where namespace discovery starts.
    pub project_root: PathBuf,
    /// Fixed render and capture time. `None` reads the clock.
    pub clock: Option<DateTime<Utc>>,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            full: false,
            cancel: CancellationFlag::new(),
            project_root: PathBuf::from("."),
            clock: None,
        }
    }
}

impl RunOptions {
    pub fn with_full(mut self, full: bool) -> Self {
        self.full = full;
        self
    }

    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn with_clock(mut self, at: DateTime<Utc>) -> Self {
        self.clock = Some(at);
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }
}

/// What a run did.
#[derive(Debug)]
pub struct RunReport {
    pub namespace: ResolvedNamespace,
    pub diff: SnapshotDiff,
    /// Id of the snapshot persisted by this run, if any.
    pub snapshot_id: Option<String>,
    /// Qualified names of procedures that rendered.
    pub rendered: Vec<String>,
    pub written: WriteSummary,
    pub failures: Vec<EmitFailure>,
    pub findings: Vec<Finding>,
}

impl RunReport {
    pub fn exit_status(&self) -> ExitStatus {
        if self.failures.is_empty() {
            ExitStatus::Success
        } else {
            ExitStatus::Generation
        }
    }

    /// Turn per-unit failures into an error once the batch is complete.
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::GenerationFailed(
                self.failures.iter().map(|f| f.procedure.clone()).collect(),
            ))
        }
    }
}

fn resolve(root: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

fn fetch_options(settings: &Settings, options: &RunOptions) -> FetchOptions {
    let fetch = FetchOptions::default()
        .with_timeout(Duration::from_secs(settings.connection.timeout_seconds))
        .with_cancel(options.cancel.clone());
    match &settings.project.schemas {
        Some(schemas) => fetch.with_schemas(schemas.clone()),
        None => fetch,
    }
}

async fn load_model(
    settings: &Settings,
    source: &dyn MetadataSource,
    options: &RunOptions,
) -> Result<SchemaModel> {
    let rows = fetch_catalog(source, &fetch_options(settings, options)).await?;
    Ok(build_model(&rows)?)
}

fn ensure_not_cancelled(options: &RunOptions) -> Result<()> {
    if options.cancel.is_cancelled() {
        return Err(FetchError::Cancelled.into());
    }
    Ok(())
}

/// Run the full generation pipeline.
///
/// Per-procedure generation failures do not fail the run; they are listed in
/// [`RunReport::failures`]. Use [`RunReport::into_result`] to treat them as
/// an error.
pub async fn run(
    settings: &Settings,
    source: &dyn MetadataSource,
    options: &RunOptions,
) -> Result<RunReport> {
    settings.validate()?;
    let variant = settings.template_variant()?;
    let telemetry = Telemetry::new(settings.telemetry.enabled);
    telemetry.run_started(&source.describe(), options.full);

    let root = options.project_root.as_path();
    let namespace = resolve_namespace(root, settings.project.namespace.as_deref());

    // Held until the report is built, so a concurrent run cannot diff against
    // the same latest record.
    let store = SnapshotStore::new(resolve(root, &settings.snapshot.dir));
    let lock = store.lock()?;

    let model = load_model(settings, source, options).await?;
    ensure_not_cancelled(options)?;

    let previous = store.latest()?;
    let record = SnapshotRecord::new(model, options.clock.unwrap_or_else(Utc::now))
        .map_err(crate::snapshot::SnapshotError::Serialize)?
        .with_schema_filter(settings.project.schemas.clone());
    let diff = SnapshotDiff::between(previous.as_ref(), &record);
    info!(
        added = diff.added.len(),
        changed = diff.changed.len(),
        removed = diff.removed.len(),
        "schema drift computed"
    );

    let selection: Option<BTreeSet<String>> = if options.full {
        None
    } else {
        Some(diff.regenerate())
    };

    let config = EmitConfig {
        tool_name: settings.project.name.clone(),
        variant,
        namespace: namespace.name.clone(),
        ..EmitConfig::default()
    };
    let emitter = match options.clock {
        Some(at) => Emitter::new(config).with_clock(at),
        None => Emitter::new(config),
    };

    let batch = {
        let units = emitter.units(&record.model, selection.as_ref());
        emitter.emit_batch(&units)
    };
    telemetry.procedures_generated(batch.outputs.len(), batch.failures.len());

    let findings = audit(&record.model);
    for finding in &findings {
        warn!(target: "sprocket::audit", "{}", finding);
    }

    ensure_not_cancelled(options)?;
    let writer = OutputWriter::new(resolve(root, &settings.project.output_dir));
    let written = writer.write_all(&batch.outputs)?;

    let drifted = diff.has_drift() || previous.is_none();
    let snapshot_id = if drifted && batch.failures.is_empty() {
        Some(store.persist_locked(&lock, record)?.id)
    } else {
        None
    };

    let report = RunReport {
        namespace,
        diff,
        snapshot_id,
        rendered: batch.outputs.iter().map(|o| o.procedure.clone()).collect(),
        written,
        failures: batch.failures,
        findings,
    };
    drop(lock);
    telemetry.run_finished(report.failures.is_empty());
    Ok(report)
}

/// Fetch, build and audit without generating anything.
pub async fn run_audit(
    settings: &Settings,
    source: &dyn MetadataSource,
    options: &RunOptions,
) -> Result<Vec<Finding>> {
    let model = load_model(settings, source, options).await?;
    Ok(audit(&model))
}
