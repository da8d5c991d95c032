//! Sprocket CLI - generate typed bindings for stored procedures
//!
//! Usage:
//!   sprocket generate [--full] [--fixture <catalog.json>]
//!   sprocket snapshot list
//!   sprocket snapshot clean [--all] [--keep <n>]
//!   sprocket audit [--fixture <catalog.json>]
//!   sprocket namespace [<root>]
//!
//! Logging is controlled by `SPROCKET_LOG` (default `sprocket=info`).

use clap::{Parser, Subcommand};
use sprocket::config::{Settings, SettingsError};
use sprocket::error::{Error, ExitStatus};
use sprocket::metadata::{CancellationFlag, FixtureMetadataSource, MetadataSource, WorkerMetadataSource};
use sprocket::naming::resolve_namespace;
use sprocket::pipeline::{self, RunOptions};
use sprocket::snapshot::{CleanOptions, SnapshotError, SnapshotStore};
use sprocket::worker::WorkerClient;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sprocket")]
#[command(about = "Sprocket - typed data-access code from stored-procedure metadata")]
#[command(version)]
struct Cli {
    /// Path to sprocket.toml (defaults to SPROCKET_CONFIG, ./sprocket.toml, user config)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Introspect the database and regenerate drifted procedures
    Generate {
        /// Regenerate every procedure, not only changed ones
        #[arg(long)]
        full: bool,

        /// Read catalog rows from a JSON fixture instead of the database
        #[arg(long)]
        fixture: Option<PathBuf>,
    },

    /// Inspect or prune the snapshot history
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommand,
    },

    /// Report JSON result fields that look mistyped
    Audit {
        /// Read catalog rows from a JSON fixture instead of the database
        #[arg(long)]
        fixture: Option<PathBuf>,
    },

    /// Print the namespace generated code will use
    Namespace {
        /// Project root (defaults to the current directory)
        root: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SnapshotCommand {
    /// List snapshots, oldest first
    List,

    /// Delete old snapshots
    Clean {
        /// Delete every snapshot
        #[arg(long, conflicts_with = "keep")]
        all: bool,

        /// Number of most recent snapshots to keep (defaults to snapshot.keep)
        #[arg(long)]
        keep: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SPROCKET_LOG").unwrap_or_else(|_| EnvFilter::new("sprocket=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_ref()) {
        Ok(s) => s,
        Err(e) => return fail(e.into()),
    };

    match cli.command {
        Commands::Generate { full, fixture } => cmd_generate(&settings, full, fixture).await,
        Commands::Snapshot { command } => match command {
            SnapshotCommand::List => cmd_snapshot_list(&settings),
            SnapshotCommand::Clean { all, keep } => cmd_snapshot_clean(&settings, all, keep),
        },
        Commands::Audit { fixture } => cmd_audit(&settings, fixture).await,
        Commands::Namespace { root } => cmd_namespace(&settings, root),
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, SettingsError> {
    let settings = match path {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };
    settings.validate()?;
    Ok(settings)
}

fn fail(err: Error) -> ExitCode {
    let status = err.exit_status();
    eprintln!("Error: {}", err);
    status.into()
}

/// Build the metadata source. Connection settings are checked before the
/// worker is spawned.
async fn open_source(
    settings: &Settings,
    fixture: Option<PathBuf>,
) -> Result<Box<dyn MetadataSource>, Error> {
    if let Some(path) = fixture {
        return Ok(Box::new(FixtureMetadataSource::from_file(path)?));
    }

    settings.validate_connection()?;
    let driver = settings.connection.driver_name()?;
    let connection_string = settings.connection.resolved_connection_string()?;
    let client = WorkerClient::spawn_with_settings(settings).await?;
    Ok(Box::new(WorkerMetadataSource::with_client(
        client,
        driver,
        connection_string,
    )))
}

/// Cancel the run on Ctrl-C.
fn cancel_on_interrupt() -> CancellationFlag {
    let flag = CancellationFlag::new();
    let handle = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, cancelling run");
            handle.cancel();
        }
    });
    flag
}

async fn cmd_generate(settings: &Settings, full: bool, fixture: Option<PathBuf>) -> ExitCode {
    let source = match open_source(settings, fixture).await {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let options = RunOptions::default()
        .with_full(full)
        .with_cancel(cancel_on_interrupt());

    let report = match pipeline::run(settings, source.as_ref(), &options).await {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    println!("Namespace: {}", report.namespace);
    println!(
        "Drift: {} added, {} changed, {} removed",
        report.diff.added.len(),
        report.diff.changed.len(),
        report.diff.removed.len()
    );
    for path in &report.written.written {
        println!("  wrote   {}", path.display());
    }
    for path in &report.written.skipped_locked {
        println!("  locked  {}", path.display());
    }
    if let Some(id) = &report.snapshot_id {
        println!("Snapshot: {}", id);
    }

    if !report.findings.is_empty() {
        println!();
        println!("JSON shape findings:");
        for finding in &report.findings {
            println!("  - {}", finding);
        }
    }

    if !report.failures.is_empty() {
        eprintln!();
        eprintln!("Generation failed for {} procedure(s):", report.failures.len());
        for failure in &report.failures {
            eprintln!("  {}: {}", failure.procedure, failure.error);
        }
    }

    report.exit_status().into()
}

fn cmd_snapshot_list(settings: &Settings) -> ExitCode {
    let store = SnapshotStore::new(&settings.snapshot.dir);
    let entries = match store.list() {
        Ok(e) => e,
        Err(e) => return fail(e.into()),
    };

    if entries.is_empty() {
        println!("No snapshots in {}", store.dir().display());
        return ExitCode::SUCCESS;
    }

    for entry in &entries {
        println!("{}  {}", entry.id, entry.created_at.to_rfc3339());
    }
    ExitCode::SUCCESS
}

fn cmd_snapshot_clean(settings: &Settings, all: bool, keep: Option<usize>) -> ExitCode {
    let store = SnapshotStore::new(&settings.snapshot.dir);
    let options = if all {
        CleanOptions::all()
    } else {
        CleanOptions::keep(keep.unwrap_or(settings.snapshot.keep))
    };

    match store.clean(&options) {
        Ok(summary) => {
            println!(
                "Removed {} snapshot(s), kept {}",
                summary.removed.len(),
                summary.kept.len()
            );
            ExitCode::SUCCESS
        }
        Err(SnapshotError::InvalidRetention) => {
            eprintln!("Error: --keep must be at least 1 (use --all to delete everything)");
            ExitStatus::Validation.into()
        }
        Err(SnapshotError::PartialClean {
            removed,
            remaining,
            source,
        }) => {
            eprintln!("Error: snapshot clean stopped: {}", source);
            eprintln!("Removed:");
            for id in &removed {
                eprintln!("  {}", id);
            }
            eprintln!("Remaining:");
            for id in &remaining {
                eprintln!("  {}", id);
            }
            ExitStatus::Internal.into()
        }
        Err(e) => fail(e.into()),
    }
}

async fn cmd_audit(settings: &Settings, fixture: Option<PathBuf>) -> ExitCode {
    let source = match open_source(settings, fixture).await {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    let options = RunOptions::default().with_cancel(cancel_on_interrupt());
    match pipeline::run_audit(settings, source.as_ref(), &options).await {
        Ok(findings) if findings.is_empty() => {
            println!("No findings");
            ExitCode::SUCCESS
        }
        Ok(findings) => {
            for finding in &findings {
                println!("{}", finding);
            }
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn cmd_namespace(settings: &Settings, root: Option<PathBuf>) -> ExitCode {
    let root = root.unwrap_or_else(|| PathBuf::from("."));
    let resolved = resolve_namespace(&root, settings.project.namespace.as_deref());
    println!("{}", resolved);
    ExitCode::SUCCESS
}
