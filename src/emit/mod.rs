//! Code emitter.
//!
//! Renders each procedure through the emission strategy for its template
//! variant, then wraps the body in the variant's template, substituting the
//! generation-metadata placeholders.
//!
//! ```text
//! StoredProcedureDescriptor ──► GenerationUnit { procedure, variant }
//!                                        │
//!                    strategy_for(variant).render_body()
//!                                        │
//!                   Template::render(metadata, body) ──► RenderedOutput
//!                                        │
//!                                  OutputWriter
//! ```
//!
//! Rendering is pure for a fixed clock: see [`Emitter::with_clock`].

pub mod format;
mod strategy;
mod template;
mod writer;

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{SchemaModel, StoredProcedureDescriptor};

use format::{field_ident, Indent};
pub use strategy::{strategy_for, EmissionStrategy, FlatStrategy, ModelsStrategy, RenderContext, TypedStrategy};
pub use template::{
    header_locked, GenerationMetadata, Template, TemplateVariant, Version, BODY_TOKEN,
    LAST_MODIFIED_TOKEN, LOCKED_TOKEN, NAME_TOKEN, VERSION_TOKEN,
};
pub use writer::{OutputWriter, WriteSummary};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    /// The configured template variant does not exist.
    #[error("unknown template variant '{0}' (expected v1, v2 or v3)")]
    UnknownTemplate(String),

    /// A template body lacks a required placeholder.
    #[error("template '{template}' is missing the {token} placeholder")]
    MissingPlaceholder { template: String, token: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EmitError {
    pub fn is_template_error(&self) -> bool {
        matches!(self, EmitError::UnknownTemplate(_))
    }

    pub fn is_render_error(&self) -> bool {
        matches!(self, EmitError::MissingPlaceholder { .. })
    }
}

pub type EmitResult<T> = Result<T, EmitError>;

// ============================================================================
// Configuration
// ============================================================================

/// Emission options.
#[derive(Debug, Clone)]
pub struct EmitConfig {
    /// Substituted for the name placeholder.
    pub tool_name: String,
    pub version: Version,
    pub variant: TemplateVariant,
    /// Root module of the consuming crate.
    pub namespace: String,
    /// Value of the locked marker in newly generated headers.
    pub locked: bool,
    /// Emit doc comments for SQL types and output parameters.
    pub include_comments: bool,
    pub indent: Indent,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            tool_name: "sprocket".to_string(),
            version: Version::current(),
            variant: TemplateVariant::default(),
            namespace: "generated".to_string(),
            locked: false,
            include_comments: true,
            indent: Indent::default(),
        }
    }
}

impl EmitConfig {
    /// No per-field comments.
    pub fn minimal() -> Self {
        Self {
            include_comments: false,
            ..Self::default()
        }
    }

    pub fn with_variant(mut self, variant: TemplateVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

// ============================================================================
// Units and reports
// ============================================================================

/// One procedure paired with the template variant it renders through.
#[derive(Debug, Clone, Copy)]
pub struct GenerationUnit<'a> {
    pub procedure: &'a StoredProcedureDescriptor,
    pub variant: TemplateVariant,
}

impl<'a> GenerationUnit<'a> {
    pub fn new(procedure: &'a StoredProcedureDescriptor, variant: TemplateVariant) -> Self {
        Self { procedure, variant }
    }

    /// `<schema>/<procedure>.rs`, relative to the output root.
    pub fn relative_path(&self) -> PathBuf {
        output_path(&self.procedure.schema_name, &self.procedure.name)
    }
}

/// Where the file for `schema.procedure` lands, relative to the output root.
///
/// Distinct database names can share a path (`UserFind`, `User_Find`);
/// [`crate::model::build_model`] rejects such catalogs.
pub fn output_path(schema: &str, procedure: &str) -> PathBuf {
    let schema = field_ident(schema);
    let file = field_ident(procedure);
    PathBuf::from(schema.trim_start_matches("r#"))
        .join(format!("{}.rs", file.trim_start_matches("r#")))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedOutput {
    /// Qualified procedure name.
    pub procedure: String,
    pub variant: TemplateVariant,
    pub relative_path: PathBuf,
    pub contents: String,
}

#[derive(Debug)]
pub struct EmitFailure {
    pub procedure: String,
    pub error: EmitError,
}

/// Outcome of a batch: every unit either rendered or failed.
#[derive(Debug, Default)]
pub struct EmitReport {
    pub outputs: Vec<RenderedOutput>,
    pub failures: Vec<EmitFailure>,
}

impl EmitReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

// ============================================================================
// Emitter
// ============================================================================

pub struct Emitter {
    config: EmitConfig,
    clock: Option<DateTime<Utc>>,
    templates: HashMap<TemplateVariant, Template>,
}

impl Emitter {
    pub fn new(config: EmitConfig) -> Self {
        Self {
            config,
            clock: None,
            templates: HashMap::new(),
        }
    }

    /// Pin the last-modified timestamp instead of reading the clock.
    pub fn with_clock(mut self, at: DateTime<Utc>) -> Self {
        self.clock = Some(at);
        self
    }

    /// Replace the built-in template for a variant.
    pub fn with_template(mut self, variant: TemplateVariant, template: Template) -> Self {
        self.templates.insert(variant, template);
        self
    }

    pub fn config(&self) -> &EmitConfig {
        &self.config
    }

    /// Units for the configured variant. `selection` restricts them to the
    /// given qualified names; `None` selects every procedure.
    pub fn units<'a>(
        &self,
        model: &'a SchemaModel,
        selection: Option<&BTreeSet<String>>,
    ) -> Vec<GenerationUnit<'a>> {
        model
            .procedures()
            .filter(|p| selection.map_or(true, |s| s.contains(&p.qualified_name())))
            .map(|p| GenerationUnit::new(p, self.config.variant))
            .collect()
    }

    pub fn render(&self, unit: &GenerationUnit<'_>) -> EmitResult<RenderedOutput> {
        let ctx = RenderContext {
            namespace: &self.config.namespace,
            include_comments: self.config.include_comments,
            indent: self.config.indent.clone(),
        };
        let body = strategy_for(unit.variant).render_body(unit.procedure, &ctx);

        let metadata = GenerationMetadata {
            tool_name: self.config.tool_name.clone(),
            version: self.config.version,
            last_modified: self.clock.unwrap_or_else(Utc::now),
            locked: self.config.locked,
        };

        let contents = match self.templates.get(&unit.variant) {
            Some(template) => template.render(&metadata, &body)?,
            None => Template::builtin(unit.variant).render(&metadata, &body)?,
        };

        Ok(RenderedOutput {
            procedure: unit.procedure.qualified_name(),
            variant: unit.variant,
            relative_path: unit.relative_path(),
            contents,
        })
    }

    /// Render by variant name, as given in configuration.
    pub fn render_named(
        &self,
        procedure: &StoredProcedureDescriptor,
        variant: &str,
    ) -> EmitResult<RenderedOutput> {
        let variant: TemplateVariant = variant.parse()?;
        self.render(&GenerationUnit::new(procedure, variant))
    }

    /// Render every unit, collecting failures instead of stopping at the
    /// first.
    pub fn emit_batch(&self, units: &[GenerationUnit<'_>]) -> EmitReport {
        let mut report = EmitReport::default();
        for unit in units {
            match self.render(unit) {
                Ok(output) => {
                    debug!(procedure = %output.procedure, variant = %unit.variant, "rendered");
                    report.outputs.push(output);
                }
                Err(error) => {
                    let procedure = unit.procedure.qualified_name();
                    warn!(%procedure, error = %error, "render failed");
                    report.failures.push(EmitFailure { procedure, error });
                }
            }
        }
        report
    }
}
