//! Emission strategies, one per [`TemplateVariant`].
//!
//! A strategy renders the body of a generated file for one procedure. The
//! surrounding header comes from the variant's [`Template`](super::Template).

mod flat;
mod models;
mod typed;

use crate::model::{FieldDescriptor, InputDescriptor, ResultSetDescriptor, StoredProcedureDescriptor};

use super::format::{field_ident, nullable, quote_string, rust_type, type_ident, Indent, IndentWriter};
use super::template::TemplateVariant;

pub use flat::FlatStrategy;
pub use models::ModelsStrategy;
pub use typed::TypedStrategy;

/// Naming and layout inputs shared by all strategies.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    /// Root module of the consuming crate (`<namespace>::runtime`).
    pub namespace: &'a str,
    pub include_comments: bool,
    pub indent: Indent,
}

pub trait EmissionStrategy: Send + Sync {
    fn variant(&self) -> TemplateVariant;

    fn render_body(&self, procedure: &StoredProcedureDescriptor, ctx: &RenderContext<'_>) -> String;
}

pub fn strategy_for(variant: TemplateVariant) -> &'static dyn EmissionStrategy {
    match variant {
        TemplateVariant::V1 => &FlatStrategy,
        TemplateVariant::V2 => &ModelsStrategy,
        TemplateVariant::V3 => &TypedStrategy,
    }
}

const MODEL_DERIVES: &str = "#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]";

/// `[schema].[name]`, as passed to the executor.
fn call_name(procedure: &StoredProcedureDescriptor) -> String {
    quote_string(&format!("[{}].[{}]", procedure.schema_name, procedure.name))
}

fn function_name(procedure: &StoredProcedureDescriptor) -> String {
    field_ident(&procedure.name)
}

fn params_type_name(procedure: &StoredProcedureDescriptor) -> String {
    format!("{}Params", type_ident(&procedure.name))
}

fn model_type_name(procedure: &StoredProcedureDescriptor, result_set: &ResultSetDescriptor) -> String {
    format!("{}{}", type_ident(&procedure.name), type_ident(&result_set.name))
}

fn table_row_type_name(input: &InputDescriptor) -> String {
    let base = input.user_type_name.as_deref().unwrap_or(input.name());
    format!("{}Row", type_ident(base))
}

/// Scalar Rust type of a parameter. Output parameters are always optional.
fn scalar_param_type(input: &InputDescriptor) -> String {
    nullable(rust_type(input.lang_type()), input.column.is_nullable || input.is_output)
}

fn field_type(field: &FieldDescriptor) -> String {
    nullable(rust_type(field.lang_type), field.is_nullable)
}

/// Result sets that produce rows, in ordinal order.
fn row_sets(procedure: &StoredProcedureDescriptor) -> impl Iterator<Item = &ResultSetDescriptor> {
    procedure.result_sets.iter().filter(|rs| !rs.fields.is_empty())
}

fn write_imports(w: &mut IndentWriter, ctx: &RenderContext<'_>, external: &[&str], runtime: &[&str]) {
    for line in external {
        w.write_line(&format!("use {};", line));
    }
    if !external.is_empty() {
        w.blank_line();
    }
    match runtime {
        [] => {}
        [single] => w.write_line(&format!("use {}::runtime::{};", ctx.namespace, single)),
        many => w.write_line(&format!("use {}::runtime::{{{}}};", ctx.namespace, many.join(", "))),
    }
    w.blank_line();
}

fn write_serde_rename(w: &mut IndentWriter, ident: &str, source: &str) {
    if ident.trim_start_matches("r#") != source {
        w.write_line(&format!("#[serde(rename = {})]", quote_string(source)));
    }
}

/// Write a params struct; `table_type` decides how table-valued parameters
/// are typed.
fn write_params_struct(
    w: &mut IndentWriter,
    procedure: &StoredProcedureDescriptor,
    ctx: &RenderContext<'_>,
    table_type: impl Fn(&InputDescriptor) -> String,
) {
    w.write_doc(&format!(
        "Parameters for `[{}].[{}]`.",
        procedure.schema_name, procedure.name
    ));
    w.write_line(MODEL_DERIVES);

    if procedure.inputs.is_empty() {
        w.write_line(&format!("pub struct {} {{}}", params_type_name(procedure)));
        return;
    }

    w.block(&format!("pub struct {} {{", params_type_name(procedure)), "}", |w| {
        for input in &procedure.inputs {
            let ident = field_ident(input.name());
            if ctx.include_comments && input.is_output {
                w.write_doc("OUTPUT parameter.");
            }
            write_serde_rename(w, &ident, input.name());
            let ty = if input.is_table_type {
                table_type(input)
            } else {
                scalar_param_type(input)
            };
            w.write_line(&format!("pub {}: {},", ident, ty));
        }
    });
}

fn write_model_struct(
    w: &mut IndentWriter,
    name: &str,
    doc: &str,
    fields: &[FieldDescriptor],
    ctx: &RenderContext<'_>,
) {
    w.write_doc(doc);
    w.write_line(MODEL_DERIVES);
    w.block(&format!("pub struct {} {{", name), "}", |w| {
        for field in fields {
            let ident = field_ident(&field.target_name);
            if ctx.include_comments && !field.sql_type_name.is_empty() {
                w.write_doc(&format!("`{}`", field.sql_type_name));
            }
            write_serde_rename(w, &ident, &field.source_name);
            w.write_line(&format!("pub {}: {},", ident, field_type(field)));
        }
    });
}

/// The status row returned by create/update/delete/merge/upsert procedures.
fn write_crud_result(w: &mut IndentWriter) {
    w.write_doc("Status row returned by write procedures.");
    w.write_line(MODEL_DERIVES);
    w.block("pub struct CrudResult {", "}", |w| {
        w.write_line("#[serde(rename = \"ResultId\")]");
        w.write_line("pub result_id: i64,");
        w.write_line("#[serde(rename = \"Message\")]");
        w.write_line("pub message: Option<String>,");
    });
    w.blank_line();
    w.block("impl CrudResult {", "}", |w| {
        w.block("pub fn succeeded(&self) -> bool {", "}", |w| {
            w.write_line("self.result_id > 0");
        });
    });
}
