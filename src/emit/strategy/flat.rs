//! Flat output: one free function per procedure, positional arguments,
//! rows returned as untyped JSON values.

use crate::model::StoredProcedureDescriptor;

use super::super::format::{field_ident, quote_string, IndentWriter};
use super::super::template::TemplateVariant;
use super::{call_name, function_name, scalar_param_type, write_imports, EmissionStrategy, RenderContext};

#[derive(Debug, Clone, Copy, Default)]
pub struct FlatStrategy;

impl EmissionStrategy for FlatStrategy {
    fn variant(&self) -> TemplateVariant {
        TemplateVariant::V1
    }

    fn render_body(&self, procedure: &StoredProcedureDescriptor, ctx: &RenderContext<'_>) -> String {
        let mut w = IndentWriter::new(ctx.indent.clone());
        write_imports(
            &mut w,
            ctx,
            &["serde_json::Value"],
            &["ExecuteError", "Executor", "SqlParam"],
        );

        let args: Vec<(String, String, &str, bool)> = procedure
            .inputs
            .iter()
            .map(|input| {
                let ty = if input.is_table_type {
                    "Vec<Value>".to_string()
                } else {
                    scalar_param_type(input)
                };
                (field_ident(input.name()), ty, input.name(), input.is_output)
            })
            .collect();

        w.write_doc(&format!("`[{}].[{}]`", procedure.schema_name, procedure.name));
        w.write_line(&format!("pub async fn {}<E: Executor>(", function_name(procedure)));
        w.indent();
        w.write_line("executor: &E,");
        for (ident, ty, _, _) in &args {
            w.write_line(&format!("{}: {},", ident, ty));
        }
        w.dedent();
        w.block(") -> Result<Vec<Value>, ExecuteError> {", "}", |w| {
            if args.is_empty() {
                w.write_line("let params = Vec::new();");
            } else {
                w.block("let params = vec![", "];", |w| {
                    for (ident, _, name, is_output) in &args {
                        let ctor = if *is_output { "output" } else { "new" };
                        w.write_line(&format!(
                            "SqlParam::{}({}, {}),",
                            ctor,
                            quote_string(name),
                            ident
                        ));
                    }
                });
            }
            w.write_line(&format!(
                "executor.query_rows({}, params).await",
                call_name(procedure)
            ));
        });

        w.into_string()
    }
}
