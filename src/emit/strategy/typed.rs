//! Typed output: params and model structs, table-type row structs, and a
//! `StoredProcedure` impl whose associated types carry the full signature.

use std::collections::BTreeSet;

use crate::model::StoredProcedureDescriptor;

use super::super::format::{field_ident, nullable, quote_string, rust_type, type_ident, IndentWriter};
use super::super::template::TemplateVariant;
use super::{
    model_type_name, params_type_name, row_sets, table_row_type_name, write_crud_result,
    write_imports, write_model_struct, write_params_struct, EmissionStrategy, RenderContext,
    MODEL_DERIVES,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct TypedStrategy;

impl TypedStrategy {
    fn output_type(procedure: &StoredProcedureDescriptor) -> String {
        if procedure.operation_kind().is_crud() {
            return "CrudResult".to_string();
        }
        match procedure.primary_result_set() {
            Some(rs) if rs.returns_json && !rs.returns_json_array => {
                format!("Json<{}>", model_type_name(procedure, rs))
            }
            Some(rs) => format!("Vec<{}>", model_type_name(procedure, rs)),
            None => "()".to_string(),
        }
    }

    fn write_table_rows(w: &mut IndentWriter, procedure: &StoredProcedureDescriptor) {
        let mut seen = BTreeSet::new();
        for input in procedure.table_type_inputs() {
            let name = table_row_type_name(input);
            if !seen.insert(name.clone()) {
                continue;
            }
            let label = input.user_type_name.as_deref().unwrap_or(input.name());
            w.write_doc(&format!("Row of table type `{}`.", label));
            w.write_line(MODEL_DERIVES);
            w.block(&format!("pub struct {} {{", name), "}", |w| {
                for column in &input.table_columns {
                    let ident = field_ident(&column.name);
                    if ident.trim_start_matches("r#") != column.name {
                        w.write_line(&format!("#[serde(rename = {})]", quote_string(&column.name)));
                    }
                    let ty = nullable(rust_type(column.lang_type()), column.is_nullable);
                    w.write_line(&format!("pub {}: {},", ident, ty));
                }
            });
            w.blank_line();
        }
    }
}

impl EmissionStrategy for TypedStrategy {
    fn variant(&self) -> TemplateVariant {
        TemplateVariant::V3
    }

    fn render_body(&self, procedure: &StoredProcedureDescriptor, ctx: &RenderContext<'_>) -> String {
        let output = Self::output_type(procedure);

        let mut w = IndentWriter::new(ctx.indent.clone());
        let runtime: &[&str] = if output.starts_with("Json<") {
            &["Json", "StoredProcedure"]
        } else {
            &["StoredProcedure"]
        };
        write_imports(&mut w, ctx, &["serde::{Deserialize, Serialize}"], runtime);

        Self::write_table_rows(&mut w, procedure);

        write_params_struct(&mut w, procedure, ctx, |input| {
            format!("Vec<{}>", table_row_type_name(input))
        });
        w.blank_line();

        for rs in row_sets(procedure) {
            let doc = if rs.returns_json {
                format!("JSON payload of result set {} (`{}`).", rs.ordinal, rs.name)
            } else {
                format!("Row of result set {} (`{}`).", rs.ordinal, rs.name)
            };
            write_model_struct(&mut w, &model_type_name(procedure, rs), &doc, &rs.fields, ctx);
            w.blank_line();
        }

        if procedure.operation_kind().is_crud() {
            write_crud_result(&mut w);
            w.blank_line();
        }

        let marker = type_ident(&procedure.name);
        w.write_doc(&format!("`[{}].[{}]`", procedure.schema_name, procedure.name));
        w.write_line("#[derive(Debug, Clone, Copy, Default)]");
        w.write_line(&format!("pub struct {};", marker));
        w.blank_line();
        w.block(&format!("impl StoredProcedure for {} {{", marker), "}", |w| {
            w.write_line(&format!(
                "const SCHEMA: &'static str = {};",
                quote_string(&procedure.schema_name)
            ));
            w.write_line(&format!(
                "const NAME: &'static str = {};",
                quote_string(&procedure.name)
            ));
            w.blank_line();
            w.write_line(&format!("type Params = {};", params_type_name(procedure)));
            w.write_line(&format!("type Output = {};", output));
        });

        w.into_string()
    }
}
