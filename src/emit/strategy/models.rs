//! Model output: a params struct, one model struct per result set, and a
//! function returning the first result set's models.

use crate::model::StoredProcedureDescriptor;

use super::super::format::IndentWriter;
use super::super::template::TemplateVariant;
use super::{
    call_name, function_name, model_type_name, params_type_name, row_sets, write_crud_result,
    write_imports, write_model_struct, write_params_struct, EmissionStrategy, RenderContext,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct ModelsStrategy;

impl EmissionStrategy for ModelsStrategy {
    fn variant(&self) -> TemplateVariant {
        TemplateVariant::V2
    }

    fn render_body(&self, procedure: &StoredProcedureDescriptor, ctx: &RenderContext<'_>) -> String {
        let mut w = IndentWriter::new(ctx.indent.clone());
        write_imports(
            &mut w,
            ctx,
            &["serde::{Deserialize, Serialize}"],
            &["ExecuteError", "Executor"],
        );

        write_params_struct(&mut w, procedure, ctx, |_| "Vec<serde_json::Value>".to_string());
        w.blank_line();

        for rs in row_sets(procedure) {
            write_model_struct(
                &mut w,
                &model_type_name(procedure, rs),
                &format!("Row of result set {} (`{}`).", rs.ordinal, rs.name),
                &rs.fields,
                ctx,
            );
            w.blank_line();
        }

        let crud = procedure.operation_kind().is_crud();
        if crud {
            write_crud_result(&mut w);
            w.blank_line();
        }

        let (output, call) = if crud {
            ("CrudResult".to_string(), "query_one")
        } else if let Some(rs) = procedure.primary_result_set() {
            (format!("Vec<{}>", model_type_name(procedure, rs)), "query")
        } else {
            ("u64".to_string(), "execute")
        };

        w.write_doc(&format!("`[{}].[{}]`", procedure.schema_name, procedure.name));
        w.write_line(&format!("pub async fn {}<E: Executor>(", function_name(procedure)));
        w.indent();
        w.write_line("executor: &E,");
        w.write_line(&format!("params: &{},", params_type_name(procedure)));
        w.dedent();
        w.block(&format!(") -> Result<{}, ExecuteError> {{", output), "}", |w| {
            w.write_line(&format!(
                "executor.{}({}, params).await",
                call,
                call_name(procedure)
            ));
        });

        w.into_string()
    }
}
