//! Trigger, function and view rendering. Definitions are catalog text, emitted verbatim.

use super::{object_header, trim_definition};
use crate::descriptor::{FunctionDescriptor, TriggerDescriptor, ViewDescriptor};

/// Per-table trigger file.
pub fn render_trigger_file(table: &str, triggers: &[TriggerDescriptor], generated_at: &str) -> String {
    let mut sql = object_header("Triggers for", table, generated_at);
    for trigger in triggers {
        sql.push_str(trim_definition(&trigger.definition));
        sql.push_str(";\n\n");
    }
    sql
}

/// Function file; overloads sharing a name are written one after another.
pub fn render_function_file(
    name: &str,
    overloads: &[FunctionDescriptor],
    generated_at: &str,
) -> String {
    let mut sql = object_header("Function", name, generated_at);
    for function in overloads {
        sql.push_str(trim_definition(&function.definition));
        sql.push_str(";\n\n");
    }
    sql
}

pub fn render_view_file(schema: &str, view: &ViewDescriptor, generated_at: &str) -> String {
    let mut sql = object_header("View", &view.name, generated_at);
    match view.definition {
        Some(ref definition) => {
            sql.push_str(&format!(
                "CREATE OR REPLACE VIEW {}.{} AS\n{};\n\n",
                schema,
                view.name,
                trim_definition(definition)
            ));
        }
        None => {
            sql.push_str("-- Definition not visible to the connected role\n\n");
        }
    }
    sql
}
