//! Row-level-security policy rendering.

use super::object_header;
use crate::descriptor::PolicyDescriptor;
use std::fmt::Write;

/// `DROP POLICY IF EXISTS` + `CREATE POLICY` for one policy.
pub fn render_policy(policy: &PolicyDescriptor) -> String {
    let target = format!("{}.{}", policy.schema, policy.table);
    let mut sql = String::new();

    let _ = writeln!(sql, "DROP POLICY IF EXISTS \"{}\" ON {};", policy.name, target);
    let _ = writeln!(sql, "CREATE POLICY \"{}\"", policy.name);
    let _ = writeln!(sql, "  ON {}", target);
    let _ = writeln!(sql, "  AS {}", policy.permissive.to_uppercase());
    let _ = writeln!(sql, "  FOR {}", policy.command);
    let _ = writeln!(sql, "  TO {}", policy.roles.join(", "));

    if let Some(ref qual) = policy.using {
        let _ = writeln!(sql, "  USING ({})", qual);
    }
    if let Some(ref check) = policy.with_check {
        let _ = writeln!(sql, "  WITH CHECK ({})", check);
    }
    sql.push_str(";\n\n");
    sql
}

/// Per-table policy file: header, `ENABLE ROW LEVEL SECURITY`, then every
/// policy in the order given.
pub fn render_policy_file(
    schema: &str,
    table: &str,
    policies: &[PolicyDescriptor],
    generated_at: &str,
) -> String {
    let mut sql = object_header("RLS Policies for", table, generated_at);
    let _ = write!(
        sql,
        "ALTER TABLE {}.{} ENABLE ROW LEVEL SECURITY;\n\n",
        schema, table
    );
    for policy in policies {
        sql.push_str(&render_policy(policy));
    }
    sql
}
