//! `CREATE TABLE` and constraint rendering.

use super::object_header;
use crate::descriptor::{ColumnDescriptor, ConstraintDescriptor, ConstraintKind, TableDescriptor};
use std::fmt::Write;

/// `<name> <type>[(<len>)][ NOT NULL][ DEFAULT <expr>]`
pub fn render_column(column: &ColumnDescriptor) -> String {
    let mut sql = format!("{} {}", column.name, column.data_type);
    if let Some(len) = column.max_length {
        let _ = write!(sql, "({})", len);
    }
    if !column.nullable {
        sql.push_str(" NOT NULL");
    }
    if let Some(ref default) = column.default {
        let _ = write!(sql, " DEFAULT {}", default);
    }
    sql
}

/// # Examples
///
/// ```
/// use supabase_export::descriptor::{ColumnDescriptor, TableDescriptor};
/// use supabase_export::render::render_create_table;
///
/// let table = TableDescriptor::new("public", "todos")
///     .with_column(ColumnDescriptor::new("id", "integer").not_null());
///
/// assert_eq!(
///     render_create_table(&table),
///     "CREATE TABLE IF NOT EXISTS public.todos (\n  id integer NOT NULL\n);\n\n"
/// );
/// ```
pub fn render_create_table(table: &TableDescriptor) -> String {
    let columns: Vec<String> = table.columns.iter().map(render_column).collect();
    format!(
        "CREATE TABLE IF NOT EXISTS {}.{} (\n  {}\n);\n\n",
        table.schema,
        table.name,
        columns.join(",\n  ")
    )
}

fn render_constraint(schema: &str, table: &str, constraint: &ConstraintDescriptor) -> String {
    let columns = constraint.columns.join(", ");
    match constraint.kind {
        ConstraintKind::PrimaryKey | ConstraintKind::Unique => format!(
            "ALTER TABLE {}.{} ADD CONSTRAINT {} {} ({});\n",
            schema,
            table,
            constraint.name,
            constraint.kind.as_sql(),
            columns
        ),
        ConstraintKind::ForeignKey => format!(
            "ALTER TABLE {}.{} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {}({});\n",
            schema,
            table,
            constraint.name,
            columns,
            constraint.foreign_table.as_deref().unwrap_or_default(),
            constraint.foreign_columns.join(", ")
        ),
    }
}

/// `-- Constraints` block, or an empty string when the table has none.
pub fn render_constraints(table: &TableDescriptor) -> String {
    if table.constraints.is_empty() {
        return String::new();
    }

    let mut sql = String::from("-- Constraints\n");
    for constraint in &table.constraints {
        sql.push_str(&render_constraint(&table.schema, &table.name, constraint));
    }
    sql.push('\n');
    sql
}

/// Full per-table file: header, `CREATE TABLE`, constraints.
pub fn render_table_file(table: &TableDescriptor, generated_at: &str) -> String {
    let mut sql = object_header("Table", &table.name, generated_at);
    sql.push_str(&render_create_table(table));
    sql.push_str(&render_constraints(table));
    sql
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profiles() -> TableDescriptor {
        TableDescriptor::new("public", "profiles")
            .with_column(
                ColumnDescriptor::new("id", "uuid")
                    .not_null()
                    .default_expr("gen_random_uuid()"),
            )
            .with_column(ColumnDescriptor::new("username", "character varying").max_length(50))
            .with_column(ColumnDescriptor::new("owner_id", "uuid").not_null())
    }

    #[test]
    fn test_render_column_variants() {
        assert_eq!(
            render_column(&ColumnDescriptor::new("id", "integer").not_null()),
            "id integer NOT NULL"
        );
        assert_eq!(
            render_column(&ColumnDescriptor::new("name", "character varying").max_length(255)),
            "name character varying(255)"
        );
        assert_eq!(
            render_column(
                &ColumnDescriptor::new("created_at", "timestamp with time zone")
                    .not_null()
                    .default_expr("now()")
            ),
            "created_at timestamp with time zone NOT NULL DEFAULT now()"
        );
    }

    #[test]
    fn test_render_create_table_multiple_columns() {
        assert_eq!(
            render_create_table(&profiles()),
            "CREATE TABLE IF NOT EXISTS public.profiles (\n  \
             id uuid NOT NULL DEFAULT gen_random_uuid(),\n  \
             username character varying(50),\n  \
             owner_id uuid NOT NULL\n);\n\n"
        );
    }

    #[test]
    fn test_render_constraints() {
        let table = profiles()
            .with_constraint(ConstraintDescriptor::primary_key("profiles_pkey", &["id"]))
            .with_constraint(ConstraintDescriptor::unique("profiles_username_key", &["username"]))
            .with_constraint(ConstraintDescriptor::foreign_key(
                "profiles_owner_id_fkey",
                &["owner_id"],
                "users",
                &["id"],
            ));

        assert_eq!(
            render_constraints(&table),
            "-- Constraints\n\
             ALTER TABLE public.profiles ADD CONSTRAINT profiles_pkey PRIMARY KEY (id);\n\
             ALTER TABLE public.profiles ADD CONSTRAINT profiles_username_key UNIQUE (username);\n\
             ALTER TABLE public.profiles ADD CONSTRAINT profiles_owner_id_fkey FOREIGN KEY (owner_id) REFERENCES users(id);\n\
             \n"
        );
    }

    #[test]
    fn test_render_constraints_composite() {
        let table = TableDescriptor::new("public", "enrollments").with_constraint(
            ConstraintDescriptor::primary_key("enrollments_pkey", &["student_id", "course_id"]),
        );
        assert!(render_constraints(&table)
            .contains("ADD CONSTRAINT enrollments_pkey PRIMARY KEY (student_id, course_id);"));
    }

    #[test]
    fn test_render_table_file_without_constraints() {
        let table = TableDescriptor::new("public", "notes")
            .with_column(ColumnDescriptor::new("body", "text"));
        assert_eq!(
            render_table_file(&table, "2024-01-01T00:00:00.000Z"),
            "-- Table: notes\n-- Generated: 2024-01-01T00:00:00.000Z\n\n\
             CREATE TABLE IF NOT EXISTS public.notes (\n  body text\n);\n\n"
        );
    }
}
