//! `INSERT` rendering for sampled table rows.

use crate::descriptor::{ColumnDescriptor, TableRows};
use serde_json::Value;

fn is_json_type(data_type: &str) -> bool {
    matches!(data_type, "json" | "jsonb")
}

/// SQL literal for a value produced by `row_to_json`, given its column type.
///
/// - json/jsonb: every non-null value is written as quoted JSON text, scalars included.
/// - array types (`text[]`, ...): `ARRAY[..]::<type>`.
/// - everything else: numbers and booleans bare, strings quoted.
///
/// `row_to_json` maps SQL `NULL` and a JSON `null` to the same value, so both
/// come back as `NULL`.
pub fn sql_literal(value: &Value, data_type: &str) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    if is_json_type(data_type) {
        return quote_literal(&value.to_string());
    }
    match (data_type.strip_suffix("[]"), value) {
        (Some(element_type), Value::Array(items)) => {
            format!("{}::{}", array_literal(items, element_type), data_type)
        }
        _ => scalar_literal(value),
    }
}

fn array_literal(items: &[Value], element_type: &str) -> String {
    let elements: Vec<String> = items
        .iter()
        .map(|item| match item {
            Value::Null => "NULL".to_string(),
            // multi-dimensional arrays nest
            Value::Array(inner) => array_literal(inner, element_type),
            _ if is_json_type(element_type) => quote_literal(&item.to_string()),
            _ => scalar_literal(item),
        })
        .collect();
    format!("ARRAY[{}]", elements.join(", "))
}

fn scalar_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_literal(s),
        // composite types come back as objects
        Value::Array(_) | Value::Object(_) => quote_literal(&value.to_string()),
    }
}

fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// One `INSERT` for one row; missing keys become `NULL`.
pub fn render_insert(schema: &str, table: &str, columns: &[ColumnDescriptor], row: &Value) -> String {
    let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
    let values: Vec<String> = columns
        .iter()
        .map(|col| sql_literal(row.get(&col.name).unwrap_or(&Value::Null), &col.data_type))
        .collect();

    format!(
        "INSERT INTO {}.{} ({}) VALUES ({});\n",
        schema,
        table,
        names.join(", "),
        values.join(", ")
    )
}

pub fn render_data_file(rows: &TableRows, generated_at: &str) -> String {
    let mut sql = format!(
        "-- Data for: {}\n-- Generated: {}\n-- Rows: {}\n\n",
        rows.table,
        generated_at,
        rows.rows.len()
    );
    for row in &rows.rows {
        sql.push_str(&render_insert(&rows.schema, &rows.table, &rows.columns, row));
    }
    if !rows.rows.is_empty() {
        sql.push('\n');
    }
    sql
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sql_literal_plain_columns() {
        assert_eq!(sql_literal(&Value::Null, "text"), "NULL");
        assert_eq!(sql_literal(&json!(true), "boolean"), "true");
        assert_eq!(sql_literal(&json!(42), "integer"), "42");
        assert_eq!(sql_literal(&json!(1.5), "numeric"), "1.5");
        assert_eq!(sql_literal(&json!("O'Brien"), "text"), "'O''Brien'");
    }

    #[test]
    fn test_sql_literal_json_scalars_are_quoted() {
        assert_eq!(sql_literal(&json!(42), "jsonb"), "'42'");
        assert_eq!(sql_literal(&json!(true), "jsonb"), "'true'");
        assert_eq!(sql_literal(&json!("abc"), "jsonb"), "'\"abc\"'");
        assert_eq!(sql_literal(&json!("it's"), "json"), "'\"it''s\"'");
        assert_eq!(sql_literal(&json!({"k": "v"}), "jsonb"), "'{\"k\":\"v\"}'");
        assert_eq!(sql_literal(&json!([1, 2]), "json"), "'[1,2]'");
        assert_eq!(sql_literal(&Value::Null, "jsonb"), "NULL");
    }

    #[test]
    fn test_sql_literal_arrays() {
        assert_eq!(sql_literal(&json!(["a", "b'c"]), "text[]"), "ARRAY['a', 'b''c']::text[]");
        assert_eq!(sql_literal(&json!([1, null, 3]), "int4[]"), "ARRAY[1, NULL, 3]::int4[]");
        assert_eq!(sql_literal(&json!([[1, 2], [3, 4]]), "int4[]"), "ARRAY[ARRAY[1, 2], ARRAY[3, 4]]::int4[]");
        assert_eq!(sql_literal(&json!([]), "text[]"), "ARRAY[]::text[]");
        assert_eq!(sql_literal(&json!([{"k": 1}, 2]), "jsonb[]"), "ARRAY['{\"k\":1}', '2']::jsonb[]");
    }

    #[test]
    fn test_render_insert_uses_column_order() {
        let columns = vec![
            ColumnDescriptor::new("id", "integer"),
            ColumnDescriptor::new("name", "text"),
            ColumnDescriptor::new("bio", "text"),
        ];
        let row = json!({"name": "Asha", "id": 7});

        assert_eq!(
            render_insert("public", "students", &columns, &row),
            "INSERT INTO public.students (id, name, bio) VALUES (7, 'Asha', NULL);\n"
        );
    }

    #[test]
    fn test_render_insert_json_column() {
        let columns = vec![
            ColumnDescriptor::new("id", "integer"),
            ColumnDescriptor::new("settings", "jsonb"),
        ];

        assert_eq!(
            render_insert("public", "prefs", &columns, &json!({"id": 1, "settings": 42})),
            "INSERT INTO public.prefs (id, settings) VALUES (1, '42');\n"
        );
    }

    #[test]
    fn test_render_data_file() {
        let rows = TableRows {
            schema: "public".to_string(),
            table: "courses".to_string(),
            columns: vec![
                ColumnDescriptor::new("id", "integer"),
                ColumnDescriptor::new("title", "text"),
            ],
            rows: vec![json!({"id": 1, "title": "Algebra"}), json!({"id": 2, "title": "Physics"})],
        };

        assert_eq!(
            render_data_file(&rows, "T"),
            "-- Data for: courses\n-- Generated: T\n-- Rows: 2\n\n\
             INSERT INTO public.courses (id, title) VALUES (1, 'Algebra');\n\
             INSERT INTO public.courses (id, title) VALUES (2, 'Physics');\n\n"
        );
    }
}
