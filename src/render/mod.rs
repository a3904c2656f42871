//! SQL text rendering.
//!
//! Every function here is pure: descriptors in, SQL text out. The exact
//! layout (header comments, two-space indentation, blank line after each
//! statement) is part of the output contract, so changes show up as diffs in
//! previously exported trees.

pub mod data;
pub mod index;
pub mod policy;
pub mod routine;
pub mod table;

pub use data::{render_data_file, render_insert, sql_literal};
pub use index::render_master_index;
pub use policy::{render_policy, render_policy_file};
pub use routine::{render_function_file, render_trigger_file, render_view_file};
pub use table::{render_column, render_constraints, render_create_table, render_table_file};

use chrono::{DateTime, SecondsFormat, Utc};

/// `Generated:` value for a run, e.g. `2024-05-01T09:30:00.000Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Two-line header opening every per-object file.
pub(crate) fn object_header(label: &str, name: &str, generated_at: &str) -> String {
    format!("-- {}: {}\n-- Generated: {}\n\n", label, name, generated_at)
}

/// Header of an aggregate file; `database` adds a `-- Database:` line.
pub fn aggregate_header(title: &str, generated_at: &str, database: Option<&str>) -> String {
    let mut out = format!("-- {}\n-- Generated: {}\n", title, generated_at);
    if let Some(host) = database {
        out.push_str(&format!("-- Database: {}\n", host));
    }
    out.push('\n');
    out
}

/// Catalog definitions sometimes carry their own terminator; templates add one.
pub(crate) fn trim_definition(definition: &str) -> &str {
    definition.trim().trim_end_matches(';').trim_end()
}

/// Turn an object name into a file stem that stays inside its folder.
pub fn sanitize_file_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match stem.trim() {
        "" | "." | ".." => format!("_{}", stem.trim().replace('.', "_")),
        _ => stem,
    }
}

/// Normalize `-- Generated:` lines so two exports can be compared byte for byte.
pub fn normalize_generated_lines(sql: &str) -> String {
    sql.lines()
        .map(|line| {
            if line.starts_with("-- Generated: ") {
                "-- Generated: <timestamp>"
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
