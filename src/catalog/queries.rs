//! Catalog queries.
//!
//! Every catalog query is read-only and takes the schema name as `$1`.
//! `information_schema` columns are domain-typed, so they are cast to plain
//! `text`/`int4` for the driver.

pub const TABLE_COLUMNS: &str = r#"
    SELECT
      t.table_name::text AS table_name,
      c.column_name::text AS column_name,
      c.data_type::text AS data_type,
      c.udt_name::text AS udt_name,
      c.character_maximum_length::int4 AS max_length,
      (c.is_nullable = 'YES') AS nullable,
      c.column_default::text AS column_default
    FROM information_schema.tables t
    JOIN information_schema.columns c ON t.table_name = c.table_name
      AND t.table_schema = c.table_schema
    WHERE t.table_schema = $1::text
      AND t.table_type = 'BASE TABLE'
    ORDER BY t.table_name, c.ordinal_position
"#;

/// `$2` is the table name. Primary keys sort first, then unique, then foreign keys.
///
/// One row per key column, in key order. For foreign keys the referenced
/// column is taken from the same position of `confkey`, so composite keys
/// stay paired. Constraints are scoped by `conrelid`, which keeps two tables
/// with identically named constraints apart.
pub const TABLE_CONSTRAINTS: &str = r#"
    SELECT
      con.conname::text AS constraint_name,
      CASE con.contype
        WHEN 'p' THEN 'PRIMARY KEY'
        WHEN 'u' THEN 'UNIQUE'
        ELSE 'FOREIGN KEY'
      END AS constraint_type,
      att.attname::text AS column_name,
      ref.relname::text AS foreign_table_name,
      ref_att.attname::text AS foreign_column_name
    FROM pg_constraint con
    JOIN pg_class rel ON rel.oid = con.conrelid
    JOIN pg_namespace nsp ON nsp.oid = rel.relnamespace
    CROSS JOIN LATERAL unnest(con.conkey) WITH ORDINALITY AS k(attnum, ord)
    JOIN pg_attribute att
      ON att.attrelid = con.conrelid
      AND att.attnum = k.attnum
    LEFT JOIN pg_class ref ON ref.oid = con.confrelid
    LEFT JOIN pg_attribute ref_att
      ON ref_att.attrelid = con.confrelid
      AND ref_att.attnum = con.confkey[k.ord::int]
    WHERE nsp.nspname = $1::text
      AND rel.relname = $2::text
      AND con.contype IN ('p', 'u', 'f')
    ORDER BY
      CASE con.contype
        WHEN 'p' THEN 0
        WHEN 'u' THEN 1
        ELSE 2
      END,
      con.conname,
      k.ord
"#;

pub const POLICIES: &str = r#"
    SELECT
      schemaname::text AS schemaname,
      tablename::text AS tablename,
      policyname::text AS policyname,
      permissive,
      roles::text[] AS roles,
      cmd,
      qual,
      with_check
    FROM pg_policies
    WHERE schemaname = $1::text
    ORDER BY tablename, policyname
"#;

pub const TRIGGERS: &str = r#"
    SELECT
      n.nspname::text AS schema_name,
      c.relname::text AS table_name,
      t.tgname::text AS trigger_name,
      pg_get_triggerdef(t.oid) AS trigger_definition
    FROM pg_trigger t
    JOIN pg_class c ON t.tgrelid = c.oid
    JOIN pg_namespace n ON c.relnamespace = n.oid
    WHERE n.nspname = $1::text
      AND NOT t.tgisinternal
    ORDER BY c.relname, t.tgname
"#;

/// Aggregates and window functions are skipped: `pg_get_functiondef` rejects
/// them and would fail the whole query. Extension-owned routines are skipped
/// because `CREATE EXTENSION` recreates them.
pub const FUNCTIONS: &str = r#"
    SELECT
      p.proname::text AS function_name,
      pg_get_functiondef(p.oid) AS function_definition
    FROM pg_proc p
    JOIN pg_namespace n ON p.pronamespace = n.oid
    WHERE n.nspname = $1::text
      AND p.prokind IN ('f', 'p')
      AND NOT EXISTS (
        SELECT 1 FROM pg_depend d
        WHERE d.classid = 'pg_proc'::regclass
          AND d.objid = p.oid
          AND d.deptype = 'e'
      )
    ORDER BY p.proname, pg_get_function_identity_arguments(p.oid)
"#;

pub const VIEWS: &str = r#"
    SELECT
      table_name::text AS view_name,
      view_definition::text AS view_definition
    FROM information_schema.views
    WHERE table_schema = $1::text
    ORDER BY table_name
"#;

/// Row sample for one table; `$1` is the row limit.
pub fn table_rows(schema: &str, table: &str) -> String {
    format!(
        "SELECT row_to_json(t)::text AS row_json FROM {}.{} t LIMIT $1",
        quote_ident(schema),
        quote_ident(table)
    )
}

/// Double-quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
