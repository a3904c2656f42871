//! Catalog introspection.
//!
//! [`Catalog`] is what the exporter reads schema objects from. [`PgCatalog`]
//! implements it with the queries in [`queries`] over an [`Executor`]; tests
//! substitute an in-memory catalog.

pub mod queries;

use crate::descriptor::{
    resolve_column_type, ColumnDescriptor, ConstraintDescriptor, ConstraintKind,
    FunctionDescriptor, PolicyDescriptor, TableDescriptor, TableRows, TriggerDescriptor,
    ViewDescriptor,
};
use crate::executor::{Executor, PostgresExecutor, QueryError};

/// Source of schema objects for one schema.
pub trait Catalog {
    /// Base tables with their columns; constraints are fetched separately.
    fn tables(&mut self, schema: &str) -> Result<Vec<TableDescriptor>, QueryError>;

    fn constraints(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ConstraintDescriptor>, QueryError>;

    fn policies(&mut self, schema: &str) -> Result<Vec<PolicyDescriptor>, QueryError>;

    fn triggers(&mut self, schema: &str) -> Result<Vec<TriggerDescriptor>, QueryError>;

    fn functions(&mut self, schema: &str) -> Result<Vec<FunctionDescriptor>, QueryError>;

    fn views(&mut self, schema: &str) -> Result<Vec<ViewDescriptor>, QueryError>;

    /// Up to `limit` rows of `table`, as JSON objects.
    fn table_rows(
        &mut self,
        schema: &str,
        table: &TableDescriptor,
        limit: u32,
    ) -> Result<TableRows, QueryError>;
}

/// One row of the column query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRow {
    pub table_name: String,
    pub column: ColumnDescriptor,
}

/// One row of the constraint query: a (constraint, column, referenced column) triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintRow {
    pub constraint_name: String,
    pub constraint_type: String,
    pub column_name: String,
    pub foreign_table_name: Option<String>,
    pub foreign_column_name: Option<String>,
}

/// Fold column rows (ordered by table, then ordinal position) into tables.
pub fn group_columns(schema: &str, rows: Vec<ColumnRow>) -> Vec<TableDescriptor> {
    let mut tables: Vec<TableDescriptor> = Vec::new();
    for row in rows {
        match tables.last_mut() {
            Some(table) if table.name == row.table_name => table.columns.push(row.column),
            _ => tables.push(TableDescriptor::new(schema, row.table_name).with_column(row.column)),
        }
    }
    tables
}

/// Fold constraint rows into one descriptor per constraint, keeping query order.
///
/// Rows arrive one per key column in key position order; for foreign keys each
/// row carries the referenced column paired with it. Constraint kinds other
/// than primary key, foreign key and unique are dropped.
pub fn group_constraints(rows: Vec<ConstraintRow>) -> Vec<ConstraintDescriptor> {
    let mut grouped: indexmap::IndexMap<String, ConstraintDescriptor> = indexmap::IndexMap::new();

    for row in rows {
        let Some(kind) = ConstraintKind::from_catalog(&row.constraint_type) else {
            continue;
        };

        let entry = grouped
            .entry(row.constraint_name.clone())
            .or_insert_with(|| ConstraintDescriptor {
                name: row.constraint_name.clone(),
                kind,
                columns: Vec::new(),
                foreign_table: None,
                foreign_columns: Vec::new(),
            });

        entry.columns.push(row.column_name);

        if kind == ConstraintKind::ForeignKey {
            if entry.foreign_table.is_none() {
                entry.foreign_table = row.foreign_table_name;
            }
            if let Some(col) = row.foreign_column_name {
                entry.foreign_columns.push(col);
            }
        }
    }

    grouped.into_values().collect()
}

/// Postgres-backed catalog.
pub struct PgCatalog<E: Executor = PostgresExecutor> {
    executor: E,
}

impl<E: Executor> PgCatalog<E> {
    pub fn new(executor: E) -> Self {
        Self { executor }
    }
}

impl PgCatalog<PostgresExecutor> {
    /// Close the underlying connection.
    pub fn close(self) -> Result<(), QueryError> {
        self.executor.close()
    }
}

impl<E: Executor> Catalog for PgCatalog<E> {
    fn tables(&mut self, schema: &str) -> Result<Vec<TableDescriptor>, QueryError> {
        let rows = self.executor.query_all(queries::TABLE_COLUMNS, &[&schema])?;

        let mut column_rows = Vec::with_capacity(rows.len());
        for row in rows {
            let data_type: String = row.try_get("data_type")?;
            let udt_name: Option<String> = row.try_get("udt_name")?;
            column_rows.push(ColumnRow {
                table_name: row.try_get("table_name")?,
                column: ColumnDescriptor {
                    name: row.try_get("column_name")?,
                    data_type: resolve_column_type(&data_type, udt_name.as_deref()),
                    max_length: row.try_get("max_length")?,
                    nullable: row.try_get("nullable")?,
                    default: row.try_get("column_default")?,
                },
            });
        }

        Ok(group_columns(schema, column_rows))
    }

    fn constraints(
        &mut self,
        schema: &str,
        table: &str,
    ) -> Result<Vec<ConstraintDescriptor>, QueryError> {
        let rows = self
            .executor
            .query_all(queries::TABLE_CONSTRAINTS, &[&schema, &table])?;

        let mut constraint_rows = Vec::with_capacity(rows.len());
        for row in rows {
            constraint_rows.push(ConstraintRow {
                constraint_name: row.try_get("constraint_name")?,
                constraint_type: row.try_get("constraint_type")?,
                column_name: row.try_get("column_name")?,
                foreign_table_name: row.try_get("foreign_table_name")?,
                foreign_column_name: row.try_get("foreign_column_name")?,
            });
        }

        Ok(group_constraints(constraint_rows))
    }

    fn policies(&mut self, schema: &str) -> Result<Vec<PolicyDescriptor>, QueryError> {
        let rows = self.executor.query_all(queries::POLICIES, &[&schema])?;

        rows.iter()
            .map(|row| -> Result<PolicyDescriptor, QueryError> {
                Ok(PolicyDescriptor {
                    schema: row.try_get("schemaname")?,
                    table: row.try_get("tablename")?,
                    name: row.try_get("policyname")?,
                    permissive: row.try_get("permissive")?,
                    roles: row.try_get("roles")?,
                    command: row.try_get("cmd")?,
                    using: row.try_get("qual")?,
                    with_check: row.try_get("with_check")?,
                })
            })
            .collect()
    }

    fn triggers(&mut self, schema: &str) -> Result<Vec<TriggerDescriptor>, QueryError> {
        let rows = self.executor.query_all(queries::TRIGGERS, &[&schema])?;

        rows.iter()
            .map(|row| -> Result<TriggerDescriptor, QueryError> {
                Ok(TriggerDescriptor {
                    schema: row.try_get("schema_name")?,
                    table: row.try_get("table_name")?,
                    name: row.try_get("trigger_name")?,
                    definition: row.try_get("trigger_definition")?,
                })
            })
            .collect()
    }

    fn functions(&mut self, schema: &str) -> Result<Vec<FunctionDescriptor>, QueryError> {
        let rows = self.executor.query_all(queries::FUNCTIONS, &[&schema])?;

        rows.iter()
            .map(|row| -> Result<FunctionDescriptor, QueryError> {
                Ok(FunctionDescriptor {
                    name: row.try_get("function_name")?,
                    definition: row.try_get("function_definition")?,
                })
            })
            .collect()
    }

    fn views(&mut self, schema: &str) -> Result<Vec<ViewDescriptor>, QueryError> {
        let rows = self.executor.query_all(queries::VIEWS, &[&schema])?;

        rows.iter()
            .map(|row| -> Result<ViewDescriptor, QueryError> {
                Ok(ViewDescriptor {
                    name: row.try_get("view_name")?,
                    definition: row.try_get("view_definition")?,
                })
            })
            .collect()
    }

    fn table_rows(
        &mut self,
        schema: &str,
        table: &TableDescriptor,
        limit: u32,
    ) -> Result<TableRows, QueryError> {
        let query = queries::table_rows(schema, &table.name);
        let limit = i64::from(limit);
        let rows = self.executor.query_all(&query, &[&limit])?;

        let mut values = Vec::with_capacity(rows.len());
        for row in rows {
            let json: String = row.try_get("row_json")?;
            let value = serde_json::from_str(&json).map_err(|e| {
                QueryError::Parse(format!("row of {}.{}: {}", schema, table.name, e))
            })?;
            values.push(value);
        }

        Ok(TableRows {
            schema: schema.to_string(),
            table: table.name.clone(),
            columns: table.columns.clone(),
            rows: values,
        })
    }
}
