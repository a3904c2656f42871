//! Schema object descriptors.
//!
//! Plain records built from catalog rows on every run and discarded once
//! rendered. Nothing here is validated against Postgres; catalog output is
//! taken verbatim.

/// One column of a table, in ordinal order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Rendered type name (`integer`, `character varying`, `my_enum`, `text[]`)
    pub data_type: String,
    /// `character_maximum_length`, rendered as `type(len)`
    pub max_length: Option<i32>,
    pub nullable: bool,
    pub default: Option<String>,
}

impl ColumnDescriptor {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            max_length: None,
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn max_length(mut self, len: i32) -> Self {
        self.max_length = Some(len);
        self
    }

    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }
}

/// Resolve the type name to emit for a column.
///
/// `information_schema.columns.data_type` reports enums and domains as
/// `USER-DEFINED` and arrays as `ARRAY`; the real names live in `udt_name`
/// (array element types carry a leading underscore).
pub fn resolve_column_type(data_type: &str, udt_name: Option<&str>) -> String {
    match (data_type, udt_name) {
        ("USER-DEFINED", Some(udt)) => udt.to_string(),
        ("ARRAY", Some(udt)) => format!("{}[]", udt.strip_prefix('_').unwrap_or(udt)),
        _ => data_type.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    PrimaryKey,
    ForeignKey,
    Unique,
}

impl ConstraintKind {
    /// Parse `information_schema.table_constraints.constraint_type`.
    ///
    /// `CHECK` and anything else is not exported.
    pub fn from_catalog(constraint_type: &str) -> Option<Self> {
        match constraint_type {
            "PRIMARY KEY" => Some(ConstraintKind::PrimaryKey),
            "FOREIGN KEY" => Some(ConstraintKind::ForeignKey),
            "UNIQUE" => Some(ConstraintKind::Unique),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY KEY",
            ConstraintKind::ForeignKey => "FOREIGN KEY",
            ConstraintKind::Unique => "UNIQUE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintDescriptor {
    pub name: String,
    pub kind: ConstraintKind,
    pub columns: Vec<String>,
    /// Referenced table, foreign keys only
    pub foreign_table: Option<String>,
    pub foreign_columns: Vec<String>,
}

impl ConstraintDescriptor {
    pub fn primary_key(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::simple(name, ConstraintKind::PrimaryKey, columns)
    }

    pub fn unique(name: impl Into<String>, columns: &[&str]) -> Self {
        Self::simple(name, ConstraintKind::Unique, columns)
    }

    pub fn foreign_key(
        name: impl Into<String>,
        columns: &[&str],
        foreign_table: impl Into<String>,
        foreign_columns: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            kind: ConstraintKind::ForeignKey,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            foreign_table: Some(foreign_table.into()),
            foreign_columns: foreign_columns.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn simple(name: impl Into<String>, kind: ConstraintKind, columns: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            foreign_table: None,
            foreign_columns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub constraints: Vec<ConstraintDescriptor>,
}

impl TableDescriptor {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
        }
    }

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_constraint(mut self, constraint: ConstraintDescriptor) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Tables referenced by this table's foreign keys, excluding itself.
    pub fn referenced_tables(&self) -> Vec<String> {
        let mut refs: Vec<String> = Vec::new();
        for constraint in &self.constraints {
            if let Some(ref table) = constraint.foreign_table {
                if table != &self.name && !refs.contains(table) {
                    refs.push(table.clone());
                }
            }
        }
        refs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDescriptor {
    pub schema: String,
    pub table: String,
    pub name: String,
    /// `PERMISSIVE` or `RESTRICTIVE`, as reported by `pg_policies`
    pub permissive: String,
    pub roles: Vec<String>,
    /// `SELECT`, `INSERT`, `UPDATE`, `DELETE` or `ALL`
    pub command: String,
    pub using: Option<String>,
    pub with_check: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDescriptor {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionDescriptor {
    pub name: String,
    pub definition: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewDescriptor {
    pub name: String,
    /// `None` when the catalog hides the definition from the connected role
    pub definition: Option<String>,
}

/// Sample of a table's rows, as JSON objects from `row_to_json`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRows {
    pub schema: String,
    pub table: String,
    /// Columns in table order; their types decide how values are quoted
    pub columns: Vec<ColumnDescriptor>,
    pub rows: Vec<serde_json::Value>,
}
