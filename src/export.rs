//! Export orchestration.
//!
//! [`Exporter`] runs the extraction steps in a fixed order against one
//! [`Catalog`]:
//!
//! 1. tables (with per-table constraints)
//! 2. RLS policies
//! 3. triggers
//! 4. functions
//! 5. views
//! 6. table data, when enabled
//!
//! and finishes with the master index. A failing catalog query is logged,
//! recorded in the [`ExportReport`] and treated as an empty result, so one
//! broken query never stops the other steps. Write failures end the run.

use crate::catalog::Catalog;
use crate::config::{ExportSettings, TableOrder};
use crate::descriptor::{
    FunctionDescriptor, PolicyDescriptor, TableDescriptor, TriggerDescriptor,
};
use crate::error::ExportError;
use crate::executor::QueryError;
use crate::ordering::order_by_dependency;
use crate::render::{self, aggregate_header, format_timestamp};
use crate::writer::{Category, SqlWriter};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;

/// What to export and how; built from [`ExportSettings`] plus the connection host.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub schema: String,
    pub table_order: TableOrder,
    pub include_data: bool,
    pub data_row_limit: u32,
    /// Shown on `-- Database:` lines
    pub database: String,
}

impl ExportOptions {
    pub fn new(schema: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            table_order: TableOrder::Name,
            include_data: false,
            data_row_limit: 1000,
            database: database.into(),
        }
    }

    pub fn from_settings(settings: &ExportSettings, database: impl Into<String>) -> Self {
        Self {
            schema: settings.schema.clone(),
            table_order: settings.table_order,
            include_data: settings.include_data,
            data_row_limit: settings.data_row_limit,
            database: database.into(),
        }
    }
}

/// A catalog query that failed and was treated as empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryFailure {
    pub category: Category,
    /// Table the query was about, for per-table queries
    pub object: Option<String>,
    pub message: String,
}

/// Counts and contained failures of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub tables: usize,
    pub policy_tables: usize,
    pub policies: usize,
    pub trigger_tables: usize,
    pub triggers: usize,
    pub functions: usize,
    pub views: usize,
    pub data_tables: usize,
    pub failures: Vec<QueryFailure>,
}

impl ExportReport {
    /// True when at least one query failed and its section may be incomplete.
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

pub struct Exporter<C: Catalog> {
    catalog: C,
    writer: SqlWriter,
    options: ExportOptions,
    generated_at: String,
    report: ExportReport,
}

impl<C: Catalog> Exporter<C> {
    /// Stamps the run with the current time; every `Generated:` line uses it.
    pub fn new(catalog: C, writer: SqlWriter, options: ExportOptions) -> Self {
        Self {
            catalog,
            writer,
            options,
            generated_at: format_timestamp(Utc::now()),
            report: ExportReport::default(),
        }
    }

    /// Override the run timestamp.
    pub fn generated_at(mut self, at: DateTime<Utc>) -> Self {
        self.generated_at = format_timestamp(at);
        self
    }

    /// Give the catalog back so the caller can close its connection.
    pub fn into_catalog(self) -> C {
        self.catalog
    }

    /// Run every step and write the master index.
    pub fn run(&mut self) -> Result<ExportReport, ExportError> {
        self.report = ExportReport::default();
        self.writer.prepare()?;

        let tables = self.export_tables()?;
        self.export_policies()?;
        self.export_triggers()?;
        self.export_functions()?;
        self.export_views()?;
        if self.options.include_data {
            self.export_data(&tables)?;
        }

        log::info!("📝 Creating master schema file...");
        let index = render::render_master_index(
            &self.generated_at,
            &self.options.database,
            self.options.include_data,
        );
        self.writer.write_master_index(&index)?;

        Ok(self.report.clone())
    }

    /// Run one catalog query; on failure log it, record it, and yield `None`.
    fn contain<T>(
        &mut self,
        category: Category,
        object: Option<&str>,
        query: impl FnOnce(&mut C, &str) -> Result<T, QueryError>,
    ) -> Option<T> {
        match query(&mut self.catalog, &self.options.schema) {
            Ok(value) => Some(value),
            Err(e) => {
                match object {
                    Some(name) => log::error!("Query error ({} for {}): {}", category.label(), name, e),
                    None => log::error!("Query error ({}): {}", category.label(), e),
                }
                self.report.failures.push(QueryFailure {
                    category,
                    object: object.map(str::to_string),
                    message: e.to_string(),
                });
                None
            }
        }
    }

    fn aggregate_header(&self, category: Category) -> String {
        let database = match category {
            Category::Tables => Some(self.options.database.as_str()),
            _ => None,
        };
        aggregate_header(category.aggregate_title(), &self.generated_at, database)
    }

    fn export_tables(&mut self) -> Result<Vec<TableDescriptor>, ExportError> {
        log::info!("📋 Exporting table schemas...");

        let mut tables = self
            .contain(Category::Tables, None, |c, schema| c.tables(schema))
            .unwrap_or_default();

        for table in &mut tables {
            let name = table.name.clone();
            table.constraints = self
                .contain(Category::Tables, Some(&name), |c, schema| {
                    c.constraints(schema, &name)
                })
                .unwrap_or_default();
        }

        let mut rendered: Vec<(String, String)> = Vec::with_capacity(tables.len());
        for table in &tables {
            let sql = render::render_table_file(table, &self.generated_at);
            self.writer.write_object(Category::Tables, &table.name, &sql)?;
            rendered.push((table.name.clone(), sql));
        }

        let mut complete = self.aggregate_header(Category::Tables);
        match self.options.table_order {
            TableOrder::Name => {
                for (_, sql) in &rendered {
                    complete.push_str(sql);
                }
            }
            TableOrder::Dependency => {
                let by_name: IndexMap<&str, &str> = rendered
                    .iter()
                    .map(|(name, sql)| (name.as_str(), sql.as_str()))
                    .collect();
                for table in order_by_dependency(&tables) {
                    if let Some(sql) = by_name.get(table.name.as_str()) {
                        complete.push_str(sql);
                    }
                }
            }
        }
        self.writer.write_aggregate(Category::Tables, &complete)?;

        self.report.tables = tables.len();
        if tables.is_empty() {
            log::info!("ℹ No tables found");
        } else {
            log::info!("✓ Exported {} table schemas", tables.len());
        }
        Ok(tables)
    }

    fn export_policies(&mut self) -> Result<(), ExportError> {
        log::info!("🔒 Exporting RLS policies...");

        let policies = self
            .contain(Category::Policies, None, |c, schema| c.policies(schema))
            .unwrap_or_default();
        let total = policies.len();
        let grouped = group_by(policies, |p: &PolicyDescriptor| p.table.clone());

        let mut complete = self.aggregate_header(Category::Policies);
        for (table, table_policies) in &grouped {
            let schema = table_policies
                .first()
                .map(|p| p.schema.as_str())
                .unwrap_or(self.options.schema.as_str());
            let sql = render::render_policy_file(schema, table, table_policies, &self.generated_at);
            self.writer.write_object(Category::Policies, table, &sql)?;
            complete.push_str(&sql);
        }
        self.writer.write_aggregate(Category::Policies, &complete)?;

        self.report.policies = total;
        self.report.policy_tables = grouped.len();
        if grouped.is_empty() {
            log::info!("ℹ No RLS policies found");
        } else {
            log::info!("✓ Exported RLS policies for {} tables", grouped.len());
        }
        Ok(())
    }

    fn export_triggers(&mut self) -> Result<(), ExportError> {
        log::info!("⚡ Exporting triggers...");

        let triggers = self
            .contain(Category::Triggers, None, |c, schema| c.triggers(schema))
            .unwrap_or_default();
        let total = triggers.len();
        let grouped = group_by(triggers, |t: &TriggerDescriptor| t.table.clone());

        let mut complete = self.aggregate_header(Category::Triggers);
        for (table, table_triggers) in &grouped {
            let sql = render::render_trigger_file(table, table_triggers, &self.generated_at);
            self.writer.write_object(Category::Triggers, table, &sql)?;
            complete.push_str(&sql);
        }
        self.writer.write_aggregate(Category::Triggers, &complete)?;

        self.report.triggers = total;
        self.report.trigger_tables = grouped.len();
        if grouped.is_empty() {
            log::info!("ℹ No triggers found");
        } else {
            log::info!("✓ Exported triggers for {} tables", grouped.len());
        }
        Ok(())
    }

    fn export_functions(&mut self) -> Result<(), ExportError> {
        log::info!("⚙️  Exporting functions...");

        let functions = self
            .contain(Category::Functions, None, |c, schema| c.functions(schema))
            .unwrap_or_default();
        let total = functions.len();
        let grouped = group_by(functions, |f: &FunctionDescriptor| f.name.clone());

        let mut complete = self.aggregate_header(Category::Functions);
        for (name, overloads) in &grouped {
            let sql = render::render_function_file(name, overloads, &self.generated_at);
            self.writer.write_object(Category::Functions, name, &sql)?;
            complete.push_str(&sql);
        }
        self.writer.write_aggregate(Category::Functions, &complete)?;

        self.report.functions = total;
        if total == 0 {
            log::info!("ℹ No functions found");
        } else {
            log::info!("✓ Exported {} functions", total);
        }
        Ok(())
    }

    fn export_views(&mut self) -> Result<(), ExportError> {
        log::info!("👁️  Exporting views...");

        let views = self
            .contain(Category::Views, None, |c, schema| c.views(schema))
            .unwrap_or_default();

        let mut complete = self.aggregate_header(Category::Views);
        for view in &views {
            if view.definition.is_none() {
                log::warn!("View {} has no visible definition", view.name);
            }
            let sql = render::render_view_file(&self.options.schema, view, &self.generated_at);
            self.writer.write_object(Category::Views, &view.name, &sql)?;
            complete.push_str(&sql);
        }
        self.writer.write_aggregate(Category::Views, &complete)?;

        self.report.views = views.len();
        if views.is_empty() {
            log::info!("ℹ No views found");
        } else {
            log::info!("✓ Exported {} views", views.len());
        }
        Ok(())
    }

    fn export_data(&mut self, tables: &[TableDescriptor]) -> Result<(), ExportError> {
        log::info!(
            "📦 Exporting table data (up to {} rows per table)...",
            self.options.data_row_limit
        );

        let limit = self.options.data_row_limit;
        let mut complete = self.aggregate_header(Category::Data);
        let mut exported = 0;
        for table in tables {
            let Some(rows) = self.contain(Category::Data, Some(&table.name), |c, schema| {
                c.table_rows(schema, table, limit)
            }) else {
                continue;
            };

            let sql = render::render_data_file(&rows, &self.generated_at);
            self.writer.write_object(Category::Data, &table.name, &sql)?;
            complete.push_str(&sql);
            exported += 1;
        }
        self.writer.write_aggregate(Category::Data, &complete)?;

        self.report.data_tables = exported;
        if exported == 0 {
            log::info!("ℹ No table data exported");
        } else {
            log::info!("✓ Exported data for {} tables", exported);
        }
        Ok(())
    }
}

/// Group items by key, keeping first-seen key order and item order within a group.
pub fn group_by<T, F>(items: Vec<T>, key: F) -> IndexMap<String, Vec<T>>
where
    F: Fn(&T) -> String,
{
    let mut grouped: IndexMap<String, Vec<T>> = IndexMap::new();
    for item in items {
        grouped.entry(key(&item)).or_default().push(item);
    }
    grouped
}
