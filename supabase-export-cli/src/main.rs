//! Supabase Schema Export CLI
//!
//! Reads credentials from the environment (or a `.env` file), connects to the
//! project's Postgres database and writes the schema export tree.
//!
//! Exit codes: `0` on success, `1` when the export could not run (missing
//! configuration, connection or write failure), `2` when it finished but one
//! or more catalog queries failed.

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::process;
use supabase_export::{
    connect, Credentials, ExportError, ExportOptions, ExportReport, ExportSettings, Exporter,
    PgCatalog, PostgresExecutor, SqlWriter, TableOrder,
};

#[derive(Parser, Debug)]
#[command(name = "supabase-export")]
#[command(about = "Export a Supabase database schema to organized SQL files")]
#[command(version = "0.1.0")]
struct Cli {
    /// Output directory (default: supabase_export)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Schema to export (default: public)
    #[arg(long)]
    schema: Option<String>,

    /// Table order in all_tables.sql: name or dependency
    #[arg(long)]
    table_order: Option<TableOrder>,

    /// Also export sample rows as INSERT statements
    #[arg(long)]
    with_data: bool,

    /// Maximum rows per table when exporting data
    #[arg(long)]
    data_row_limit: Option<u32>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Quiet output (errors only)
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Command-line flags win over file and env settings.
    fn apply_to(&self, mut settings: ExportSettings) -> ExportSettings {
        if let Some(dir) = &self.output_dir {
            settings.output_dir = dir.clone();
        }
        if let Some(schema) = &self.schema {
            settings.schema = schema.clone();
        }
        if let Some(order) = self.table_order {
            settings.table_order = order;
        }
        if self.with_data {
            settings.include_data = true;
        }
        if let Some(limit) = self.data_row_limit {
            settings.data_row_limit = limit;
        }
        settings
    }
}

fn main() {
    let cli = Cli::parse();

    let logger = build_logger(&cli, None);
    let max_level = logger.filter();
    if log::set_boxed_logger(Box::new(logger)).is_ok() {
        log::set_max_level(max_level);
    }

    match run(&cli) {
        Ok((settings, report)) => {
            if !cli.quiet {
                print_summary(&settings, &report);
            }
            if report.is_partial() {
                process::exit(2);
            }
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{} {:#}", "❌ Error:".red(), e);
            if let Some(hint) = e.downcast_ref::<ExportError>().and_then(ExportError::hint) {
                eprintln!("\n💡 {}", hint);
            }
            process::exit(1);
        }
    }
}

/// Load `.env` (or `env_file`) and build the logger afterwards, so a
/// `RUST_LOG` set there is honored.
fn build_logger(cli: &Cli, env_file: Option<&Path>) -> env_logger::Logger {
    match env_file {
        Some(path) => {
            let _ = dotenv::from_path(path);
        }
        None => {
            let _ = dotenv::dotenv();
        }
    }

    let default_filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .build()
}

fn run(cli: &Cli) -> anyhow::Result<(ExportSettings, ExportReport)> {
    let credentials = Credentials::from_env().map_err(ExportError::from)?;
    let db = credentials.db_config().map_err(ExportError::from)?;

    let settings = cli.apply_to(
        ExportSettings::load()
            .map_err(ExportError::from)
            .context("Failed to load export settings")?,
    );

    if !cli.quiet {
        println!("🚀 Starting Supabase schema export...");
        println!("   Database: {}", db.host);
        println!("   Schema:   {}", settings.schema);
        println!("   Output:   {}\n", settings.output_dir.display());
    }

    let client = connect(&db).map_err(ExportError::from)?;
    let catalog = PgCatalog::new(PostgresExecutor::new(client));

    let mut exporter = Exporter::new(
        catalog,
        SqlWriter::new(&settings.output_dir),
        ExportOptions::from_settings(&settings, db.host.clone()),
    );
    let result = exporter.run();

    if let Err(e) = exporter.into_catalog().close() {
        log::warn!("Failed to close database connection: {}", e);
    }

    let report = result?;
    Ok((settings, report))
}

fn print_summary(settings: &ExportSettings, report: &ExportReport) {
    if report.is_partial() {
        println!("\n{}", "⚠️  Export finished with errors".yellow().bold());
    } else {
        println!("\n{}", "✅ Export completed successfully!".green().bold());
    }

    println!("\n📁 Output: {}/", settings.output_dir.display());
    println!("   ├── schemas/          {} tables", report.tables);
    println!(
        "   ├── rls_policies/     {} policies on {} tables",
        report.policies, report.policy_tables
    );
    println!(
        "   ├── triggers/         {} triggers on {} tables",
        report.triggers, report.trigger_tables
    );
    println!("   ├── functions/        {} functions", report.functions);
    println!("   ├── views/            {} views", report.views);
    if settings.include_data {
        println!("   ├── data/             {} tables", report.data_tables);
    }
    println!("   └── complete_schema/  aggregate files + README.sql");

    if report.is_partial() {
        println!("\n{}", "Failed queries:".yellow());
        for failure in &report.failures {
            match &failure.object {
                Some(object) => println!(
                    "  ✗ {} ({}): {}",
                    failure.category.label(),
                    object,
                    failure.message
                ),
                None => println!("  ✗ {}: {}", failure.category.label(), failure.message),
            }
        }
    }
}
