//! # supabase-export
//!
//! Dumps the structure of a Supabase Postgres schema into organized SQL files:
//! tables and constraints, RLS policies, triggers, functions and views, each
//! per object and as aggregate files, plus a master index listing the apply
//! order. Sample table data can be exported as `INSERT` statements.
//!
//! ```no_run
//! use supabase_export::{connect, Credentials, ExportOptions, Exporter, PgCatalog, PostgresExecutor, SqlWriter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Credentials::from_env()?.db_config()?;
//! let client = connect(&db)?;
//! let catalog = PgCatalog::new(PostgresExecutor::new(client));
//!
//! let mut exporter = Exporter::new(
//!     catalog,
//!     SqlWriter::new("supabase_export"),
//!     ExportOptions::new("public", db.host.clone()),
//! );
//! let report = exporter.run()?;
//! exporter.into_catalog().close()?;
//! println!("{} tables exported", report.tables);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod config;
pub mod connection;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod export;
pub mod ordering;
pub mod render;
pub mod writer;

pub use catalog::{Catalog, PgCatalog};
pub use config::{ConfigError, Credentials, DbConfig, ExportSettings, SslPreference, TableOrder};
pub use connection::{connect, ConnectionError};
pub use error::ExportError;
pub use executor::{Executor, PostgresExecutor, QueryError};
pub use export::{ExportOptions, ExportReport, Exporter, QueryFailure};
pub use writer::{Category, SqlWriter, WriteError};
