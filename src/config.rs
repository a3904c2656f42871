//! Export configuration.
//!
//! Two layers feed an export run:
//!
//! - [`Credentials`]: the required Supabase values (`SUPABASE_URL`,
//!   `SUPABASE_SERVICE_KEY`, `DB_PASSWORD`), read from the process environment.
//!   Missing values are fatal and are reported before any connection attempt.
//! - [`ExportSettings`]: optional tool settings loaded from
//!   `config/export.toml` and `SUPABASE_EXPORT__*` environment variables.
//!
//! [`DbConfig`] is the resolved connection descriptor built from the project
//! ref found in the Supabase URL.

use config::{Config, Environment, File};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const SUPABASE_URL_VAR: &str = "SUPABASE_URL";
pub const SUPABASE_SERVICE_KEY_VAR: &str = "SUPABASE_SERVICE_KEY";
pub const DB_PASSWORD_VAR: &str = "DB_PASSWORD";

const SETTINGS_FILE: &str = "config/export.toml";
const SETTINGS_ENV_PREFIX: &str = "SUPABASE_EXPORT";

static SUPABASE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https://([^./]+)\.supabase\.co").expect("static regex"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Please set {} in the environment or .env file", .0.join(", "))]
    MissingVars(Vec<&'static str>),
    #[error("Invalid Supabase URL format: {0} (expected https://<project-ref>.supabase.co)")]
    InvalidSupabaseUrl(String),
    #[error("Failed to load export settings: {0}")]
    Settings(String),
}

/// Required values for connecting to a Supabase project.
#[derive(Clone)]
pub struct Credentials {
    pub supabase_url: String,
    pub service_key: String,
    pub db_password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("supabase_url", &self.supabase_url)
            .field("service_key", &"***")
            .field("db_password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read credentials through an arbitrary lookup; empty values count as missing.
    ///
    /// Every missing variable is reported at once so the user can fix the
    /// `.env` file in one go.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let supabase_url = read(SUPABASE_URL_VAR);
        let service_key = read(SUPABASE_SERVICE_KEY_VAR);
        let db_password = read(DB_PASSWORD_VAR);

        match (supabase_url, service_key, db_password) {
            (Some(supabase_url), Some(service_key), Some(db_password)) => Ok(Self {
                supabase_url,
                service_key,
                db_password,
            }),
            (url, key, password) => {
                let mut missing = Vec::new();
                if url.is_none() {
                    missing.push(SUPABASE_URL_VAR);
                }
                if key.is_none() {
                    missing.push(SUPABASE_SERVICE_KEY_VAR);
                }
                if password.is_none() {
                    missing.push(DB_PASSWORD_VAR);
                }
                Err(ConfigError::MissingVars(missing))
            }
        }
    }

    /// Project ref parsed out of the Supabase URL.
    pub fn project_ref(&self) -> Result<String, ConfigError> {
        parse_project_ref(&self.supabase_url)
    }

    /// Direct database connection descriptor for this project.
    pub fn db_config(&self) -> Result<DbConfig, ConfigError> {
        let project_ref = self.project_ref()?;
        Ok(DbConfig::for_project(&project_ref, &self.db_password))
    }
}

/// Extract the project ref from `https://<ref>.supabase.co`.
///
/// # Examples
///
/// ```
/// use supabase_export::config::parse_project_ref;
///
/// let project_ref = parse_project_ref("https://abcdefgh.supabase.co").unwrap();
/// assert_eq!(project_ref, "abcdefgh");
/// ```
pub fn parse_project_ref(url: &str) -> Result<String, ConfigError> {
    SUPABASE_URL_RE
        .captures(url.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ConfigError::InvalidSupabaseUrl(url.to_string()))
}

/// SSL negotiation for the export connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SslPreference {
    /// Require SSL, skip certificate and hostname validation.
    RequireUnverified,
    /// Plain TCP; used against local databases.
    Disable,
}

/// Resolved connection descriptor for one export run.
#[derive(Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
    pub ssl: SslPreference,
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"***")
            .field("ssl", &self.ssl)
            .finish()
    }
}

impl DbConfig {
    pub const DEFAULT_PORT: u16 = 5432;
    pub const DEFAULT_DATABASE: &'static str = "postgres";
    pub const DEFAULT_USER: &'static str = "postgres";

    /// Direct connection to `db.<project_ref>.supabase.co`.
    pub fn for_project(project_ref: &str, password: &str) -> Self {
        Self {
            host: format!("db.{}.supabase.co", project_ref),
            port: Self::DEFAULT_PORT,
            database: Self::DEFAULT_DATABASE.to_string(),
            user: Self::DEFAULT_USER.to_string(),
            password: password.to_string(),
            ssl: SslPreference::RequireUnverified,
        }
    }
}

/// Order of tables inside the aggregate `all_tables.sql`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableOrder {
    /// Alphabetical, as returned by the catalog.
    #[default]
    Name,
    /// Referenced tables before the tables pointing at them.
    Dependency,
}

impl std::str::FromStr for TableOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(TableOrder::Name),
            "dependency" => Ok(TableOrder::Dependency),
            other => Err(format!(
                "unknown table order '{}' (expected 'name' or 'dependency')",
                other
            )),
        }
    }
}

/// Optional tool settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ExportSettings {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_schema")]
    pub schema: String,
    #[serde(default)]
    pub table_order: TableOrder,
    #[serde(default)]
    pub include_data: bool,
    #[serde(default = "default_data_row_limit")]
    pub data_row_limit: u32,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            schema: default_schema(),
            table_order: TableOrder::default(),
            include_data: false,
            data_row_limit: default_data_row_limit(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("supabase_export")
}

fn default_schema() -> String {
    "public".to_string()
}

fn default_data_row_limit() -> u32 {
    1000
}

impl ExportSettings {
    /// Load settings from `config/export.toml`, overlaid with `SUPABASE_EXPORT__*` env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(SETTINGS_FILE).required(false))
            .add_source(Environment::with_prefix(SETTINGS_ENV_PREFIX).separator("__"));

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // An unreadable or malformed file should not block an export.
                if std::path::Path::new(SETTINGS_FILE).exists() {
                    log::warn!(
                        "Failed to load {}, falling back to env. Error: {}",
                        SETTINGS_FILE,
                        err
                    );
                }
                Config::builder()
                    .add_source(Environment::with_prefix(SETTINGS_ENV_PREFIX).separator("__"))
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Settings(format!(
                            "file error: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        settings
            .try_deserialize::<ExportSettings>()
            .map_err(|e| ConfigError::Settings(e.to_string()))
    }
}
