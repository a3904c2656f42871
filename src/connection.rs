//! Connection bootstrap.
//!
//! Opens the single `postgres::Client` used for a whole export run. Supabase
//! direct connections are made over SSL with certificate and hostname
//! validation disabled; there is no pooling and no retry.

use crate::config::{DbConfig, SslPreference};
use native_tls::TlsConnector;
use postgres::config::SslMode;
use postgres::error::SqlState;
use postgres::{Client, Config, Error as PostgresError};
use postgres_native_tls::MakeTlsConnector;
use std::time::Instant;
use thiserror::Error;

/// Connection error type
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The descriptor cannot be used (empty host, zero port, ...)
    #[error("Invalid connection configuration: {0}")]
    InvalidConfig(String),
    /// TLS connector could not be built
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),
    /// Network/authentication error from postgres
    #[error("PostgreSQL error: {0}")]
    Postgres(#[from] PostgresError),
}

impl ConnectionError {
    /// True when the server rejected the password (SQLSTATE 28P01).
    pub fn is_auth_failure(&self) -> bool {
        match self {
            ConnectionError::Postgres(e) => e.code() == Some(&SqlState::INVALID_PASSWORD),
            _ => false,
        }
    }
}

/// Validates a connection descriptor before any network I/O.
pub fn validate_db_config(config: &DbConfig) -> Result<(), ConnectionError> {
    if config.host.trim().is_empty() {
        return Err(ConnectionError::InvalidConfig(
            "host cannot be empty".to_string(),
        ));
    }
    if config.port == 0 {
        return Err(ConnectionError::InvalidConfig(
            "port must be non-zero".to_string(),
        ));
    }
    if config.database.trim().is_empty() || config.user.trim().is_empty() {
        return Err(ConnectionError::InvalidConfig(
            "database and user are required".to_string(),
        ));
    }
    Ok(())
}

/// Build the driver-level configuration from a descriptor.
pub fn pg_config(config: &DbConfig) -> Config {
    let mut pg = Config::new();
    pg.host(&config.host)
        .port(config.port)
        .dbname(&config.database)
        .user(&config.user)
        .password(&config.password)
        .application_name("supabase-export");

    match config.ssl {
        SslPreference::RequireUnverified => pg.ssl_mode(SslMode::Require),
        SslPreference::Disable => pg.ssl_mode(SslMode::Disable),
    };
    pg
}

/// Establishes the export connection.
///
/// This is a blocking call; the returned client is used by exactly one
/// caller for the rest of the run.
pub fn connect(config: &DbConfig) -> Result<Client, ConnectionError> {
    validate_db_config(config)?;

    let start = Instant::now();
    log::debug!(
        "Connecting to {}:{}/{} as {} ({:?})",
        config.host,
        config.port,
        config.database,
        config.user,
        config.ssl
    );

    let connector = TlsConnector::builder()
        .danger_accept_invalid_certs(true)
        .danger_accept_invalid_hostnames(true)
        .build()?;
    let client = pg_config(config).connect(MakeTlsConnector::new(connector))?;

    log::debug!("Connected in {:?}", start.elapsed());
    Ok(client)
}
