//! Top-level error type for an export run.

use crate::config::ConfigError;
use crate::connection::ConnectionError;
use crate::writer::WriteError;
use thiserror::Error;

/// Errors that end an export run.
///
/// Individual catalog query failures are not here: they are contained by the
/// exporter and reported through [`crate::export::ExportReport`].
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error(transparent)]
    Write(#[from] WriteError),
}

impl ExportError {
    /// Hint printed alongside the error, if any.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            ExportError::Connection(e) if e.is_auth_failure() => Some(
                "Make sure you have added DB_PASSWORD to your .env file\n\
                 Get it from: Supabase Dashboard > Settings > Database > Connection string",
            ),
            ExportError::Config(ConfigError::MissingVars(_)) => {
                Some("Copy the values from Supabase Dashboard > Settings > API and Settings > Database")
            }
            _ => None,
        }
    }
}
