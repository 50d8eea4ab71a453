use anyhow::Result as _Result;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Config Error: {message}")]
    Config { message: String },

    #[error("Credentials Error ({path}): {message}")]
    Credentials { path: PathBuf, message: String },

    #[error("Connection Error: {0}")]
    Connection(#[source] mongodb::error::Error),

    #[error("Query Error: {0}")]
    Query(#[from] mongodb::error::Error),

    #[error("Missing version record: workspace {ws_id}, object {obj_id}, version {version}")]
    MissingVersion { ws_id: i64, obj_id: i64, version: i64 },

    #[error(
        "Malformed type string {type_string:?}: workspace {ws_id}, object {obj_id}, version {version}"
    )]
    MalformedType {
        ws_id: i64,
        obj_id: i64,
        version: i64,
        type_string: String,
    },

    #[error("IO Error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON Error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StatsError {
    pub fn config(message: impl Into<String>) -> Self {
        StatsError::Config {
            message: message.into(),
        }
    }

    /// Errors that mean the store contradicts itself, as opposed to setup failures.
    pub fn is_consistency_error(&self) -> bool {
        matches!(
            self,
            StatsError::MissingVersion { .. } | StatsError::MalformedType { .. }
        )
    }

    pub fn display_localized(&self) -> String {
        match self {
            StatsError::Config { message } => {
                t!("errors.config_error", message = message).to_string()
            }
            StatsError::Credentials { path, message } => t!(
                "errors.credentials_error",
                path = path.display(),
                message = message
            )
            .to_string(),
            StatsError::Connection(e) => t!("errors.connection_error", error = e).to_string(),
            StatsError::MissingVersion {
                ws_id,
                obj_id,
                version,
            } => t!(
                "errors.missing_version",
                ws = ws_id,
                obj = obj_id,
                ver = version
            )
            .to_string(),
            StatsError::MalformedType {
                ws_id,
                obj_id,
                version,
                type_string,
            } => t!(
                "errors.malformed_type",
                type_string = type_string,
                ws = ws_id,
                obj = obj_id,
                ver = version
            )
            .to_string(),
            _ => self.to_string(),
        }
    }
}

pub type Result<T> = _Result<T, StatsError>;
