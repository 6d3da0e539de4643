pub mod commands;
pub mod query;
pub mod run;
pub mod serve;

pub use commands::{Cli, Commands};

use std::path::{Path, PathBuf};
use std::sync::Arc;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use crate::agents::AgentFile;
use crate::config::{self, AgentrailConfig};
use crate::db::Database;
use crate::engine::{build_manager, Manager};
use crate::errors::AgentrailError;

/// Load the config named by `--config` (defaults when absent) and apply `--db`.
pub async fn load_config(cli: &Cli) -> Result<AgentrailConfig, AgentrailError> {
    let mut config = match &cli.config {
        Some(path) => config::parse_config(&PathBuf::from(path)).await?,
        None => AgentrailConfig::default(),
    };
    if let Some(db) = &cli.db {
        config.database.path = db.clone();
    }
    Ok(config)
}

pub async fn open_manager(config: &AgentrailConfig) -> Result<Arc<Manager>, AgentrailError> {
    let db = Database::new(&config.database.path)?;
    build_manager(db, config).await
}

/// Split `key=value`. The value is taken as JSON when it parses, else as a plain string.
pub fn parse_param(raw: &str) -> Result<(String, Value), AgentrailError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| AgentrailError::InvalidArgument(format!("parameter '{}' is not key=value", raw)))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(AgentrailError::InvalidArgument(format!("parameter '{}' has an empty key", raw)));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

/// Parse RFC 3339, or a bare date at the start (or, with `end_of_day`, the end) of that UTC day.
pub fn parse_time(raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, AgentrailError> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Ok(t.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AgentrailError::InvalidArgument(format!("'{}' is not an RFC 3339 time or YYYY-MM-DD date", raw)))?;
    let naive = if end_of_day {
        date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    naive
        .map(|n| n.and_utc())
        .ok_or_else(|| AgentrailError::InvalidArgument(format!("'{}' is out of range", raw)))
}

pub async fn read_input_file(path: &str) -> Result<AgentFile, AgentrailError> {
    let content = tokio::fs::read_to_string(path).await?;
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string());
    let content_type = match Path::new(path).extension().and_then(|e| e.to_str()) {
        Some("md") => "text/markdown",
        Some("json") => "application/json",
        Some("yaml") | Some("yml") => "application/yaml",
        Some("rs") => "text/x-rust",
        _ => "text/plain",
    };
    Ok(AgentFile::new(&name, content, content_type))
}

/// Cancel `token` on Ctrl-C. The running step finishes; the next one is not started.
pub fn cancel_on_ctrl_c(token: tokio_util::sync::CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current step");
            token.cancel();
        }
    });
}
