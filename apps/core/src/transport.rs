use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, CatalogError, FrequencyTable};
use crate::config::ConfigError;
use crate::contract::{ResultItem, ScriptFilterOutput, ICON_WARNING};
use crate::core_service::ServiceError;

const FALLBACK_JSON: &str = r#"{"items":[{"title":"failed to render results","subtitle":"","arg":""}]}"#;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Config,
    MissingSnapshot,
    CorruptSnapshot,
    InvalidSession,
    MissingTaskId,
}

impl ErrorCode {
    fn title(self) -> &'static str {
        match self {
            Self::Config => "tasklens is misconfigured",
            Self::MissingSnapshot => "no task snapshot yet, refresh to fetch tasks",
            Self::CorruptSnapshot => "the task snapshot could not be read",
            Self::InvalidSession => "could not read the previous step's variables",
            Self::MissingTaskId => "no task selected to edit",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CountsResponse {
    pub labels: Vec<CountEntry>,
    pub projects: Vec<CountEntry>,
}

pub fn output_json(output: &ScriptFilterOutput) -> String {
    output.to_json().unwrap_or_else(|error| {
        log::error!("failed to serialize script filter output: {error}");
        FALLBACK_JSON.to_string()
    })
}

pub fn error_output(code: ErrorCode, message: impl Into<String>) -> ScriptFilterOutput {
    ScriptFilterOutput::single(ResultItem::new(code.title(), message).with_icon(ICON_WARNING))
}

pub fn service_error_output(error: &ServiceError) -> ScriptFilterOutput {
    error_output(map_service_error(error), error.to_string())
}

pub fn counts_json(catalog: &Catalog) -> String {
    let response = CountsResponse {
        labels: count_entries(catalog.label_counts()),
        projects: count_entries(catalog.project_counts()),
    };
    serde_json::to_string(&response).unwrap_or_else(|error| {
        log::error!("failed to serialize counts: {error}");
        r#"{"labels":[],"projects":[]}"#.to_string()
    })
}

fn count_entries(table: &FrequencyTable) -> Vec<CountEntry> {
    table
        .iter()
        .map(|(name, count)| CountEntry {
            name: name.to_string(),
            count,
        })
        .collect()
}

fn map_service_error(error: &ServiceError) -> ErrorCode {
    match error {
        ServiceError::Config(ConfigError::Io { .. })
        | ServiceError::Config(ConfigError::Parse { .. })
        | ServiceError::Config(ConfigError::InvalidEnv { .. })
        | ServiceError::Config(ConfigError::Invalid(_)) => ErrorCode::Config,
        ServiceError::Catalog(CatalogError::Missing(_)) => ErrorCode::MissingSnapshot,
        ServiceError::Catalog(_) => ErrorCode::CorruptSnapshot,
    }
}
