use serde::{Deserialize, Serialize};

use crate::search::QueryMode;

/// Downstream step a result item asks the launcher to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    CreateLabel,
    CreateTask,
    EditTask,
    OpenTask,
    Reschedule,
}

/// Selections carried from one launcher invocation to the next.
///
/// Serialized as each result item's `variables` bag and handed back through
/// `--session` on the following keystroke.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<QueryMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub iterate: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<PendingAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section_id: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
}

impl SessionContext {
    pub fn for_mode(mode: QueryMode) -> Self {
        Self {
            mode: Some(mode),
            ..Self::default()
        }
    }

    /// Context that re-runs the query with `query` as the new input.
    pub fn iterate(mode: Option<QueryMode>, query: impl Into<String>) -> Self {
        Self {
            mode,
            query: Some(query.into()),
            iterate: true,
            ..Self::default()
        }
    }

    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(raw)
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
