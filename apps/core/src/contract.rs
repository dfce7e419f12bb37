use serde::{Deserialize, Serialize};

use crate::session::SessionContext;

pub const ICON_TODAY: &str = "icons/today.png";
pub const ICON_OVERDUE: &str = "icons/overdue.png";
pub const ICON_BULLET: &str = "icons/bullet.png";
pub const ICON_LABEL: &str = "icons/label.png";
pub const ICON_PROJECT: &str = "icons/project.png";
pub const ICON_WARNING: &str = "icons/warning.png";
pub const ICON_NEW_LABEL: &str = "icons/newLabel.png";
pub const ICON_NEW_TASK: &str = "icons/newTask.png";
pub const ICON_DONE: &str = "icons/done.png";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Icon {
    pub path: String,
}

/// One row of the launcher's result list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultItem {
    pub title: String,
    pub subtitle: String,
    pub arg: String,
    #[serde(default, skip_serializing_if = "SessionContext::is_empty")]
    pub variables: SessionContext,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
}

impl ResultItem {
    pub fn new(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            arg: String::new(),
            variables: SessionContext::default(),
            icon: None,
        }
    }

    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.arg = arg.into();
        self
    }

    pub fn with_icon(mut self, path: &str) -> Self {
        self.icon = Some(Icon {
            path: path.to_string(),
        });
        self
    }

    pub fn with_variables(mut self, variables: SessionContext) -> Self {
        self.variables = variables;
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScriptFilterOutput {
    pub items: Vec<ResultItem>,
}

impl ScriptFilterOutput {
    pub fn single(item: ResultItem) -> Self {
        Self { items: vec![item] }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
