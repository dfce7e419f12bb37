use std::fmt::{Display, Formatter};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::ProjectRef;
use crate::model::{normalize_for_search, DueStamp, Task};
use crate::query_dsl::QueryIntent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryMode {
    Today,
    #[serde(alias = "overdue")]
    Due,
    All,
}

impl QueryMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "today" => Some(Self::Today),
            "due" | "overdue" => Some(Self::Due),
            "all" => Some(Self::All),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Due => "due",
            Self::All => "all",
        }
    }
}

impl Display for QueryMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Label, project/section and substring constraints, all AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub labels: Vec<String>,
    pub projects: Vec<ProjectRef>,
    pub search_terms: Vec<String>,
}

impl TaskFilter {
    pub fn from_intent(intent: &QueryIntent) -> Self {
        Self {
            labels: intent.labels.clone(),
            projects: intent.projects.clone(),
            search_terms: intent.search_terms.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.projects.is_empty() && self.search_terms.is_empty()
    }

    pub fn matches(&self, task: &Task) -> bool {
        self.labels.iter().all(|label| task.has_label(label))
            && self.projects.iter().all(|target| matches_project(task, target))
            && matches_search(task, &self.search_terms)
    }
}

fn matches_project(task: &Task, target: &ProjectRef) -> bool {
    if task.project_id != target.project_id {
        return false;
    }
    match &target.section_id {
        Some(section_id) => task.section_id.as_deref() == Some(section_id.as_str()),
        None => true,
    }
}

fn matches_search(task: &Task, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let content = normalize_for_search(&task.content);
    terms
        .iter()
        .all(|term| content.contains(&normalize_for_search(term)))
}

/// Active tasks selected by `mode`, ordered by due date ascending.
pub fn base_subset<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    mode: QueryMode,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let mut selected: Vec<(DueStamp, &Task)> = tasks
        .into_iter()
        .filter(|task| !task.is_completed)
        .filter_map(|task| {
            let stamp = task.due_stamp();
            let keep = match (mode, stamp) {
                (QueryMode::Today, Some(stamp)) => stamp.date == today,
                (QueryMode::Due, Some(stamp)) => stamp.date < today,
                (QueryMode::All, _) => true,
                (_, None) => false,
            };
            keep.then(|| (stamp.unwrap_or(DueStamp::FAR_FUTURE), task))
        })
        .collect();

    selected.sort_by(|a, b| a.0.cmp(&b.0));
    selected.into_iter().map(|(_, task)| task).collect()
}

/// Stable filter: keeps the relative order of `base`.
pub fn filter_tasks<'a>(base: &[&'a Task], filter: &TaskFilter) -> Vec<&'a Task> {
    if filter.is_empty() {
        return base.to_vec();
    }
    base.iter()
        .copied()
        .filter(|task| filter.matches(task))
        .collect()
}

pub fn search<'a>(
    tasks: impl IntoIterator<Item = &'a Task>,
    mode: QueryMode,
    filter: &TaskFilter,
    today: NaiveDate,
) -> Vec<&'a Task> {
    let base = base_subset(tasks, mode, today);
    filter_tasks(&base, filter)
}
