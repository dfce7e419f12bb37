use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

use crate::model::{Label, Project, Section, Task};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("task snapshot not found at {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to read task snapshot {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("task snapshot {} is corrupt: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("task snapshot is inconsistent: {0}")]
    Inconsistent(String),
}

/// On-disk shape written by the sync collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub labels: Vec<Label>,
    #[serde(default)]
    pub fetched_at: Option<String>,
}

/// Name → count table that remembers insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrequencyTable {
    entries: Vec<(String, usize)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    fn ensure(&mut self, name: &str) -> usize {
        if let Some(position) = self.index.get(name) {
            return *position;
        }
        let position = self.entries.len();
        self.entries.push((name.to_string(), 0));
        self.index.insert(name.to_string(), position);
        position
    }

    fn bump(&mut self, name: &str) {
        let position = self.ensure(name);
        self.entries[position].1 += 1;
    }

    fn zeroed(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|(name, _)| (name.clone(), 0))
                .collect(),
            index: self.index.clone(),
        }
    }

    pub fn count(&self, name: &str) -> Option<usize> {
        self.index.get(name).map(|position| self.entries[*position].1)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A resolved `#project` or `#project/section` reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectRef {
    pub project_id: String,
    pub section_id: Option<String>,
}

/// Immutable point-in-time view of every task, project, section and label.
#[derive(Debug, Clone)]
pub struct Catalog {
    tasks: Vec<Task>,
    projects: Vec<Project>,
    sections: Vec<Section>,
    labels: Vec<Label>,
    fetched_at: Option<String>,
    label_counts: FrequencyTable,
    project_counts: FrequencyTable,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(CatalogError::Missing(path.to_path_buf()));
            }
            Err(source) => {
                return Err(CatalogError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let snapshot: Snapshot =
            serde_json::from_str(&raw).map_err(|source| CatalogError::Corrupt {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_snapshot(snapshot)?;
        log::debug!(
            "loaded snapshot path={} tasks={} projects={} labels={}",
            path.display(),
            catalog.tasks.len(),
            catalog.projects.len(),
            catalog.label_counts.len()
        );
        if catalog.project_counts.is_empty() {
            log::warn!("snapshot {} lists no active projects", path.display());
        }
        Ok(catalog)
    }

    pub fn from_snapshot(snapshot: Snapshot) -> Result<Self, CatalogError> {
        validate_snapshot(&snapshot)?;

        let Snapshot {
            tasks,
            projects,
            sections,
            labels,
            fetched_at,
        } = snapshot;

        let mut catalog = Self {
            tasks,
            projects,
            sections,
            labels,
            fetched_at,
            label_counts: FrequencyTable::default(),
            project_counts: FrequencyTable::default(),
        };
        catalog.label_counts = catalog.build_label_table();
        catalog.project_counts = catalog.build_project_table();
        Ok(catalog)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn active_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| !task.is_completed)
    }

    pub fn fetched_at(&self) -> Option<&str> {
        self.fetched_at.as_deref()
    }

    pub fn label_counts(&self) -> &FrequencyTable {
        &self.label_counts
    }

    pub fn project_counts(&self) -> &FrequencyTable {
        &self.project_counts
    }

    pub fn project_name(&self, project_id: &str) -> Option<&str> {
        self.projects
            .iter()
            .find(|project| project.id == project_id)
            .map(|project| project.name.as_str())
    }

    /// Resolves a project name, preferring active projects over archived ones.
    pub fn project_id(&self, name: &str) -> Option<&str> {
        let name = name.trim();
        let mut named = self.projects.iter().filter(|project| project.name == name);
        let first = named.clone().next();
        named
            .find(|project| project.is_active())
            .or(first)
            .map(|project| project.id.as_str())
    }

    pub fn section_id(&self, project_id: &str, name: &str) -> Option<&str> {
        let name = name.trim();
        self.sections
            .iter()
            .find(|section| section.project_id == project_id && section.name == name)
            .map(|section| section.id.as_str())
    }

    /// Resolves `Project` or `Project/Section`.
    ///
    /// The whole path is tried as a project name first, since names may
    /// contain `/`; then every `/` is tried as the project/section split.
    pub fn resolve_path(&self, path: &str) -> Option<ProjectRef> {
        if let Some(project_id) = self.project_id(path) {
            return Some(ProjectRef {
                project_id: project_id.to_string(),
                section_id: None,
            });
        }

        path.match_indices('/').find_map(|(split, _)| {
            let project_id = self.project_id(&path[..split])?;
            let section_id = self.section_id(project_id, &path[split + 1..])?;
            Some(ProjectRef {
                project_id: project_id.to_string(),
                section_id: Some(section_id.to_string()),
            })
        })
    }

    /// `Project` or `Project/Section` path under which a task is counted.
    pub fn task_path(&self, task: &Task) -> String {
        let project = self.project_name(&task.project_id).unwrap_or_default();
        let section = task.section_id.as_deref().and_then(|section_id| {
            self.sections
                .iter()
                .find(|section| section.id == section_id)
                .map(|section| section.name.as_str())
        });
        match section {
            Some(section) => format!("{project}/{section}"),
            None => project.to_string(),
        }
    }

    /// Label table restricted to `tasks`, keeping every catalog entry.
    pub fn label_counts_within<'a>(&self, tasks: impl IntoIterator<Item = &'a Task>) -> FrequencyTable {
        let mut table = self.label_counts.zeroed();
        for task in tasks {
            for label in &task.labels {
                table.bump(label);
            }
        }
        table
    }

    /// Project/section table restricted to `tasks`, keeping every catalog entry.
    pub fn project_counts_within<'a>(
        &self,
        tasks: impl IntoIterator<Item = &'a Task>,
    ) -> FrequencyTable {
        let mut table = self.project_counts.zeroed();
        for task in tasks {
            table.bump(&self.task_path(task));
        }
        table
    }

    fn build_label_table(&self) -> FrequencyTable {
        let mut table = FrequencyTable::default();
        for label in self.labels.iter().filter(|label| !label.is_deleted) {
            table.ensure(&label.name);
        }
        for task in self.active_tasks() {
            for label in &task.labels {
                table.bump(label);
            }
        }
        table
    }

    fn build_project_table(&self) -> FrequencyTable {
        let mut table = FrequencyTable::default();
        for project in self.projects.iter().filter(|project| project.is_active()) {
            table.ensure(&project.name);
            for section in self
                .sections
                .iter()
                .filter(|section| section.project_id == project.id)
            {
                table.ensure(&format!("{}/{}", project.name, section.name));
            }
        }
        for task in self.active_tasks() {
            table.bump(&self.task_path(task));
        }
        table
    }
}

fn validate_snapshot(snapshot: &Snapshot) -> Result<(), CatalogError> {
    for task in &snapshot.tasks {
        if !snapshot
            .projects
            .iter()
            .any(|project| project.id == task.project_id)
        {
            return Err(CatalogError::Inconsistent(format!(
                "task {} references unknown project {}",
                task.id, task.project_id
            )));
        }

        let Some(section_id) = task.section_id.as_deref() else {
            continue;
        };
        match snapshot
            .sections
            .iter()
            .find(|section| section.id == section_id)
        {
            Some(section) if section.project_id == task.project_id => {}
            Some(section) => {
                return Err(CatalogError::Inconsistent(format!(
                    "task {} is in section {} owned by project {}, not {}",
                    task.id, section.id, section.project_id, task.project_id
                )));
            }
            None => {
                return Err(CatalogError::Inconsistent(format!(
                    "task {} references unknown section {section_id}",
                    task.id
                )));
            }
        }
    }
    Ok(())
}

/// True when the snapshot is missing or older than `refresh_days`.
pub fn is_stale(path: &Path, refresh_days: u32, now: SystemTime) -> bool {
    let Ok(modified) = std::fs::metadata(path).and_then(|meta| meta.modified()) else {
        return true;
    };
    let max_age = Duration::from_secs(u64::from(refresh_days) * 86_400);
    now.duration_since(modified)
        .map(|age| age >= max_age)
        .unwrap_or(false)
}
