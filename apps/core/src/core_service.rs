use std::time::SystemTime;

use chrono::{Local, NaiveDate};

use crate::autocomplete::{suggest, Suggestion};
use crate::catalog::{self, Catalog, CatalogError};
use crate::config::{validate, Config, ConfigError};
use crate::due::{due_menu, extract_deadline, reschedule_menu, resolve_deadline, DueMenuEntry};
use crate::model::{DueStamp, Priority, Task};
use crate::query_dsl::{EscapeSubject, Fragment, FragmentKind, QueryError, QueryIntent};
use crate::search::{base_subset, filter_tasks, QueryMode, TaskFilter};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Parsed new-task line, ready for the creation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub content: String,
    pub labels: Vec<String>,
    pub project_id: Option<String>,
    pub project_path: String,
    pub section_id: Option<String>,
    pub due: Option<DueStamp>,
    /// `{...}` text as typed; `deadline` holds it when it is a coded date.
    pub deadline_raw: Option<String>,
    pub deadline: Option<NaiveDate>,
    pub priority: Priority,
    pub raw_input: String,
    /// Set when the draft rewrites an existing task.
    pub task_id: Option<String>,
}

/// Everything one invocation can answer with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutcome {
    Tasks {
        mode: QueryMode,
        tasks: Vec<Task>,
        total: usize,
        input: String,
        due: Option<DueStamp>,
        priority: Option<Priority>,
    },
    Autocomplete {
        mode: Option<QueryMode>,
        fragment: Fragment,
        suggestions: Vec<Suggestion>,
        remaining_input: String,
    },
    DueMenu {
        mode: Option<QueryMode>,
        entries: Vec<DueMenuEntry>,
    },
    /// The mode's base subset was empty and no filter was typed.
    NothingDue { mode: QueryMode },
    /// Filters were typed but matched no task.
    NoMatches { mode: QueryMode },
    MalformedEscape {
        mode: Option<QueryMode>,
        subject: EscapeSubject,
        token: String,
    },
    Draft(TaskDraft),
}

pub struct CoreService {
    config: Config,
    catalog: Catalog,
    today: NaiveDate,
}

impl CoreService {
    pub fn new(config: Config) -> Result<Self, ServiceError> {
        validate(&config).map_err(ConfigError::Invalid)?;
        let catalog = Catalog::load(&config.snapshot_path)?;
        if catalog::is_stale(&config.snapshot_path, config.refresh_days, SystemTime::now()) {
            log::warn!(
                "task snapshot {} (fetched {}) is older than {} day(s); waiting on refresh",
                config.snapshot_path.display(),
                catalog.fetched_at().unwrap_or("at an unknown time"),
                config.refresh_days
            );
        }
        Self::with_catalog(config, catalog)
    }

    pub fn with_catalog(config: Config, catalog: Catalog) -> Result<Self, ServiceError> {
        validate(&config).map_err(ConfigError::Invalid)?;
        Ok(Self {
            config,
            catalog,
            today: Local::now().date_naive(),
        })
    }

    /// Pins "today" instead of reading the wall clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    /// Parse → autocomplete | due menu | filtered task list.
    pub fn query(&self, mode: QueryMode, input: &str) -> QueryOutcome {
        let intent = match QueryIntent::parse(input, &self.catalog, self.today) {
            Ok(intent) => intent,
            Err(error) => return malformed(Some(mode), error),
        };
        log::debug!(
            "query mode={mode} tokens={} fragment={:?}",
            intent.tokens.len(),
            intent.fragment
        );

        let base = base_subset(self.catalog.active_tasks(), mode, self.today);
        let filter = TaskFilter::from_intent(&intent);
        let matched = filter_tasks(&base, &filter);

        if let Some(fragment) = &intent.fragment {
            let remaining = intent.remaining_input();
            return self.autocomplete(Some(mode), fragment, remaining, Some(matched.as_slice()));
        }

        if let Some(spec) = intent.unresolved_due() {
            let remaining = intent
                .due_token
                .map(|index| intent.input_without(index))
                .unwrap_or_else(|| intent.tokens.join(" "));
            return QueryOutcome::DueMenu {
                mode: Some(mode),
                entries: due_menu(spec, &remaining, self.today),
            };
        }

        if matched.is_empty() {
            return if intent.has_filters() {
                QueryOutcome::NoMatches { mode }
            } else {
                QueryOutcome::NothingDue { mode }
            };
        }

        let total = matched.len();
        QueryOutcome::Tasks {
            mode,
            tasks: matched
                .into_iter()
                .take(self.config.max_results as usize)
                .cloned()
                .collect(),
            total,
            input: input.trim().to_string(),
            due: intent.due.as_ref().and_then(|due| due.resolved()),
            priority: intent.priority,
        }
    }

    /// Parses a new-task line into a [`TaskDraft`], or asks for completion first.
    pub fn draft_task(&self, input: &str) -> QueryOutcome {
        self.draft(input, None)
    }

    /// Same parse as [`Self::draft_task`], for replacing task `task_id`.
    pub fn draft_edit(&self, task_id: &str, input: &str) -> QueryOutcome {
        self.draft(input, Some(task_id))
    }

    fn draft(&self, input: &str, task_id: Option<&str>) -> QueryOutcome {
        let (cleaned, deadline_raw) = extract_deadline(input);
        let intent = match QueryIntent::parse(&cleaned, &self.catalog, self.today) {
            Ok(intent) => intent,
            Err(error) => return malformed(None, error),
        };

        if let Some(fragment) = &intent.fragment {
            let remaining = with_deadline(intent.remaining_input(), deadline_raw.as_deref());
            return self.autocomplete(None, fragment, remaining, None);
        }

        if let Some(spec) = intent.unresolved_due() {
            let remaining = intent
                .due_token
                .map(|index| intent.input_without(index))
                .unwrap_or_else(|| intent.tokens.join(" "));
            let remaining = with_deadline(remaining, deadline_raw.as_deref());
            return QueryOutcome::DueMenu {
                mode: None,
                entries: due_menu(spec, &remaining, self.today),
            };
        }

        let target = intent.projects.last().cloned();
        let (project_id, section_id, project_path) = match (target, intent.project_path.clone()) {
            (Some(target), Some(path)) => (Some(target.project_id), target.section_id, path),
            _ => {
                let name = self.config.default_project.clone();
                let project_id = self.catalog.project_id(&name).map(str::to_string);
                if project_id.is_none() {
                    log::warn!("default project '{name}' is not in the snapshot");
                }
                (project_id, None, name)
            }
        };

        QueryOutcome::Draft(TaskDraft {
            content: intent.search_terms.join(" "),
            labels: intent.labels.clone(),
            project_id,
            project_path,
            section_id,
            due: intent.due.as_ref().and_then(|due| due.resolved()),
            deadline: deadline_raw
                .as_deref()
                .and_then(|raw| resolve_deadline(raw, self.today)),
            deadline_raw,
            priority: intent.priority.unwrap_or_default(),
            raw_input: input.trim().to_string(),
            task_id: task_id.map(str::to_string),
        })
    }

    pub fn reschedule_menu(&self, task_content: &str, spec: &str) -> Vec<DueMenuEntry> {
        reschedule_menu(spec, task_content, self.today)
    }

    /// Suggestions for `fragment`; counts come from `scope` when given,
    /// otherwise from the whole catalog.
    fn autocomplete(
        &self,
        mode: Option<QueryMode>,
        fragment: &Fragment,
        remaining_input: String,
        scope: Option<&[&Task]>,
    ) -> QueryOutcome {
        let table = match (fragment.kind, scope) {
            (FragmentKind::Label, Some(tasks)) => {
                self.catalog.label_counts_within(tasks.iter().copied())
            }
            (FragmentKind::Project, Some(tasks)) => {
                self.catalog.project_counts_within(tasks.iter().copied())
            }
            (FragmentKind::Label, None) => self.catalog.label_counts().clone(),
            (FragmentKind::Project, None) => self.catalog.project_counts().clone(),
        };

        let suggestions = suggest(&table, fragment, &remaining_input, self.config.match_anchor);
        log::debug!(
            "autocomplete fragment='{}' suggestions={}",
            fragment.text,
            suggestions.len()
        );
        QueryOutcome::Autocomplete {
            mode,
            fragment: fragment.clone(),
            suggestions,
            remaining_input,
        }
    }
}

/// Keeps typed `{deadline}` text in completed queries.
fn with_deadline(remaining: String, deadline_raw: Option<&str>) -> String {
    match deadline_raw {
        Some(raw) if remaining.trim().is_empty() => format!("{{{raw}}}"),
        Some(raw) => format!("{} {{{raw}}}", remaining.trim()),
        None => remaining,
    }
}

fn malformed(mode: Option<QueryMode>, error: QueryError) -> QueryOutcome {
    match error {
        QueryError::MalformedEscape { subject, token } => {
            log::info!("malformed {subject} escape in '{token}'");
            QueryOutcome::MalformedEscape {
                mode,
                subject,
                token,
            }
        }
    }
}
