use chrono::NaiveDate;

use crate::autocomplete::Suggestion;
use crate::catalog::Catalog;
use crate::config::TaskOpen;
use crate::contract::{
    ResultItem, ScriptFilterOutput, ICON_BULLET, ICON_DONE, ICON_LABEL, ICON_NEW_LABEL,
    ICON_NEW_TASK, ICON_OVERDUE, ICON_PROJECT, ICON_TODAY, ICON_WARNING,
};
use crate::core_service::{QueryOutcome, TaskDraft};
use crate::due::{day_word, days_between, resolve_reschedule, DueMenuEntry};
use crate::model::{DueStamp, Priority, Task};
use crate::query_dsl::{escape_name, EscapeSubject, Fragment, FragmentKind};
use crate::search::QueryMode;
use crate::session::{PendingAction, SessionContext};

/// Rendering inputs that do not change within one invocation.
pub struct Presenter<'a> {
    pub catalog: &'a Catalog,
    pub today: NaiveDate,
    pub task_open: TaskOpen,
}

impl Presenter<'_> {
    pub fn render(&self, outcome: &QueryOutcome) -> ScriptFilterOutput {
        match outcome {
            QueryOutcome::Tasks {
                mode,
                tasks,
                total,
                input,
                due,
                priority,
            } => ScriptFilterOutput {
                items: tasks
                    .iter()
                    .enumerate()
                    .map(|(index, task)| {
                        self.task_item(*mode, task, index + 1, *total, input, *due, *priority)
                    })
                    .collect(),
            },
            QueryOutcome::Autocomplete {
                mode,
                fragment,
                suggestions,
                remaining_input,
            } => {
                if suggestions.is_empty() {
                    ScriptFilterOutput::single(no_match_item(*mode, fragment, remaining_input))
                } else {
                    ScriptFilterOutput {
                        items: suggestions
                            .iter()
                            .map(|suggestion| suggestion_item(*mode, suggestion, remaining_input))
                            .collect(),
                    }
                }
            }
            QueryOutcome::DueMenu { mode, entries } => ScriptFilterOutput {
                items: entries
                    .iter()
                    .map(|entry| due_menu_item(*mode, entry))
                    .collect(),
            },
            QueryOutcome::NothingDue { mode } => ScriptFilterOutput::single(
                ResultItem::new(nothing_due_title(*mode), "")
                    .with_icon(ICON_DONE)
                    .with_variables(SessionContext::for_mode(*mode)),
            ),
            QueryOutcome::NoMatches { mode } => ScriptFilterOutput::single(
                ResultItem::new("no tasks matching your query 🙁", "try another query?")
                    .with_icon(ICON_WARNING)
                    .with_variables(SessionContext::iterate(Some(*mode), "")),
            ),
            QueryOutcome::MalformedEscape {
                mode,
                subject,
                token,
            } => ScriptFilterOutput::single(malformed_item(*mode, *subject, token)),
            QueryOutcome::Draft(draft) => ScriptFilterOutput::single(draft_item(draft)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn task_item(
        &self,
        mode: QueryMode,
        task: &Task,
        position: usize,
        total: usize,
        input: &str,
        due: Option<DueStamp>,
        priority: Option<Priority>,
    ) -> ResultItem {
        let project = self.catalog.project_name(&task.project_id).unwrap_or_default();
        let relative = task
            .due_stamp()
            .map(|stamp| relative_due(self.today, stamp.date))
            .unwrap_or_default();
        let title = format!("{} (#{project}) {relative}", task.content)
            .trim_end()
            .to_string();

        let labels = if task.labels.is_empty() {
            String::new()
        } else {
            format!(" 🏷️ {}", task.labels.join(","))
        };
        let subtitle = format!("{position}/{total}.{labels}");

        let task_url = match self.task_open {
            TaskOpen::App => format!("todoist://task?id={}", task.id),
            TaskOpen::Browser => format!("https://app.todoist.com/app/task/{}", task.id),
        };

        ResultItem::new(title, subtitle)
            .with_arg(task.id.clone())
            .with_icon(mode_icon(mode))
            .with_variables(SessionContext {
                mode: Some(mode),
                query: Some(input.to_string()),
                action: Some(PendingAction::OpenTask),
                task_id: Some(task.id.clone()),
                task_content: Some(task.content.clone()),
                task_url: Some(task_url),
                due: due.map(|stamp| stamp.to_api_string()),
                priority: priority.map(Priority::api_level),
                ..SessionContext::default()
            })
    }
}

/// Rendering for callers that only have menu entries, such as rescheduling.
pub fn render_reschedule_menu(
    task_id: Option<&str>,
    entries: &[DueMenuEntry],
    today: NaiveDate,
) -> ScriptFilterOutput {
    ScriptFilterOutput {
        items: entries
            .iter()
            .map(|entry| {
                let actionable = !entry.argument.is_empty();
                let icon = if actionable { ICON_TODAY } else { ICON_WARNING };
                let variables = if actionable {
                    SessionContext {
                        action: Some(PendingAction::Reschedule),
                        task_id: task_id.map(str::to_string),
                        due: resolve_reschedule(&entry.argument, today),
                        ..SessionContext::default()
                    }
                } else {
                    SessionContext::default()
                };
                ResultItem::new(entry.title.clone(), entry.subtitle.clone())
                    .with_arg(entry.argument.clone())
                    .with_icon(icon)
                    .with_variables(variables)
            })
            .collect(),
    }
}

/// Pins every item of an edit flow to the task being edited.
pub fn attach_task_id(mut output: ScriptFilterOutput, task_id: &str) -> ScriptFilterOutput {
    for item in &mut output.items {
        if item.variables.task_id.is_none() {
            item.variables.task_id = Some(task_id.to_string());
        }
    }
    output
}

fn mode_icon(mode: QueryMode) -> &'static str {
    match mode {
        QueryMode::Today => ICON_TODAY,
        QueryMode::Due => ICON_OVERDUE,
        QueryMode::All => ICON_BULLET,
    }
}

fn nothing_due_title(mode: QueryMode) -> &'static str {
    match mode {
        QueryMode::Today => "no tasks left to do today! 🙌",
        QueryMode::Due => "nothing overdue! 🙌",
        QueryMode::All => "no tasks left to do! 🙌",
    }
}

pub fn relative_due(today: NaiveDate, due: NaiveDate) -> String {
    let distance = days_between(today, due);
    match distance {
        0 => "DUE TODAY".to_string(),
        d if d > 0 => format!("due in {d} {}", day_word(d)),
        d => format!("{} {} overdue", -d, day_word(d)),
    }
}

fn suggestion_item(mode: Option<QueryMode>, suggestion: &Suggestion, remaining: &str) -> ResultItem {
    let icon = match suggestion.kind {
        FragmentKind::Label => ICON_LABEL,
        FragmentKind::Project => ICON_PROJECT,
    };
    ResultItem::new(suggestion.title(), remaining)
        .with_arg(suggestion.query.clone())
        .with_icon(icon)
        .with_variables(SessionContext::iterate(mode, suggestion.query.clone()))
}

fn no_match_item(mode: Option<QueryMode>, fragment: &Fragment, remaining: &str) -> ResultItem {
    let query = if remaining.trim().is_empty() {
        String::new()
    } else {
        format!("{} ", remaining.trim())
    };

    match fragment.kind {
        FragmentKind::Label => {
            let with_label = format!("{query}{} ", escape_name('@', &fragment.text));
            ResultItem::new(
                format!(
                    "no labels matching, create a new label named '{}'?",
                    fragment.text
                ),
                "press Enter to create a new label",
            )
            .with_arg(with_label.clone())
            .with_icon(ICON_NEW_LABEL)
            .with_variables(SessionContext {
                action: Some(PendingAction::CreateLabel),
                new_label: Some(fragment.text.clone()),
                ..SessionContext::iterate(mode, with_label)
            })
        }
        FragmentKind::Project => ResultItem::new("no projects matching", "try another query?")
            .with_arg(query.clone())
            .with_icon(ICON_WARNING)
            .with_variables(SessionContext::iterate(mode, query)),
    }
}

fn due_menu_item(mode: Option<QueryMode>, entry: &DueMenuEntry) -> ResultItem {
    ResultItem::new(entry.title.clone(), entry.subtitle.clone())
        .with_arg(entry.argument.clone())
        .with_icon(ICON_TODAY)
        .with_variables(SessionContext::iterate(mode, entry.argument.clone()))
}

fn malformed_item(mode: Option<QueryMode>, subject: EscapeSubject, token: &str) -> ResultItem {
    ResultItem::new(
        format!("something is wrong with this {subject} name"),
        format!("check the parentheses in '{token}'"),
    )
    .with_icon(ICON_WARNING)
    .with_variables(SessionContext {
        mode,
        ..SessionContext::default()
    })
}

fn draft_item(draft: &TaskDraft) -> ResultItem {
    let mut parts = vec![format!("📋#{}", draft.project_path)];
    if !draft.labels.is_empty() {
        parts.push(format!("🏷️{}", draft.labels.join(",")));
    }
    if draft.priority != Priority::lowest() {
        parts.push(draft.priority.token());
    }
    if let Some(due) = draft.due {
        parts.push(format!("🗓️ due:{due}"));
    }
    let deadline = draft
        .deadline
        .map(|date| date.format("%Y-%m-%d").to_string())
        .or_else(|| draft.deadline_raw.clone());
    if let Some(deadline) = &deadline {
        parts.push(format!("⏰ deadline:{deadline}"));
    }
    let action = match draft.task_id {
        Some(_) => {
            parts.push("⇧↩️ to edit".to_string());
            PendingAction::EditTask
        }
        None => {
            parts.push("⇧↩️ to create".to_string());
            PendingAction::CreateTask
        }
    };

    ResultItem::new(draft.content.clone(), parts.join(" "))
        .with_arg(draft.raw_input.clone())
        .with_icon(ICON_NEW_TASK)
        .with_variables(SessionContext {
            action: Some(action),
            task_id: draft.task_id.clone(),
            task_content: Some(draft.content.clone()),
            project_id: draft.project_id.clone(),
            section_id: draft.section_id.clone(),
            labels: draft.labels.clone(),
            due: draft.due.map(|stamp| stamp.to_api_string()),
            deadline,
            priority: Some(draft.priority.api_level()),
            ..SessionContext::default()
        })
}
