use chrono::NaiveDate;
use tasklens_core::catalog::{Catalog, Snapshot};
use tasklens_core::config::{Config, TaskOpen};
use tasklens_core::contract::{ICON_NEW_LABEL, ICON_NEW_TASK, ICON_OVERDUE, ICON_WARNING};
use tasklens_core::core_service::CoreService;
use tasklens_core::due::reschedule_menu;
use tasklens_core::presenter::{attach_task_id, relative_due, render_reschedule_menu, Presenter};
use tasklens_core::search::QueryMode;
use tasklens_core::session::PendingAction;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
}

fn catalog() -> Catalog {
    let snapshot: Snapshot = serde_json::from_str(
        r#"{
          "projects": [{"id": "p1", "name": "Inbox"}, {"id": "p2", "name": "Work"}],
          "labels": [{"name": "urgent"}, {"name": "home"}],
          "tasks": [
            {"id": "42", "content": "Write report", "labels": ["urgent", "home"], "project_id": "p2", "due": {"date": "2024-12-30"}},
            {"id": "43", "content": "Fix bug", "project_id": "p2", "due": {"date": "2024-12-31"}}
          ]
        }"#,
    )
    .unwrap();
    Catalog::from_snapshot(snapshot).unwrap()
}

fn service(task_open: TaskOpen) -> CoreService {
    let config = Config {
        task_open,
        ..Config::default()
    };
    CoreService::with_catalog(config, catalog())
        .unwrap()
        .with_today(today())
}

fn presenter(service: &CoreService) -> Presenter<'_> {
    Presenter {
        catalog: service.catalog(),
        today: service.today(),
        task_open: service.config().task_open,
    }
}

#[test]
fn overdue_task_item_layout() {
    let service = service(TaskOpen::Browser);
    let output = presenter(&service).render(&service.query(QueryMode::Due, "@urgent p1"));

    assert_eq!(output.items.len(), 1);
    let item = &output.items[0];
    assert_eq!(item.title, "Write report (#Work) 2 days overdue");
    assert_eq!(item.subtitle, "1/1. 🏷️ urgent,home");
    assert_eq!(item.arg, "42");
    assert_eq!(item.icon.as_ref().unwrap().path, ICON_OVERDUE);
    assert_eq!(
        item.variables.task_url.as_deref(),
        Some("https://app.todoist.com/app/task/42")
    );
    assert_eq!(item.variables.action, Some(PendingAction::OpenTask));
    assert_eq!(item.variables.priority, Some(4));
    assert_eq!(item.variables.query.as_deref(), Some("@urgent p1"));
}

#[test]
fn app_links_when_configured() {
    let service = service(TaskOpen::App);
    let output = presenter(&service).render(&service.query(QueryMode::Due, "bug"));
    assert_eq!(
        output.items[0].variables.task_url.as_deref(),
        Some("todoist://task?id=43")
    );
    assert_eq!(output.items[0].subtitle, "1/1.");
}

#[test]
fn relative_due_wording() {
    let day = |d| NaiveDate::from_ymd_opt(2025, 1, d).unwrap();
    assert_eq!(relative_due(day(1), day(1)), "DUE TODAY");
    assert_eq!(relative_due(day(1), day(2)), "due in 1 day");
    assert_eq!(relative_due(day(5), day(1)), "4 days overdue");
}

#[test]
fn unknown_label_offers_creation() {
    let service = service(TaskOpen::Browser);
    let output = presenter(&service).render(&service.query(QueryMode::All, "report @(big rock)"));

    let item = &output.items[0];
    assert!(item.title.starts_with("no labels matching"));
    assert_eq!(item.arg, "report @(big rock) ");
    assert_eq!(item.icon.as_ref().unwrap().path, ICON_NEW_LABEL);
    assert_eq!(item.variables.action, Some(PendingAction::CreateLabel));
    assert_eq!(item.variables.new_label.as_deref(), Some("big rock"));
    assert!(item.variables.iterate);
}

#[test]
fn unknown_project_warns() {
    let service = service(TaskOpen::Browser);
    let output = presenter(&service).render(&service.query(QueryMode::All, "#Garden"));
    assert_eq!(output.items[0].title, "no projects matching");
    assert_eq!(output.items[0].icon.as_ref().unwrap().path, ICON_WARNING);
}

#[test]
fn sentinels_are_distinct() {
    let service = service(TaskOpen::Browser);
    let presenter = presenter(&service);

    let nothing = presenter.render(&service.query(QueryMode::Today, ""));
    assert_eq!(nothing.items.len(), 1);
    assert_eq!(nothing.items[0].title, "no tasks left to do today! 🙌");

    let none = presenter.render(&service.query(QueryMode::Today, "milk"));
    assert_eq!(none.items.len(), 1);
    assert_eq!(none.items[0].title, "no tasks matching your query 🙁");
}

#[test]
fn malformed_escape_item() {
    let service = service(TaskOpen::Browser);
    let output = presenter(&service).render(&service.query(QueryMode::All, "@(oops"));
    assert_eq!(
        output.items[0].title,
        "something is wrong with this label name"
    );
}

#[test]
fn draft_item_carries_creation_variables() {
    let service = service(TaskOpen::Browser);
    let output = presenter(&service).render(&service.draft_task("ship it #Work @urgent p3"));

    let item = &output.items[0];
    assert_eq!(item.title, "ship it");
    assert_eq!(item.icon.as_ref().unwrap().path, ICON_NEW_TASK);
    assert_eq!(item.variables.action, Some(PendingAction::CreateTask));
    assert_eq!(item.variables.project_id.as_deref(), Some("p2"));
    assert_eq!(item.variables.labels, vec!["urgent"]);
    assert_eq!(item.variables.priority, Some(2));
    assert!(item.subtitle.contains("#Work"));
}

#[test]
fn edit_draft_targets_existing_task() {
    let service = service(TaskOpen::Browser);
    let output = presenter(&service).render(&service.draft_edit("42", "Write report {2025-01-10}"));

    let item = &output.items[0];
    assert_eq!(item.title, "Write report");
    assert_eq!(item.variables.action, Some(PendingAction::EditTask));
    assert_eq!(item.variables.task_id.as_deref(), Some("42"));
    assert_eq!(item.variables.deadline.as_deref(), Some("2025-01-10"));
    assert!(item.subtitle.contains("⏰ deadline:2025-01-10"));
    assert!(item.subtitle.ends_with("⇧↩️ to edit"));
}

#[test]
fn uncoded_deadline_is_passed_through() {
    let service = service(TaskOpen::Browser);
    let output = presenter(&service).render(&service.draft_task("pay rent {next friday}"));

    let item = &output.items[0];
    assert_eq!(item.title, "pay rent");
    assert_eq!(item.variables.action, Some(PendingAction::CreateTask));
    assert_eq!(item.variables.deadline.as_deref(), Some("next friday"));
    assert!(item.subtitle.ends_with("⇧↩️ to create"));
}

#[test]
fn edit_autocomplete_items_keep_task_id() {
    let service = service(TaskOpen::Browser);
    let outcome = service.draft_edit("42", "Write report @ur");
    let output = attach_task_id(presenter(&service).render(&outcome), "42");

    assert_eq!(output.items[0].title, "urgent (1)");
    assert_eq!(output.items[0].variables.task_id.as_deref(), Some("42"));
}

#[test]
fn reschedule_items_resolve_due_dates() {
    let entries = reschedule_menu("", "Write report", today());
    let output = render_reschedule_menu(Some("42"), &entries, today());

    assert_eq!(output.items.len(), 4);
    assert_eq!(output.items[1].variables.due.as_deref(), Some("2025-01-02"));
    assert_eq!(output.items[1].variables.task_id.as_deref(), Some("42"));
    assert_eq!(output.items[1].variables.action, Some(PendingAction::Reschedule));
}
