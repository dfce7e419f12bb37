use tasklens_core::runtime::{parse_cli_args, run_with_writer, RuntimeError};

const SNAPSHOT: &str = r#"{
  "projects": [{"id": "p1", "name": "Inbox"}],
  "labels": [{"name": "home"}],
  "tasks": [{"id": "7", "content": "Buy milk", "labels": ["home"], "project_id": "p1"}]
}"#;

fn workspace(with_snapshot: bool) -> (tempfile::TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    if with_snapshot {
        std::fs::write(dir.path().join("snapshot.json"), SNAPSHOT).unwrap();
    }
    let config_path = dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        format!("data_dir = {:?}\n", dir.path().to_string_lossy()),
    )
    .unwrap();
    (dir, config_path.to_string_lossy().into_owned())
}

fn run(args: &[&str]) -> (Result<(), RuntimeError>, serde_json::Value) {
    let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
    let options = parse_cli_args(&args).unwrap();
    let mut out = Vec::new();
    let result = run_with_writer(options, &mut out);
    let json = serde_json::from_slice(&out).unwrap();
    (result, json)
}

#[test]
fn query_prints_task_items() {
    let (_dir, config) = workspace(true);
    let (result, json) = run(&["--config", &config, "query", "all", "milk"]);

    assert!(result.is_ok());
    assert_eq!(json["items"][0]["title"], "Buy milk (#Inbox)");
    assert_eq!(json["items"][0]["variables"]["task_id"], "7");
}

#[test]
fn session_query_is_replayed_for_empty_input() {
    let (_dir, config) = workspace(true);
    let session = r#"{"query":"@ho","iterate":true}"#;
    let (result, json) = run(&["--config", &config, "--session", session, "query", "all"]);

    assert!(result.is_ok());
    assert_eq!(json["items"][0]["title"], "home (1)");
    assert_eq!(json["items"][0]["arg"], "@home ");
}

#[test]
fn missing_snapshot_still_prints_an_item() {
    let (_dir, config) = workspace(false);
    let (result, json) = run(&["--config", &config, "query", "today"]);

    assert!(matches!(result, Err(RuntimeError::Service(_))));
    assert_eq!(json["items"].as_array().unwrap().len(), 1);
}

#[test]
fn broken_session_is_reported() {
    let (_dir, config) = workspace(true);
    let (result, json) = run(&["--config", &config, "--session", "{", "new", "x"]);

    assert!(matches!(result, Err(RuntimeError::Session(_))));
    assert_eq!(
        json["items"][0]["title"],
        "could not read the previous step's variables"
    );
}

#[test]
fn counts_prints_frequency_tables() {
    let (_dir, config) = workspace(true);
    let (result, json) = run(&["--config", &config, "counts"]);

    assert!(result.is_ok());
    assert_eq!(json["labels"][0]["name"], "home");
    assert_eq!(json["projects"][0]["count"], 1);
}

#[test]
fn edit_uses_session_task_id() {
    let (_dir, config) = workspace(true);
    let session = r#"{"task_id":"7","action":"open_task"}"#;
    let (result, json) = run(&[
        "--config", &config, "--session", session, "edit", "Buy", "oat", "milk", "{3d}",
    ]);

    assert!(result.is_ok());
    let item = &json["items"][0];
    assert_eq!(item["title"], "Buy oat milk");
    assert_eq!(item["variables"]["action"], "edit_task");
    assert_eq!(item["variables"]["task_id"], "7");
    assert!(item["subtitle"].as_str().unwrap().ends_with("⇧↩️ to edit"));
}

#[test]
fn edit_autocomplete_carries_task_id_flag() {
    let (_dir, config) = workspace(true);
    let (result, json) = run(&["--config", &config, "edit", "--task-id", "7", "Buy", "milk", "@ho"]);

    assert!(result.is_ok());
    assert_eq!(json["items"][0]["title"], "home (1)");
    assert_eq!(json["items"][0]["variables"]["task_id"], "7");
}

#[test]
fn edit_without_task_id_is_reported() {
    let (_dir, config) = workspace(true);
    let (result, json) = run(&["--config", &config, "edit", "anything"]);

    assert!(matches!(result, Err(RuntimeError::MissingTaskId)));
    assert_eq!(json["items"][0]["title"], "no task selected to edit");
}
