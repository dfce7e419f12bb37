use std::collections::HashMap;
use std::path::PathBuf;

use tasklens_core::autocomplete::MatchAnchor;
use tasklens_core::config::{self, apply_env_overrides, validate, Config, ConfigError, TaskOpen};

#[test]
fn default_config_is_valid() {
    let cfg = Config::default();
    assert!(validate(&cfg).is_ok());
    assert_eq!(cfg.max_results, 200);
    assert_eq!(cfg.refresh_days, 1);
    assert_eq!(cfg.default_project, "Inbox");
    assert!(cfg.snapshot_path.ends_with("tasklens/snapshot.json"));
}

#[test]
fn invalid_max_results_is_rejected() {
    let cfg = Config {
        max_results: 0,
        ..Config::default()
    };
    assert!(validate(&cfg).is_err());
}

#[test]
fn missing_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.config_path, path);
    assert_eq!(cfg.max_results, Config::default().max_results);
}

#[test]
fn toml_data_dir_moves_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        "data_dir = \"/srv/tasklens\"\nmatch_anchor = \"prefix\"\ntask_open = \"app\"\n",
    )
    .unwrap();

    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.data_dir, PathBuf::from("/srv/tasklens"));
    assert_eq!(cfg.snapshot_path, PathBuf::from("/srv/tasklens/snapshot.json"));
    assert_eq!(cfg.match_anchor, MatchAnchor::Prefix);
    assert_eq!(cfg.task_open, TaskOpen::App);
}

#[test]
fn json5_config_is_read_by_extension() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json5");
    std::fs::write(
        &path,
        "{\n  // launcher tuning\n  max_results: 50,\n  default_project: 'Work',\n}\n",
    )
    .unwrap();

    let cfg = config::load(Some(&path)).unwrap();
    assert_eq!(cfg.max_results, 50);
    assert_eq!(cfg.default_project, "Work");
}

#[test]
fn malformed_file_is_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "max_results = \"many\"").unwrap();

    let error = config::load(Some(&path)).unwrap_err();
    assert!(matches!(error, ConfigError::Parse { .. }));
}

#[test]
fn env_overrides_apply_on_top_of_file() {
    let env: HashMap<&str, &str> = HashMap::from([
        ("TASKLENS_DATA_DIR", "/data"),
        ("TASKLENS_PARTIAL_MATCH", "0"),
        ("TASKLENS_REFRESH_DAYS", "3"),
        ("TASKLENS_TASK_OPEN", "app"),
    ]);
    let mut cfg = Config::default();
    apply_env_overrides(&mut cfg, |key| env.get(key).map(|value| value.to_string())).unwrap();

    assert_eq!(cfg.snapshot_path, PathBuf::from("/data/snapshot.json"));
    assert_eq!(cfg.match_anchor, MatchAnchor::Prefix);
    assert_eq!(cfg.refresh_days, 3);
    assert_eq!(cfg.task_open, TaskOpen::App);
}

#[test]
fn bad_env_value_names_the_key() {
    let mut cfg = Config::default();
    let error = apply_env_overrides(&mut cfg, |key| {
        (key == "TASKLENS_REFRESH_DAYS").then(|| "soon".to_string())
    })
    .unwrap_err();
    assert_eq!(error.to_string(), "invalid value for TASKLENS_REFRESH_DAYS: 'soon'");
}
