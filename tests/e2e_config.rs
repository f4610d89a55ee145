mod common;

use assert_cmd::Command;
use common::cli::{IdbWorkspace, run_as, run_idb, run_idb_with_env};
use predicates::prelude::*;

#[test]
fn e2e_runtime_config_drives_defaults() {
    let _log = common::test_log("e2e_runtime_config_drives_defaults");
    let workspace = IdbWorkspace::initialized();

    let set = run_idb(&workspace, ["config", "set", "default_priority", "critical", "--json"], "set");
    assert!(set.status.success(), "config set failed: {}", set.stderr);
    let set = set.json();
    assert_eq!(set["key"], "default-priority");
    assert_eq!(set["effective"], "critical");

    let get = run_idb(&workspace, ["config", "get", "default-priority"], "get");
    assert_eq!(get.stdout.trim(), "critical");

    let create = run_as(&workspace, ["create", "Inherits priority", "--json"], "create");
    assert_eq!(create.json()["priority"], "critical");

    let limit = run_idb(&workspace, ["config", "set", "list-limit", "1"], "set_limit");
    assert!(limit.status.success(), "config set failed: {}", limit.stderr);
    let second = run_as(&workspace, ["create", "Second"], "create_second");
    assert!(second.status.success());
    let list = run_as(&workspace, ["list", "--json"], "list");
    let list = list.json();
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["title"], "Second");
}

#[test]
fn e2e_config_rejects_bad_keys() {
    let _log = common::test_log("e2e_config_rejects_bad_keys");
    let workspace = IdbWorkspace::initialized();

    let startup = run_idb(&workspace, ["config", "set", "actor", "alice"], "set_actor");
    assert_eq!(startup.code(), 7);
    let error = startup.error_json();
    assert_eq!(error["error"]["code"], "CONFIG_ERROR");
    assert!(
        error["error"]["message"]
            .as_str()
            .unwrap()
            .contains("startup key")
    );

    let unknown = run_idb(&workspace, ["config", "set", "colour", "red"], "set_unknown");
    assert_eq!(unknown.code(), 7);

    let bad_value = run_idb(&workspace, ["config", "set", "list-limit", "500"], "set_bad_value");
    assert_eq!(bad_value.code(), 7);

    let unset = run_idb(&workspace, ["config", "get", "no-such-key"], "get_unset");
    assert_eq!(unset.code(), 7);

    let default = run_idb(&workspace, ["config", "get", "list-limit"], "get_default");
    assert_eq!(default.stdout.trim(), "50");
}

#[test]
fn e2e_env_overrides_runtime_config() {
    let _log = common::test_log("e2e_env_overrides_runtime_config");
    let workspace = IdbWorkspace::initialized();

    let set = run_idb(&workspace, ["config", "set", "default-priority", "low"], "set");
    assert!(set.status.success(), "config set failed: {}", set.stderr);

    let create = run_idb_with_env(
        &workspace,
        ["create", "From env", "--json"],
        [("IDB_ACTOR", "alice"), ("IDB_DEFAULT_PRIORITY", "high")],
        "create_env",
    );
    assert!(create.status.success(), "create failed: {}", create.stderr);
    assert_eq!(create.json()["priority"], "high");

    let shadowed = run_idb_with_env(
        &workspace,
        ["config", "set", "default-priority", "medium"],
        [("IDB_DEFAULT_PRIORITY", "high")],
        "set_shadowed",
    );
    assert!(shadowed.stdout.contains("overridden by a higher layer"));
}

#[test]
fn e2e_schema_completions_version() {
    let _log = common::test_log("e2e_schema_completions_version");
    let workspace = IdbWorkspace::new();

    let schema = run_idb(&workspace, ["schema"], "schema");
    assert!(schema.status.success(), "schema failed: {}", schema.stderr);
    let schema = schema.json();
    assert_eq!(schema["tool"], "idb");
    assert!(schema["schemas"]["Issue"].is_object());
    assert!(schema["schemas"]["ErrorEnvelope"].is_object());

    let only = run_idb(&workspace, ["schema", "import-result"], "schema_one");
    let only = only.json();
    assert_eq!(only["schemas"].as_object().unwrap().len(), 1);

    let completions = run_idb(&workspace, ["completions", "bash"], "completions");
    assert!(completions.status.success());
    assert!(completions.stdout.contains("idb"));

    let version = run_idb(&workspace, ["version"], "version");
    assert!(version.stdout.starts_with("idb version "));
}

#[test]
fn e2e_help_lists_core_commands() {
    let _log = common::test_log("e2e_help_lists_core_commands");
    Command::new(assert_cmd::cargo::cargo_bin!("idb"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("bulk-status"))
        .stdout(predicate::str::contains("timeline"))
        .stdout(predicate::str::contains("--expected-version").not());

    Command::new(assert_cmd::cargo::cargo_bin!("idb"))
        .args(["update", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--expected-version"));
}
