#![allow(dead_code)]

use assert_cmd::Command;
use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;

#[derive(Debug)]
pub struct IdbRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl IdbRun {
    pub fn json(&self) -> Value {
        serde_json::from_str(&extract_json_payload(&self.stdout)).expect("parse stdout json")
    }

    pub fn error_json(&self) -> Value {
        serde_json::from_str(&extract_json_payload(&self.stderr)).expect("parse stderr json")
    }

    pub fn code(&self) -> i32 {
        self.status.code().unwrap_or(-1)
    }
}

pub struct IdbWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl IdbWorkspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().to_path_buf();
        let log_dir = root.join("logs");
        fs::create_dir_all(&log_dir).expect("log dir");
        Self {
            temp_dir,
            root,
            log_dir,
        }
    }

    /// Run `idb init` and register `alice`, the default actor of [`run_as`].
    pub fn initialized() -> Self {
        let workspace = Self::new();
        let init = run_idb(&workspace, ["init"], "init");
        assert!(init.status.success(), "init failed: {}", init.stderr);
        let register = run_idb(
            &workspace,
            [
                "user",
                "register",
                "--email",
                "alice@example.com",
                "--username",
                "alice",
            ],
            "register_alice",
        );
        assert!(register.status.success(), "register failed: {}", register.stderr);
        workspace
    }
}

pub fn run_idb<I, S>(workspace: &IdbWorkspace, args: I, label: &str) -> IdbRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_idb_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

/// Run as `alice` via `IDB_ACTOR`.
pub fn run_as<I, S>(workspace: &IdbWorkspace, args: I, label: &str) -> IdbRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_idb_with_env(workspace, args, [("IDB_ACTOR", "alice")], label)
}

pub fn run_idb_with_env<I, S, E, K, V>(
    workspace: &IdbWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> IdbRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("idb"));
    cmd.current_dir(&workspace.root);
    cmd.args(args);
    cmd.env_remove("IDB_ACTOR");
    cmd.env_remove("ISSUEDB_DIR");
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "issuedb=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);

    let start = Instant::now();
    let output = cmd.output().expect("run idb");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    IdbRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Strip log lines that precede a JSON document.
pub fn extract_json_payload(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    for (idx, line) in lines.iter().enumerate() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            return lines[idx..].join("\n").trim().to_string();
        }
    }
    output.trim().to_string()
}
