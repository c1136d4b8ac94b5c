#![allow(dead_code)]

use assert_cmd::Command;
use std::ffi::OsStr;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime};
use tempfile::TempDir;

#[derive(Debug)]
pub struct TriRun {
    pub stdout: String,
    pub stderr: String,
    pub status: std::process::ExitStatus,
    pub duration: Duration,
    pub log_path: PathBuf,
}

impl TriRun {
    pub fn json(&self) -> serde_json::Value {
        let payload = extract_json_payload(&self.stdout);
        serde_json::from_str(&payload)
            .unwrap_or_else(|e| panic!("invalid JSON ({e}) in stdout:\n{}", self.stdout))
    }

    pub fn error_json(&self) -> serde_json::Value {
        let payload = extract_json_payload(&self.stderr);
        serde_json::from_str(&payload)
            .unwrap_or_else(|e| panic!("invalid JSON ({e}) in stderr:\n{}", self.stderr))
    }
}

pub struct TriWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
    pub log_dir: PathBuf,
}

impl TriWorkspace {
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

    /// A workspace with `tri init` already run.
    pub fn initialized() -> Self {
        let workspace = Self::new();
        let init = run_tri(&workspace, ["init"], "init");
        assert!(init.status.success(), "init failed: {}", init.stderr);
        workspace
    }
}

pub fn run_tri<I, S>(workspace: &TriWorkspace, args: I, label: &str) -> TriRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    run_tri_with_env(
        workspace,
        args,
        std::iter::empty::<(String, String)>(),
        label,
    )
}

pub fn run_tri_with_env<I, S, E, K, V>(
    workspace: &TriWorkspace,
    args: I,
    env_vars: E,
    label: &str,
) -> TriRun
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
    E: IntoIterator<Item = (K, V)>,
    K: AsRef<OsStr>,
    V: AsRef<OsStr>,
{
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("tri"));
    cmd.current_dir(&workspace.root);
    cmd.args(args);
    cmd.env_remove("TRIAGE_DIR");
    cmd.envs(env_vars);
    cmd.env("NO_COLOR", "1");
    cmd.env("RUST_LOG", "issue_triage=debug");
    cmd.env("RUST_BACKTRACE", "1");
    cmd.env("HOME", &workspace.root);

    let start = Instant::now();
    let output = cmd.output().expect("run tri");
    let duration = start.elapsed();

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    let log_path = workspace.log_dir.join(format!("{label}.log"));
    let log_body = format!(
        "label: {label}\nstarted: {:?}\nduration: {:?}\nstatus: {}\nargs: {:?}\ncwd: {}\n\nstdout:\n{}\n\nstderr:\n{}\n",
        SystemTime::now(),
        duration,
        output.status,
        cmd.get_args().collect::<Vec<_>>(),
        workspace.root.display(),
        stdout,
        stderr
    );
    fs::write(&log_path, log_body).expect("write log");

    TriRun {
        stdout,
        stderr,
        status: output.status,
        duration,
        log_path,
    }
}

/// Pull the JSON document out of output that may be preceded by log lines.
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
