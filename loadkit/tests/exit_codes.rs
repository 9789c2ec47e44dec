use std::process::{Command, Output};

use anyhow::Context as _;

fn status_code(status: std::process::ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}

fn run(args: &[&str]) -> anyhow::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_loadkit"))
        .args(args)
        .env_remove("LOADKIT_OUT_DIR")
        .output()
        .context("run loadkit binary")
}

fn ensure_code(out: &Output, expected: i32) -> anyhow::Result<()> {
    anyhow::ensure!(
        status_code(out.status) == expected,
        "expected exit code {expected}, got {}\nstdout:\n{}\nstderr:\n{}",
        status_code(out.status),
        String::from_utf8_lossy(&out.stdout),
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}

#[test]
fn invalid_flags_exit_30() -> anyhow::Result<()> {
    let out = run(&["report", "--no-such-flag"])?;
    ensure_code(&out, 30)
}

#[test]
fn help_exits_0() -> anyhow::Result<()> {
    let out = run(&["--help"])?;
    ensure_code(&out, 0)?;
    anyhow::ensure!(String::from_utf8_lossy(&out.stdout).contains("loadkit report"));
    Ok(())
}

#[test]
fn unknown_scenario_exit_30() -> anyhow::Result<()> {
    let out = run(&["options", "soak"])?;
    ensure_code(&out, 30)?;
    anyhow::ensure!(String::from_utf8_lossy(&out.stderr).contains("soak"));
    Ok(())
}

#[test]
fn malformed_env_override_exit_30() -> anyhow::Result<()> {
    let out = run(&["options", "basic", "--env", "NOT_A_PAIR"])?;
    ensure_code(&out, 30)?;
    anyhow::ensure!(String::from_utf8_lossy(&out.stderr).contains("NOT_A_PAIR"));
    Ok(())
}

#[test]
fn invalid_results_bundle_exit_30() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let results = tmp.path().join("results.json");
    std::fs::write(&results, "{}").context("write results")?;
    let out_dir = tmp.path().join("out");

    let out = run(&[
        "report",
        "--results",
        &results.to_string_lossy(),
        "--out-dir",
        &out_dir.to_string_lossy(),
    ])?;
    ensure_code(&out, 30)?;
    anyhow::ensure!(!out_dir.join("index.html").exists(), "no report expected");
    Ok(())
}

#[test]
fn missing_results_file_exit_30() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let results = tmp.path().join("missing.json");

    let out = run(&[
        "report",
        "--results",
        &results.to_string_lossy(),
        "--out-dir",
        &tmp.path().join("out").to_string_lossy(),
    ])?;
    ensure_code(&out, 30)
}

#[test]
fn unwritable_out_dir_exit_40() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let blocker = tmp.path().join("taken");
    std::fs::write(&blocker, "not a directory").context("write blocker file")?;

    let out = run(&["report", "--out-dir", &blocker.to_string_lossy()])?;
    ensure_code(&out, 40)?;
    anyhow::ensure!(
        String::from_utf8_lossy(&out.stderr).contains("failed to write report"),
        "stderr:\n{}",
        String::from_utf8_lossy(&out.stderr)
    );
    Ok(())
}
