use std::path::PathBuf;

use anyhow::Context as _;
use loadkit_report::{ResultSource as _, SyntheticResults};

async fn run_report(args: &[&std::ffi::OsStr]) -> anyhow::Result<std::process::Output> {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_loadkit"))
        .arg("report")
        .args(args)
        .env_remove("LOADKIT_OUT_DIR")
        .output()
        .await
        .context("run loadkit")
}

#[tokio::test]
async fn report_writes_synthetic_html() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let out_dir = tmp.path().join("reports");

    let out = run_report(&["--out-dir".as_ref(), out_dir.as_os_str()]).await?;
    anyhow::ensure!(
        out.status.success(),
        "loadkit exited with {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr)
    );

    let printed = PathBuf::from(String::from_utf8_lossy(&out.stdout).trim());
    anyhow::ensure!(printed.is_absolute(), "expected absolute path, got {}", printed.display());
    anyhow::ensure!(printed.ends_with("reports/index.html"), "unexpected path {}", printed.display());
    anyhow::ensure!(out_dir.join("assets").is_dir(), "expected assets dir");

    let html = tokio::fs::read_to_string(&printed)
        .await
        .with_context(|| format!("read report: {}", printed.display()))?;
    anyhow::ensure!(html.contains("Load Test"), "expected test name in report");
    anyhow::ensure!(html.contains(r#"id="report-data""#), "expected embedded data");
    anyhow::ensure!(html.contains("responseTimeChart"), "expected charts");

    Ok(())
}

#[tokio::test]
async fn report_reads_results_bundle() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let results = tmp.path().join("results.json");
    let out_dir = tmp.path().join("out");

    let mut data = SyntheticResults::new(chrono::Utc::now())
        .load()
        .context("build sample data")?;
    data.run.test_name = "Checkout Flow <nightly>".to_string();
    let json = serde_json::to_vec(&data).context("serialize bundle")?;
    tokio::fs::write(&results, json).await.context("write bundle")?;

    let out = run_report(&[
        "--results".as_ref(),
        results.as_os_str(),
        "--out-dir".as_ref(),
        out_dir.as_os_str(),
    ])
    .await?;
    anyhow::ensure!(
        out.status.success(),
        "loadkit exited with {}\nstderr:\n{}",
        out.status,
        String::from_utf8_lossy(&out.stderr)
    );

    let html = tokio::fs::read_to_string(out_dir.join("index.html"))
        .await
        .context("read report")?;
    anyhow::ensure!(html.contains("Checkout Flow &lt;nightly&gt;"), "expected escaped test name");
    anyhow::ensure!(!html.contains("Checkout Flow <nightly>"), "test name must be escaped");

    Ok(())
}

#[tokio::test]
async fn report_overwrites_previous_output() -> anyhow::Result<()> {
    let tmp = tempfile::tempdir().context("create tempdir")?;
    let index = tmp.path().join("index.html");
    tokio::fs::write(&index, "stale").await.context("write stale report")?;

    let out = run_report(&["--out-dir".as_ref(), tmp.path().as_os_str()]).await?;
    anyhow::ensure!(out.status.success(), "loadkit exited with {}", out.status);

    let html = tokio::fs::read_to_string(&index).await.context("read report")?;
    anyhow::ensure!(html.trim_start().starts_with("<!DOCTYPE html>"), "expected new report");
    Ok(())
}
