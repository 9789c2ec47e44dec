use std::path::Path;

use anyhow::Context as _;
use chrono::Utc;
use loadkit_core::{Env, TestOptions, workload};
use tokio::io::AsyncWriteExt as _;

use crate::cli::{OptionsArgs, OptionsFormat};
use crate::exit_codes::ExitCode;
use crate::run_error::RunError;

pub async fn export_options(args: OptionsArgs) -> Result<ExitCode, RunError> {
    let env = Env::from_process()
        .with_overrides(&args.env)
        .map_err(|e| RunError::InvalidInput(anyhow::Error::new(e)))?;

    let preset = workload(args.scenario, &env, Utc::now()).map_err(|e| {
        RunError::InvalidInput(anyhow::Error::new(e).context("invalid scenario config"))
    })?;

    let doc = serialize_options(preset.options(), args.format).map_err(RunError::RuntimeError)?;

    match &args.out {
        Some(path) => {
            write_file(path, &doc)
                .await
                .map_err(|e| RunError::RuntimeError(e.context("failed to write options")))?;
            tracing::info!(scenario = %args.scenario, path = %path.display(), "options written");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(doc.as_bytes())
                .await
                .context("failed to write to stdout")
                .map_err(RunError::RuntimeError)?;
            stdout
                .flush()
                .await
                .context("failed to flush stdout")
                .map_err(RunError::RuntimeError)?;
        }
    }

    Ok(ExitCode::Success)
}

fn serialize_options(options: &TestOptions, format: OptionsFormat) -> anyhow::Result<String> {
    match format {
        OptionsFormat::Json => {
            let mut s = serde_json::to_string_pretty(options).context("failed to serialize JSON")?;
            s.push('\n');
            Ok(s)
        }
        OptionsFormat::Yaml => serde_yaml::to_string(options).context("failed to serialize YAML"),
    }
}

async fn write_file(path: &Path, contents: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }

    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("failed to write file: {}", path.display()))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stress_options() -> TestOptions {
        match workload(loadkit_core::ScenarioKind::Stress, &Env::default(), Utc::now()) {
            Ok(w) => w.options().clone(),
            Err(err) => panic!("failed to build preset: {err}"),
        }
    }

    #[test]
    fn yaml_keeps_engine_key_names() {
        let yaml = serialize_options(&stress_options(), OptionsFormat::Yaml)
            .unwrap_or_else(|e| panic!("{e:#}"));
        assert!(yaml.contains("summaryTrendStats:"));
        assert!(yaml.contains("duration: 10m"));
        assert!(yaml.contains("testType: stress"));
    }

    #[test]
    fn json_ends_with_newline() {
        let json = serialize_options(&stress_options(), OptionsFormat::Json)
            .unwrap_or_else(|e| panic!("{e:#}"));
        assert!(json.ends_with("}\n"));
        let v: serde_json::Value =
            serde_json::from_str(&json).unwrap_or_else(|e| panic!("{e:#}"));
        assert_eq!(v["stages"][2]["target"], 100);
    }

    #[tokio::test]
    async fn write_file_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e:#}"));
        let path = dir.path().join("nested").join("options.json");
        write_file(&path, "{}\n")
            .await
            .unwrap_or_else(|e| panic!("{e:#}"));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("{e:#}")),
            "{}\n"
        );
    }
}
