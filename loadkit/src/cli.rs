use clap::{Args, Parser, Subcommand};
use loadkit_core::ScenarioKind;
use std::path::PathBuf;

fn parse_scenario_kind(input: &str) -> Result<ScenarioKind, String> {
    loadkit_core::parse_scenario(input).map_err(|e| e.to_string())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OptionsFormat {
    Json,
    Yaml,
}

#[derive(Debug, Parser)]
#[command(
    name = "loadkit",
    author,
    version,
    about = "Load-test scenario presets and HTML run reports",
    long_about = "loadkit defines load-test scenarios for a k6-compatible engine and renders static HTML reports from run results.\n\nScenario parameters are read from the current process environment; use `--env KEY=VALUE` to add/override values.",
    after_help = "Examples:\n  loadkit report\n  loadkit report --results results.json --out-dir reports\n  loadkit options stress --format yaml\n  loadkit options api --env K6_API_BASE_URL=https://staging.example.com --out options.json"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render an HTML report for a test run
    #[command(
        long_about = "Render a static HTML report into <out-dir>/index.html.\n\nWithout --results the report is built from synthetic sample data."
    )]
    Report(ReportArgs),

    /// Print the engine options object of a scenario preset
    Options(OptionsArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// JSON results bundle to report on (defaults to synthetic sample data)
    #[arg(long, value_name = "PATH")]
    pub results: Option<PathBuf>,

    /// Directory the report is written to (created if missing)
    #[arg(
        long,
        value_name = "DIR",
        env = "LOADKIT_OUT_DIR",
        default_value = "reports"
    )]
    pub out_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct OptionsArgs {
    /// Scenario preset: basic, api, load or stress
    #[arg(value_name = "SCENARIO", value_parser = parse_scenario_kind)]
    pub scenario: ScenarioKind,

    /// Add/override env vars read by the preset (repeatable, KEY=VALUE).
    /// CLI-provided vars override the current process env.
    #[arg(long = "env", value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OptionsFormat::Json)]
    pub format: OptionsFormat,

    /// Write to this file instead of stdout
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,
}
