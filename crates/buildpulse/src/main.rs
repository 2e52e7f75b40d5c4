mod output;
mod telemetry;

use std::path::{Path, PathBuf};

use anyhow::Context;
use buildpulse_core::config::Settings;
use buildpulse_core::model::RunInput;
use buildpulse_core::time::parse_run_timestamp;
use buildpulse_publish::build_log::StderrLog;
use buildpulse_publish::line_protocol::encode_batch;
use buildpulse_publish::PublicationService;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};

use crate::output::{print_summary_human, print_targets_human};
use crate::telemetry::init_cli_tracing;

#[derive(Parser, Debug)]
#[command(name = "buildpulse")]
#[command(about = "Publish CI build metrics to InfluxDB")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, global = true, help = "Config file (default: $BUILDPULSE_CONFIG or XDG config dir)")]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Prefix prepended to the project name")]
    prefix: Option<String>,

    #[arg(long, global = true, help = "Project name used instead of the job path")]
    project_name: Option<String>,

    #[arg(long, global = true, help = "Measurement name for the build point")]
    measurement_name: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Collect points for a build and write them to the targets")]
    Publish {
        #[arg(long, help = "Build description JSON file")]
        build: PathBuf,
        #[arg(long = "target", help = "Target description; repeatable, default all")]
        targets: Vec<String>,
        #[arg(long, help = "RFC3339 time, epoch millis or duration ago (default: now)")]
        timestamp: Option<String>,
        #[arg(long)]
        json: bool,
    },
    #[command(about = "Print the points a publish would write, in line protocol")]
    Preview {
        #[arg(long)]
        build: PathBuf,
        #[arg(long)]
        timestamp: Option<String>,
    },
    #[command(about = "List configured targets")]
    Targets {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_cli_tracing();
    let cli = Cli::parse();
    let settings = load_settings(&cli)?;
    tracing::debug!(
        targets = settings.targets.len(),
        proxy = settings.proxy.is_some(),
        "configuration loaded"
    );

    match cli.command {
        Commands::Publish {
            build,
            targets,
            timestamp,
            json,
        } => {
            let input = load_input(&build)?;
            let timestamp = run_timestamp(timestamp.as_deref())?;
            let targets = settings.select_targets(&targets)?;
            let service = PublicationService::from_settings(settings)?;
            let summary = service
                .publish(&input, &targets, timestamp, &StderrLog)
                .await
                .context("publish failed")?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_summary_human(&summary);
            }
        }
        Commands::Preview { build, timestamp } => {
            let input = load_input(&build)?;
            let timestamp = run_timestamp(timestamp.as_deref())?;
            let service = PublicationService::from_settings(settings)?;
            let batch = service.preview(&input, timestamp, &StderrLog);
            let body = encode_batch(&batch);
            if !body.is_empty() {
                println!("{body}");
            }
        }
        Commands::Targets { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&settings.targets)?);
            } else {
                print_targets_human(&settings.targets);
            }
        }
    }

    Ok(())
}

/// Config file and environment first, command-line flags last.
fn load_settings(cli: &Cli) -> anyhow::Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(prefix) = non_blank(cli.prefix.as_deref()) {
        settings.custom_prefix = Some(prefix);
    }
    if let Some(name) = non_blank(cli.project_name.as_deref()) {
        settings.custom_project_name = Some(name);
    }
    if let Some(name) = non_blank(cli.measurement_name.as_deref()) {
        settings.measurement_name = Some(name);
    }
    Ok(settings)
}

fn non_blank(v: Option<&str>) -> Option<String> {
    v.filter(|v| !v.trim().is_empty()).map(str::to_string)
}

fn load_input(path: &Path) -> anyhow::Result<RunInput> {
    RunInput::load(path).with_context(|| format!("failed to load build file {}", path.display()))
}

fn run_timestamp(raw: Option<&str>) -> anyhow::Result<DateTime<Utc>> {
    match raw {
        Some(raw) => Ok(parse_run_timestamp(raw)?),
        None => Ok(Utc::now()),
    }
}
