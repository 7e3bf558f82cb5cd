//! `metriq`: normalize a batch of raw monitoring queries and print the plan.
//!
//! Reads `{ "range": {..}, "queries": [..] }` from a file or stdin, runs the
//! legacy migration and the normalizer, and writes one outcome per query.
mod request;

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;
use metriq_core::{NormalizeContext, NormalizerSettings};
use metriq_in::{plan_by_region, Normalizer};
use request::{Report, Request};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "metriq", version, about = "Normalize monitoring queries into execution-ready form")]
struct Cli {
    /// Request file; stdin when omitted or "-"
    input: Option<PathBuf>,

    /// YAML settings file
    #[arg(long, env = "METRIQ_CONFIG")]
    config: Option<PathBuf>,

    /// Migrate legacy aliases into dynamic labels
    #[arg(long, env = "METRIQ_DYNAMIC_LABELS")]
    dynamic_labels: bool,

    #[arg(long, env = "METRIQ_DEFAULT_REGION")]
    default_region: Option<String>,

    /// Reference instant (RFC 3339) used instead of the wall clock
    #[arg(long, env = "METRIQ_NOW")]
    now: Option<DateTime<Utc>>,

    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn settings(&self) -> anyhow::Result<NormalizerSettings> {
        let mut settings = match &self.config {
            Some(path) => NormalizerSettings::load(&path.to_string_lossy())
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => NormalizerSettings::default(),
        };
        settings.dynamic_labels |= self.dynamic_labels;
        if let Some(region) = &self.default_region {
            settings.default_region = region.clone();
        }
        Ok(settings)
    }

    fn read_input(&self) -> anyhow::Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display())),
            _ => {
                let mut buf = String::new();
                std::io::stdin()
                    .read_to_string(&mut buf)
                    .context("reading stdin")?;
                Ok(buf)
            }
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("METRIQ_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    tracing::debug!(version = metriq_core::METRIQ_VERSION, "metriq starting");

    let settings = cli.settings()?;
    let ctx = NormalizeContext::new(cli.now.unwrap_or_else(Utc::now)).with_settings(settings);
    let request = Request::from_json(&cli.read_input()?).context("parsing request")?;

    let normalizer = Normalizer::new(ctx);
    let outcomes = normalizer.migrate_and_normalize(&request.raw_queries(), &request.range);
    let plan = plan_by_region(&outcomes);
    let report = Report::new(outcomes);
    tracing::info!(
        succeeded = report.succeeded,
        failed = report.failed,
        regions = plan.len(),
        "normalized request"
    );

    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{}", rendered);
    Ok(())
}
