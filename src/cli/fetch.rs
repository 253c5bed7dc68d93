//! Fetch command implementation

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::{Cli, CliError, SiteArgs};
use crate::harvest::{HarvestSummary, Harvester, TargetReport};
use crate::output::{JsonRecordsWriter, OutputFormat, OutputWriter, RecordsWriter};
use crate::Record;

/// Fetch command arguments
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Site, filter and credential flags
    #[command(flatten)]
    pub site: SiteArgs,

    /// Output file; records go to stdout when absent
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Output format (json or ndjson)
    #[arg(long, default_value = "json")]
    pub format: OutputFormat,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl FetchArgs {
    /// Run the harvest and write every record
    pub async fn execute(&self, cli: &Cli) -> Result<(), CliError> {
        let config = self.site.resolve(cli.config.as_deref())?;
        info!("Fetching {}", config.api_root());

        let progress = if self.no_progress {
            ProgressBar::hidden()
        } else {
            create_progress_bar()
        };

        let bar = progress.clone();
        let harvester = Harvester::new(config).with_progress(Arc::new(
            move |done: usize, total: usize, report: &TargetReport| {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
                bar.set_message(report.type_name.clone());
            },
        ));

        let outcome = harvester.run().await?;
        progress.finish_and_clear();

        let written = self.write(&outcome.records)?;
        log_summary(&outcome.summary);
        info!(
            "Wrote {} records to {}",
            written,
            self.output
                .as_ref()
                .map_or_else(|| "stdout".to_string(), |p| p.display().to_string())
        );
        Ok(())
    }

    fn write(&self, records: &[Record]) -> Result<u64, CliError> {
        match &self.output {
            Some(path) => {
                let mut writer = JsonRecordsWriter::create(path, self.format)?;
                writer.write_records(records)?;
                let written = writer.records_written();
                writer.close()?;
                Ok(written)
            }
            None => {
                let mut writer = JsonRecordsWriter::stdout(self.format)?;
                writer.write_records(records)?;
                let written = writer.records_written();
                writer.close()?;
                Ok(written)
            }
        }
    }
}

fn log_summary(summary: &HarvestSummary) {
    for (type_name, count) in &summary.records_by_type {
        info!(type_name = %type_name, records = count, "{type_name}: {count}");
    }

    if !summary.failed_targets.is_empty() {
        warn!(
            "{} route(s) produced no records: {}",
            summary.failed_targets.len(),
            summary.failed_targets.join(", ")
        );
    }
    if summary.omitted_pages > 0 {
        warn!("{} page(s) could not be fetched and are missing", summary.omitted_pages);
    }

    info!(
        "Harvest complete: {} records from {} routes in {:.2}s",
        summary.total_records(),
        summary.targets,
        summary.elapsed().as_secs_f64()
    );
}

fn create_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} routes {msg}")
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}
