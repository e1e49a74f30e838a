use std::time::{Duration, Instant};

use camino::Utf8Path;
use serde::Serialize;
use tracing::{info, warn};

use crate::busco;
use crate::config::{BuscoJob, GenesJob, PeaksJob, ReadQcJob, ResolvedConfig};
use crate::domain::{JobKind, SkippedItem};
use crate::error::TabError;
use crate::fs_util;
use crate::genes;
use crate::peaks;
use crate::readqc::{self, ReadQcLayout};
use crate::tsv::{TsvRecord, render_tsv, write_tsv_atomic};

#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Build every table but write nothing.
    pub dry_run: bool,
}

/// What one job did: how many records it looked at, what it wrote, what it skipped.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub job: JobKind,
    pub processed: usize,
    pub rows: usize,
    pub skipped: Vec<SkippedItem>,
    pub conflicts: usize,
    pub superseded: usize,
    pub outputs: Vec<String>,
    pub dry_run: bool,
    pub generated_at: String,
}

impl RunSummary {
    fn new(job: JobKind, dry_run: bool) -> Self {
        Self {
            job,
            processed: 0,
            rows: 0,
            skipped: Vec::new(),
            conflicts: 0,
            superseded: 0,
            outputs: Vec::new(),
            dry_run,
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// A ReadQC run may target stdout, in which case the table travels with the summary.
#[derive(Debug, Clone)]
pub struct ReadQcOutcome {
    pub summary: RunSummary,
    pub table: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Debug, Clone, Default)]
pub struct App {
    options: RunOptions,
}

impl App {
    pub fn new(options: RunOptions) -> Self {
        Self { options }
    }

    pub fn genes(&self, job: &GenesJob, sink: &dyn ProgressSink) -> Result<RunSummary, TabError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Scan; counting genes under {}", job.input),
            elapsed: None,
        });

        let batch = genes::collect_gene_counts(&job.input)?;
        let mut summary = RunSummary::new(JobKind::Genes, self.options.dry_run);
        summary.processed = batch.processed();
        summary.rows = batch.rows.len();
        summary.skipped = batch.skipped;
        self.write_table(&job.output, &batch.rows, &mut summary)?;

        finish(sink, &summary, started);
        Ok(summary)
    }

    pub fn busco(&self, job: &BuscoJob, sink: &dyn ProgressSink) -> Result<RunSummary, TabError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Scan; reading BUSCO summaries in {}", job.input),
            elapsed: None,
        });

        let report = busco::collect_summaries(&job.input)?;
        let mut summary = RunSummary::new(JobKind::Busco, self.options.dry_run);
        summary.processed = report.batch.processed() + report.superseded;
        summary.rows = report.batch.rows.len();
        summary.skipped = report.batch.skipped;
        summary.conflicts = report.conflicts.len();
        summary.superseded = report.superseded;
        self.write_table(&job.output, &report.batch.rows, &mut summary)?;

        finish(sink, &summary, started);
        Ok(summary)
    }

    pub fn readqc(&self, job: &ReadQcJob, sink: &dyn ProgressSink) -> Result<ReadQcOutcome, TabError> {
        let started = Instant::now();
        let accessions = match &job.accessions {
            Some(accessions) => accessions.clone(),
            None => readqc::discover_accessions(&job.base)?,
        };
        sink.event(ProgressEvent {
            message: format!(
                "phase=Scan; summarising {} run(s) under {}",
                accessions.len(),
                job.base
            ),
            elapsed: None,
        });

        let layout = ReadQcLayout::new(job.base.clone(), job.run_label.clone());
        let batch = readqc::collect_readqc(&layout, &accessions);
        let mut summary = RunSummary::new(JobKind::Readqc, self.options.dry_run);
        summary.processed = batch.processed();
        summary.rows = batch.rows.len();
        summary.skipped = batch.skipped;

        let table = match &job.output {
            Some(output) => {
                self.write_table(output, &batch.rows, &mut summary)?;
                None
            }
            None => Some(render_tsv(&batch.rows)),
        };

        finish(sink, &summary, started);
        Ok(ReadQcOutcome { summary, table })
    }

    /// One output file per report, named like its input without any `.gz`.
    pub fn peaks(&self, job: &PeaksJob, sink: &dyn ProgressSink) -> Result<RunSummary, TabError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Scan; converting Peak ID reports in {}", job.input),
            elapsed: None,
        });

        if fs_util::same_dir(&job.input, &job.output) {
            return Err(TabError::OutputIsInput(job.output.clone()));
        }

        let mut summary = RunSummary::new(JobKind::Peaks, self.options.dry_run);
        for report in fs_util::sorted_files(&job.input)? {
            summary.processed += 1;
            let parsed = peaks::parse_peak_file(&report, job.preamble_lines);
            let rows = match parsed {
                Ok(rows) => rows,
                Err(err) => {
                    warn!("skipping {report}: {err}");
                    summary.skipped.push(SkippedItem::new(report.as_str(), &err));
                    continue;
                }
            };
            summary.rows += rows.len();
            let output = job.output.join(fs_util::plain_file_name(&report));
            sink.event(ProgressEvent {
                message: format!("{report}: {} peak(s)", rows.len()),
                elapsed: Some(started.elapsed()),
            });
            self.write_table(&output, &rows, &mut summary)?;
        }

        finish(sink, &summary, started);
        Ok(summary)
    }

    /// Run every job present in the config, in a fixed order.
    pub fn run_config(
        &self,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<Vec<RunSummary>, TabError> {
        let mut summaries = Vec::new();
        if let Some(job) = &config.genes {
            summaries.push(self.genes(job, sink)?);
        }
        if let Some(job) = &config.busco {
            summaries.push(self.busco(job, sink)?);
        }
        if let Some(job) = &config.readqc {
            summaries.push(self.readqc(job, sink)?.summary);
        }
        if let Some(job) = &config.peaks {
            summaries.push(self.peaks(job, sink)?);
        }
        Ok(summaries)
    }

    fn write_table<T: TsvRecord>(
        &self,
        output: &Utf8Path,
        rows: &[T],
        summary: &mut RunSummary,
    ) -> Result<(), TabError> {
        let content = render_tsv(rows);
        if !self.options.dry_run {
            write_tsv_atomic(output, &content)?;
        }
        summary.outputs.push(output.to_string());
        Ok(())
    }
}

fn finish(sink: &dyn ProgressSink, summary: &RunSummary, started: Instant) {
    info!(
        job = %summary.job,
        rows = summary.rows,
        skipped = summary.skipped.len(),
        "run finished"
    );
    sink.event(ProgressEvent {
        message: format!(
            "phase=Done; {} row(s), {} skipped",
            summary.rows,
            summary.skipped.len()
        ),
        elapsed: Some(started.elapsed()),
    });
}
