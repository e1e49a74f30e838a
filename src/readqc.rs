use camino::{Utf8Path, Utf8PathBuf};
use tracing::{debug, warn};

use crate::domain::{Batch, ReadQcRow, RunAccession, SkippedItem};
use crate::error::TabError;
use crate::fs_util;

pub const DEFAULT_RUN_LABEL: &str = "RUN01";

/// Zero-based CSV column holding the bin N50 in `assembly_stats.csv`.
pub const BIN_N50_COLUMN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    NumberOfReads,
    MeanReadLength,
    ReadN50,
    MeanReadQuality,
    TotalBases,
}

const METRIC_LABELS: [(&str, Metric); 5] = [
    ("Number of reads", Metric::NumberOfReads),
    ("Mean read length", Metric::MeanReadLength),
    ("<b>Read N", Metric::ReadN50),
    ("Mean read quality", Metric::MeanReadQuality),
    ("Total bases", Metric::TotalBases),
];

/// Where the pipeline writes the per-run reports under a base directory.
#[derive(Debug, Clone)]
pub struct ReadQcLayout {
    base: Utf8PathBuf,
    run_label: String,
}

impl ReadQcLayout {
    pub fn new(base: Utf8PathBuf, run_label: impl Into<String>) -> Self {
        Self {
            base,
            run_label: run_label.into(),
        }
    }

    pub fn base(&self) -> &Utf8Path {
        &self.base
    }

    pub fn report_html(&self, acc: &RunAccession) -> Utf8PathBuf {
        self.base
            .join(acc.as_str())
            .join("summary")
            .join(format!("{acc}.{}.readqc_report.html", self.run_label))
    }

    pub fn coverage_txt(&self, acc: &RunAccession) -> Utf8PathBuf {
        self.base
            .join(acc.as_str())
            .join("assembly/contig_qc/coverage")
            .join(format!("{acc}.coverage.txt"))
    }

    pub fn assembly_stats_csv(&self, acc: &RunAccession) -> Utf8PathBuf {
        self.base
            .join(acc.as_str())
            .join("assembly/bin_QC/assembly_stats")
            .join(format!("{acc}.{}.assembly_stats.csv", self.run_label))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HtmlMetrics {
    pub number_of_reads: Option<String>,
    pub mean_read_length: Option<String>,
    pub read_n50: Option<String>,
    pub mean_read_quality: Option<String>,
    pub total_bases_mbp: Option<String>,
}

impl HtmlMetrics {
    fn slot(&mut self, metric: Metric) -> &mut Option<String> {
        match metric {
            Metric::NumberOfReads => &mut self.number_of_reads,
            Metric::MeanReadLength => &mut self.mean_read_length,
            Metric::ReadN50 => &mut self.read_n50,
            Metric::MeanReadQuality => &mut self.mean_read_quality,
            Metric::TotalBases => &mut self.total_bases_mbp,
        }
    }
}

/// Each metric's value sits on the line after its label, wrapped in `<td>`.
/// A later label line overrides an earlier one; a label on the last line yields nothing.
pub fn extract_html_metrics(html: &str) -> HtmlMetrics {
    let lines = html.lines().collect::<Vec<_>>();
    let mut metrics = HtmlMetrics::default();
    for (idx, line) in lines.iter().enumerate() {
        for (label, metric) in METRIC_LABELS {
            if !line.contains(label) {
                continue;
            }
            match lines.get(idx + 1) {
                Some(next) => *metrics.slot(metric) = Some(strip_cell(next)),
                None => debug!("label `{label}` is on the last line, no value follows"),
            }
        }
    }
    metrics
}

fn strip_cell(line: &str) -> String {
    line.trim().replace("<td>", "").replace("</td>", "")
}

/// Contigs in a coverage table: every line but the header.
pub fn contig_count(coverage: &str) -> usize {
    coverage.lines().count().saturating_sub(1)
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinStats {
    pub bin_count: usize,
    pub average_n50: Option<f64>,
}

/// Bin count and mean N50 from `assembly_stats.csv`. Blank lines are ignored.
pub fn bin_stats(path: &Utf8Path, csv: &str) -> Result<BinStats, TabError> {
    let mut total: i64 = 0;
    let mut bin_count = 0usize;
    for (idx, line) in csv.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let cell = line.split(',').nth(BIN_N50_COLUMN).ok_or_else(|| {
            TabError::format(
                path,
                format!("line {} has no column {BIN_N50_COLUMN}", idx + 1),
            )
        })?;
        let n50 = cell.trim().parse::<i64>().map_err(|_| {
            TabError::format(
                path,
                format!("line {}: N50 `{}` is not an integer", idx + 1, cell.trim()),
            )
        })?;
        total = total.checked_add(n50).ok_or_else(|| {
            TabError::format(path, format!("line {}: N50 sum overflows", idx + 1))
        })?;
        bin_count += 1;
    }
    let average_n50 = (bin_count > 0).then(|| total as f64 / bin_count as f64);
    Ok(BinStats {
        bin_count,
        average_n50,
    })
}

/// Float text with at least one decimal: `1234.0`, `1234.5`.
pub fn format_average(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

pub fn summarize_accession(layout: &ReadQcLayout, acc: &RunAccession) -> Result<ReadQcRow, TabError> {
    let html_path = layout.report_html(acc);
    let metrics = if html_path.is_file() {
        extract_html_metrics(&fs_util::read_text(&html_path)?)
    } else {
        warn!("{acc}: no ReadQC report at {html_path}, read metrics left empty");
        HtmlMetrics::default()
    };

    let coverage_path = layout.coverage_txt(acc);
    let contig_count = if coverage_path.is_file() {
        contig_count(&fs_util::read_text(&coverage_path)?)
    } else {
        debug!("{acc}: no coverage table at {coverage_path}");
        0
    };

    let stats_path = layout.assembly_stats_csv(acc);
    let (bin_count, average_bin_n50) = if stats_path.is_file() {
        let stats = bin_stats(&stats_path, &fs_util::read_text(&stats_path)?)?;
        let average = match stats.average_n50 {
            Some(value) => format_average(value),
            None => {
                let err = TabError::EmptyDenominator(format!("bin N50 for {acc}"));
                warn!("{err}; reporting 0");
                "0".to_string()
            }
        };
        (stats.bin_count, average)
    } else {
        debug!("{acc}: no assembly stats at {stats_path}");
        (0, "0".to_string())
    };

    Ok(ReadQcRow {
        run_accession: acc.clone(),
        number_of_reads: metric_or_empty(acc, "number_of_reads", metrics.number_of_reads),
        mean_read_length: metric_or_empty(acc, "mean_read_length", metrics.mean_read_length),
        read_n50: metric_or_empty(acc, "read_n50", metrics.read_n50),
        mean_read_quality: metric_or_empty(acc, "mean_read_quality", metrics.mean_read_quality),
        total_bases_mbp: metric_or_empty(acc, "total_bases_mbp", metrics.total_bases_mbp),
        contig_count,
        bin_count,
        average_bin_n50,
    })
}

fn metric_or_empty(acc: &RunAccession, name: &str, value: Option<String>) -> String {
    value.unwrap_or_else(|| {
        warn!("{acc}: ReadQC report has no value for {name}");
        String::new()
    })
}

/// Sub-directories of the base directory whose names are valid accessions.
pub fn discover_accessions(base: &Utf8Path) -> Result<Vec<RunAccession>, TabError> {
    let mut accessions = Vec::new();
    for dir in fs_util::sorted_dirs(base)? {
        match fs_util::file_name(&dir).parse::<RunAccession>() {
            Ok(acc) => accessions.push(acc),
            Err(_) => debug!("ignoring directory {dir}"),
        }
    }
    Ok(accessions)
}

pub fn collect_readqc(layout: &ReadQcLayout, accessions: &[RunAccession]) -> Batch<ReadQcRow> {
    let mut batch = Batch::new();
    for acc in accessions {
        match summarize_accession(layout, acc) {
            Ok(row) => batch.rows.push(row),
            Err(err) => {
                warn!("skipping {acc}: {err}");
                batch.skipped.push(SkippedItem::new(acc.as_str(), &err));
            }
        }
    }
    batch
}
