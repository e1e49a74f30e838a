use std::collections::BTreeMap;
use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::domain::{Batch, BuscoSummaryRow, SkippedItem};
use crate::error::TabError;
use crate::fs_util;

static SAMPLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"R+[0-9]+").unwrap());
static BIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_000([0-9]+)").unwrap());

/// Same (SampleName, Bin, Specific) but different statistics. Both rows are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuscoConflict {
    pub sample_name: String,
    pub bin: String,
    pub specific: bool,
    pub rows: usize,
}

#[derive(Debug, Clone)]
pub struct BuscoReport {
    pub batch: Batch<BuscoSummaryRow>,
    /// Non-specific rows dropped in favour of a specific run of the same bin.
    pub superseded: usize,
    pub conflicts: Vec<BuscoConflict>,
}

/// First `R<digits>` run in the recorded output path.
pub fn sample_name_from_out(out: &str) -> Option<&str> {
    SAMPLE_RE.find(out).map(|m| m.as_str())
}

/// Digits right after the first `_000` in the recorded output path.
pub fn bin_from_out(out: &str) -> Option<&str> {
    BIN_RE
        .captures(out)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

pub fn is_specific_run(file_name: &str) -> bool {
    file_name.contains("specific")
}

/// Build one row from the text of a BUSCO `short_summary*.json`.
pub fn parse_summary(path: &Utf8Path, text: &str, specific: bool) -> Result<BuscoSummaryRow, TabError> {
    let json: Value = serde_json::from_str(text)
        .map_err(|err| TabError::format(path, format!("invalid JSON: {err}")))?;
    let summary = SummaryJson { path, json: &json };

    let out = summary.text("parameters", "out")?;
    let sample_name = sample_name_from_out(&out)
        .ok_or_else(|| TabError::format(path, format!("no sample name (R<digits>) in `{out}`")))?
        .to_string();
    let bin = bin_from_out(&out)
        .ok_or_else(|| TabError::format(path, format!("no bin id after `_000` in `{out}`")))?
        .to_string();

    Ok(BuscoSummaryRow {
        sample_name,
        bin,
        specific,
        lineage_dataset: summary.text("lineage_dataset", "name")?,
        lineage_buscos: summary.text("lineage_dataset", "number_of_buscos")?,
        lineage_species: summary.text("lineage_dataset", "number_of_species")?,
        complete: summary.text("results", "Complete")?,
        single_copy: summary.text("results", "Single copy")?,
        multiple: summary.text("results", "Multi copy")?,
        fragmented: summary.text("results", "Fragmented")?,
        missing: summary.text("results", "Missing")?,
        number_of_markers: summary.text("results", "n_markers")?,
        domain: summary.text("results", "domain")?,
        scaffolds: summary.text("results", "Number of scaffolds")?,
        contigs: summary.text("results", "Number of contigs")?,
        total_length: summary.text("results", "Total length")?,
        gaps: summary.text("results", "Percent gaps")?,
        scaffold_n50: summary.text("results", "Scaffold N50")?,
        contig_n50: summary.text("results", "Contigs N50")?,
    })
}

struct SummaryJson<'a> {
    path: &'a Utf8Path,
    json: &'a Value,
}

impl SummaryJson<'_> {
    fn text(&self, section: &str, key: &str) -> Result<String, TabError> {
        self.json
            .get(section)
            .and_then(|value| value.get(key))
            .map(scalar_text)
            .ok_or_else(|| TabError::MissingField {
                path: self.path.to_owned(),
                field: format!("{section}.{key}"),
            })
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Within each (SampleName, Bin) group a specific run replaces the generic ones.
/// Rows sharing the same flag but not the same data are kept and reported.
pub fn deduplicate(rows: Vec<BuscoSummaryRow>) -> (Vec<BuscoSummaryRow>, usize, Vec<BuscoConflict>) {
    let mut groups = BTreeMap::<(&str, &str), Vec<usize>>::new();
    for (idx, row) in rows.iter().enumerate() {
        groups
            .entry((row.sample_name.as_str(), row.bin.as_str()))
            .or_default()
            .push(idx);
    }

    let mut dropped_rows = vec![false; rows.len()];
    let mut conflicts = Vec::new();
    for ((sample_name, bin), members) in &groups {
        let has_specific = members.iter().any(|&idx| rows[idx].specific);
        for flag in [true, false] {
            let same_flag = members
                .iter()
                .map(|&idx| &rows[idx])
                .filter(|row| row.specific == flag)
                .collect::<Vec<_>>();
            if same_flag.windows(2).any(|pair| pair[0] != pair[1]) {
                warn!(
                    sample = %sample_name,
                    bin = %bin,
                    specific = flag,
                    "{} BUSCO runs share sample, bin and flag but disagree; keeping all",
                    same_flag.len()
                );
                conflicts.push(BuscoConflict {
                    sample_name: sample_name.to_string(),
                    bin: bin.to_string(),
                    specific: flag,
                    rows: same_flag.len(),
                });
            }
        }
        if has_specific {
            for &idx in members {
                if !rows[idx].specific {
                    debug!(sample = %sample_name, bin = %bin, "generic run superseded by specific run");
                    dropped_rows[idx] = true;
                }
            }
        }
    }

    let superseded = dropped_rows.iter().filter(|&&dropped| dropped).count();
    let kept = rows
        .into_iter()
        .zip(dropped_rows)
        .filter_map(|(row, dropped)| (!dropped).then_some(row))
        .collect();
    (kept, superseded, conflicts)
}

/// Read every `*.json` summary in `dir`, then deduplicate.
pub fn collect_summaries(dir: &Utf8Path) -> Result<BuscoReport, TabError> {
    let mut batch = Batch::new();
    for path in fs_util::sorted_files(dir)? {
        if path.extension() != Some("json") {
            debug!("ignoring non-JSON file {path}");
            continue;
        }
        let specific = is_specific_run(fs_util::file_name(&path));
        let parsed = fs_util::read_text(&path).and_then(|text| parse_summary(&path, &text, specific));
        match parsed {
            Ok(row) => batch.rows.push(row),
            Err(err) => {
                warn!("skipping {path}: {err}");
                batch.skipped.push(SkippedItem::new(path.as_str(), &err));
            }
        }
    }

    let (rows, superseded, conflicts) = deduplicate(std::mem::take(&mut batch.rows));
    batch.rows = rows;
    Ok(BuscoReport {
        batch,
        superseded,
        conflicts,
    })
}
