use std::ops::Range;

use camino::Utf8Path;
use tracing::{debug, warn};

use crate::domain::{Batch, GeneCountRow, SkippedItem};
use crate::error::TabError;
use crate::fs_util;

/// Characters dropped from the front of a sample folder name (`busco_R018` -> `R018`).
pub const SAMPLE_PREFIX_LEN: usize = 6;

/// Character window of a gene file name that holds the bin number.
pub const BIN_WINDOW: Range<usize> = 18..21;

/// Gene count of a FASTA file: one per `>` header line.
pub fn count_fasta_headers(text: &str) -> usize {
    text.lines().filter(|line| line.starts_with('>')).count()
}

pub fn sample_name_from_folder(folder: &str) -> Option<String> {
    let name = folder.chars().skip(SAMPLE_PREFIX_LEN).collect::<String>();
    (!name.is_empty()).then_some(name)
}

pub fn bin_from_file_name(file_name: &str) -> Option<String> {
    let window = file_name
        .chars()
        .skip(BIN_WINDOW.start)
        .take(BIN_WINDOW.len())
        .collect::<String>();
    (window.chars().count() == BIN_WINDOW.len()).then_some(window)
}

/// Walk `root/<sample folder>/<gene file>` and count genes per file.
///
/// A missing root fails the whole run. A sample folder that cannot be listed,
/// or a badly named or unreadable gene file, is skipped and reported.
pub fn collect_gene_counts(root: &Utf8Path) -> Result<Batch<GeneCountRow>, TabError> {
    let mut batch = Batch::new();
    for folder in fs_util::sorted_dirs(root)? {
        let folder_name = fs_util::file_name(&folder);
        let Some(sample_name) = sample_name_from_folder(folder_name) else {
            let err = TabError::format(
                &folder,
                format!("sample folder name is shorter than {} characters", SAMPLE_PREFIX_LEN + 1),
            );
            warn!("skipping {folder}: {err}");
            batch.skipped.push(SkippedItem::new(folder.as_str(), &err));
            continue;
        };

        let gene_files = match fs_util::sorted_files(&folder) {
            Ok(files) => files,
            Err(err) => {
                warn!("skipping {folder}: {err}");
                batch.skipped.push(SkippedItem::new(folder.as_str(), &err));
                continue;
            }
        };
        for gene_file in gene_files {
            match count_gene_file(&gene_file, &sample_name) {
                Ok(row) => {
                    debug!(sample = %row.sample_name, bin = %row.bin, genes = row.genes, "counted genes");
                    batch.rows.push(row);
                }
                Err(err) => {
                    warn!("skipping {gene_file}: {err}");
                    batch.skipped.push(SkippedItem::new(gene_file.as_str(), &err));
                }
            }
        }
    }
    Ok(batch)
}

fn count_gene_file(path: &Utf8Path, sample_name: &str) -> Result<GeneCountRow, TabError> {
    let bin = bin_from_file_name(fs_util::file_name(path)).ok_or_else(|| {
        TabError::format(
            path,
            format!(
                "file name has no bin id at characters {}..{}",
                BIN_WINDOW.start, BIN_WINDOW.end
            ),
        )
    })?;
    let text = fs_util::read_text(path)?;
    Ok(GeneCountRow {
        sample_name: sample_name.to_string(),
        bin,
        genes: count_fasta_headers(&text),
    })
}
