use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TabError;
use crate::tsv::TsvRecord;

/// Number of (ID, Ref, CAS, Qual) groups a Peak ID row can hold.
pub const MAX_IDENTIFICATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    Genes,
    Busco,
    Readqc,
    Peaks,
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobKind::Genes => write!(f, "genes"),
            JobKind::Busco => write!(f, "busco"),
            JobKind::Readqc => write!(f, "readqc"),
            JobKind::Peaks => write!(f, "peaks"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunAccession(String);

impl RunAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunAccession {
    type Err = TabError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        // Accessions become path components, so no separators or dot-only names.
        let is_valid = !normalized.is_empty()
            && normalized.chars().any(|ch| ch.is_ascii_alphanumeric())
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '_' | '-' | '.'));
        if !is_valid {
            return Err(TabError::InvalidAccession(value.to_string()));
        }
        Ok(Self(normalized.to_string()))
    }
}

impl TryFrom<String> for RunAccession {
    type Error = TabError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RunAccession> for String {
    fn from(value: RunAccession) -> Self {
        value.0
    }
}

/// A record that could not be turned into a row, with the reason it was left out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedItem {
    pub item: String,
    pub reason: String,
}

impl SkippedItem {
    pub fn new(item: impl Into<String>, error: &TabError) -> Self {
        Self {
            item: item.into(),
            reason: error.to_string(),
        }
    }
}

/// Rows collected by one component plus the records it had to skip.
#[derive(Debug, Clone)]
pub struct Batch<T> {
    pub rows: Vec<T>,
    pub skipped: Vec<SkippedItem>,
}

impl<T> Batch<T> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn processed(&self) -> usize {
        self.rows.len() + self.skipped.len()
    }
}

impl<T> Default for Batch<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneCountRow {
    pub sample_name: String,
    pub bin: String,
    pub genes: usize,
}

impl TsvRecord for GeneCountRow {
    fn header() -> &'static [&'static str] {
        &["SampleName", "Bin", "Genes"]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.sample_name.clone(),
            self.bin.clone(),
            self.genes.to_string(),
        ]
    }
}

/// One BUSCO run against one bin. Statistics keep the text form they had in the JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuscoSummaryRow {
    pub sample_name: String,
    pub bin: String,
    pub specific: bool,
    pub lineage_dataset: String,
    pub lineage_buscos: String,
    pub lineage_species: String,
    pub complete: String,
    pub single_copy: String,
    pub multiple: String,
    pub fragmented: String,
    pub missing: String,
    pub number_of_markers: String,
    pub domain: String,
    pub scaffolds: String,
    pub contigs: String,
    pub total_length: String,
    pub gaps: String,
    pub scaffold_n50: String,
    pub contig_n50: String,
}

impl TsvRecord for BuscoSummaryRow {
    fn header() -> &'static [&'static str] {
        &[
            "SampleName",
            "Bin",
            "Specific",
            "LineageDataset",
            "LineageBUSCOs",
            "LineageSpecies",
            "Complete",
            "Single Copy",
            "Multiple",
            "Fragmented",
            "Missing",
            "Number of Markers",
            "Domain",
            "Scaffolds",
            "Contigs",
            "Total Length",
            "Gaps",
            "Scaffold N50",
            "Contig N50",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.sample_name.clone(),
            self.bin.clone(),
            if self.specific { "1" } else { "0" }.to_string(),
            self.lineage_dataset.clone(),
            self.lineage_buscos.clone(),
            self.lineage_species.clone(),
            self.complete.clone(),
            self.single_copy.clone(),
            self.multiple.clone(),
            self.fragmented.clone(),
            self.missing.clone(),
            self.number_of_markers.clone(),
            self.domain.clone(),
            self.scaffolds.clone(),
            self.contigs.clone(),
            self.total_length.clone(),
            self.gaps.clone(),
            self.scaffold_n50.clone(),
            self.contig_n50.clone(),
        ]
    }
}

/// Per-accession ReadQC metrics. HTML metrics stay empty when the report lacks them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadQcRow {
    pub run_accession: RunAccession,
    pub number_of_reads: String,
    pub mean_read_length: String,
    pub read_n50: String,
    pub mean_read_quality: String,
    pub total_bases_mbp: String,
    pub contig_count: usize,
    pub bin_count: usize,
    pub average_bin_n50: String,
}

impl TsvRecord for ReadQcRow {
    fn header() -> &'static [&'static str] {
        &[
            "run_accession",
            "number_of_reads",
            "mean_read_length",
            "read_n50",
            "mean_read_quality",
            "total_bases_mbp",
            "contig_count",
            "bin_count",
            "average_bin_n50",
        ]
    }

    fn fields(&self) -> Vec<String> {
        vec![
            self.run_accession.to_string(),
            self.number_of_reads.clone(),
            self.mean_read_length.clone(),
            self.read_n50.clone(),
            self.mean_read_quality.clone(),
            self.total_bases_mbp.clone(),
            self.contig_count.to_string(),
            self.bin_count.to_string(),
            self.average_bin_n50.clone(),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    pub name: String,
    pub reference: String,
    pub cas: String,
    pub quality: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeakRow {
    pub peak: String,
    pub rt: String,
    pub area_percent: String,
    pub identifications: Vec<Identification>,
}

impl TsvRecord for PeakRow {
    fn header() -> &'static [&'static str] {
        &[
            "Peak", "RT", "Area (%)", "ID #1", "Ref #1", "CAS #1", "Qual #1", "ID #2", "Ref #2",
            "CAS #2", "Qual #2", "ID #3", "Ref #3", "CAS #3", "Qual #3",
        ]
    }

    fn fields(&self) -> Vec<String> {
        let mut fields = vec![
            self.peak.clone(),
            self.rt.clone(),
            self.area_percent.clone(),
        ];
        for slot in 0..MAX_IDENTIFICATIONS {
            match self.identifications.get(slot) {
                Some(id) => fields.extend([
                    id.name.clone(),
                    id.reference.clone(),
                    id.cas.clone(),
                    id.quality.clone(),
                ]),
                None => fields.extend(std::iter::repeat_n(String::new(), 4)),
            }
        }
        fields
    }
}
