//! Scanner for GC-MS "Peak ID" text exports.
//!
//! The export is column-positional. A peak header line starts the next row, and
//! compound detail lines (indented by 17 columns) carry up to three candidate
//! identifications per peak. A candidate's name can wrap over several physical
//! lines: the first line ends in `Ref CAS Qual`, and each following line holds
//! more of the name. Fragments are assembled in reverse arrival order: each
//! continuation line goes in front of what was collected so far.

use std::sync::LazyLock;

use camino::Utf8Path;
use regex::Regex;
use tracing::warn;

use crate::domain::{Identification, MAX_IDENTIFICATIONS, PeakRow};
use crate::error::TabError;
use crate::fs_util;

/// Lines of report banner before the first peak.
pub const DEFAULT_PREAMBLE_LINES: usize = 18;

static PEAK_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s{0,2}[0-9]").unwrap());
static COMPOUND_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s{17}").unwrap());
static NAME_START_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r".{72}[0-9]{1,2}$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    PeakHeader,
    NameStart,
    NameContinuation,
    Other,
}

pub fn classify_line(line: &str) -> LineKind {
    if PEAK_HEADER_RE.is_match(line) {
        LineKind::PeakHeader
    } else if COMPOUND_RE.is_match(line) {
        if NAME_START_RE.is_match(line) {
            LineKind::NameStart
        } else {
            LineKind::NameContinuation
        }
    } else {
        LineKind::Other
    }
}

/// Tokens that contain at least one ASCII letter, joined by single spaces.
pub fn name_fragment(tokens: &[&str]) -> String {
    tokens
        .iter()
        .filter(|token| token.chars().any(|ch| ch.is_ascii_alphabetic()))
        .copied()
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug)]
struct PartialName {
    name: String,
    reference: String,
    cas: String,
    quality: String,
}

impl PartialName {
    fn prepend(&mut self, fragment: &str) {
        if fragment.is_empty() {
            return;
        }
        if self.name.is_empty() {
            self.name = fragment.to_string();
        } else {
            self.name = format!("{fragment} {}", self.name);
        }
    }

    fn into_identification(self) -> Identification {
        Identification {
            name: self.name,
            reference: self.reference,
            cas: self.cas,
            quality: self.quality,
        }
    }
}

#[derive(Debug, Default)]
enum NameState {
    #[default]
    Idle,
    Accumulating(PartialName),
}

/// Single-pass scanner over the lines of one report.
pub struct PeakScanner<'a> {
    path: &'a Utf8Path,
    pending: Option<PeakRow>,
    name: NameState,
    rows: Vec<PeakRow>,
}

impl<'a> PeakScanner<'a> {
    pub fn new(path: &'a Utf8Path) -> Self {
        Self {
            path,
            pending: None,
            name: NameState::Idle,
            rows: Vec::new(),
        }
    }

    /// Feed one physical line; `line_no` is 1-based and only used in messages.
    pub fn push_line(&mut self, line_no: usize, line: &str) -> Result<(), TabError> {
        match classify_line(line) {
            LineKind::PeakHeader => {
                self.flush_peak();
                let tokens = line.split_whitespace().take(3).collect::<Vec<_>>();
                let [peak, rt, area] = tokens.as_slice() else {
                    return Err(TabError::format(
                        self.path,
                        format!("line {line_no}: peak header needs Peak, RT and Area columns"),
                    ));
                };
                self.pending = Some(PeakRow {
                    peak: peak.to_string(),
                    rt: rt.to_string(),
                    area_percent: area.to_string(),
                    identifications: Vec::new(),
                });
            }
            LineKind::NameStart => {
                self.flush_name();
                let tokens = line.split_whitespace().collect::<Vec<_>>();
                if tokens.len() < 3 {
                    return Err(TabError::format(
                        self.path,
                        format!("line {line_no}: compound line needs Ref, CAS and Qual columns"),
                    ));
                }
                let (name_tokens, ids) = tokens.split_at(tokens.len() - 3);
                self.name = NameState::Accumulating(PartialName {
                    name: name_fragment(name_tokens),
                    reference: ids[0].to_string(),
                    cas: ids[1].to_string(),
                    quality: ids[2].to_string(),
                });
            }
            LineKind::NameContinuation => {
                if let NameState::Accumulating(partial) = &mut self.name {
                    let tokens = line.split_whitespace().collect::<Vec<_>>();
                    partial.prepend(&name_fragment(&tokens));
                }
            }
            LineKind::Other => {}
        }
        Ok(())
    }

    /// Close the name in progress (if any) and the pending peak, then return all rows.
    pub fn finish(mut self) -> Vec<PeakRow> {
        self.flush_peak();
        self.rows
    }

    fn flush_name(&mut self) {
        let NameState::Accumulating(partial) = std::mem::take(&mut self.name) else {
            return;
        };
        let identification = partial.into_identification();
        match self.pending.as_mut() {
            Some(row) if row.identifications.len() < MAX_IDENTIFICATIONS => {
                row.identifications.push(identification);
            }
            Some(row) => warn!(
                "{}: peak {} already has {MAX_IDENTIFICATIONS} identifications, dropping `{}`",
                self.path, row.peak, identification.name
            ),
            None => warn!(
                "{}: compound `{}` appears before any peak, dropping it",
                self.path, identification.name
            ),
        }
    }

    fn flush_peak(&mut self) {
        self.flush_name();
        if let Some(row) = self.pending.take() {
            self.rows.push(row);
        }
    }
}

/// Parse report text, skipping the first `preamble_lines` lines.
pub fn parse_peak_report(
    path: &Utf8Path,
    text: &str,
    preamble_lines: usize,
) -> Result<Vec<PeakRow>, TabError> {
    let mut scanner = PeakScanner::new(path);
    for (idx, line) in text.lines().enumerate().skip(preamble_lines) {
        scanner.push_line(idx + 1, line)?;
    }
    Ok(scanner.finish())
}

pub fn parse_peak_file(path: &Utf8Path, preamble_lines: usize) -> Result<Vec<PeakRow>, TabError> {
    let text = fs_util::read_text(path)?;
    parse_peak_report(path, &text, preamble_lines)
}
