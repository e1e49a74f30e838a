//! Turn bioinformatics report outputs into flat TSV tables.
//!
//! Each component reads one kind of report and yields fixed-field rows:
//! [`genes`] counts FASTA headers per bin, [`busco`] aggregates BUSCO JSON
//! summaries, [`readqc`] scrapes ReadQC HTML/CSV/TXT outputs per run, and
//! [`peaks`] converts GC-MS Peak ID exports. [`app::App`] runs them with
//! per-record error isolation and writes the tables.

pub mod app;
pub mod busco;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod genes;
pub mod output;
pub mod peaks;
pub mod readqc;
pub mod tsv;
