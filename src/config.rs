use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::domain::RunAccession;
use crate::error::TabError;
use crate::peaks::DEFAULT_PREAMBLE_LINES;
use crate::readqc::DEFAULT_RUN_LABEL;

pub const DEFAULT_CONFIG_FILE: &str = "kira-tab.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub genes: Option<PathsEntry>,
    #[serde(default)]
    pub busco: Option<PathsEntry>,
    #[serde(default)]
    pub readqc: Option<ReadQcEntry>,
    #[serde(default)]
    pub peaks: Option<PeaksEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PathsEntry {
    pub input: String,
    pub output: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ReadQcEntry {
    pub base: String,
    #[serde(default)]
    pub accessions: Option<Vec<String>>,
    #[serde(default)]
    pub run_label: Option<String>,
    pub output: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct PeaksEntry {
    pub input: String,
    pub output: String,
    #[serde(default)]
    pub preamble_lines: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenesJob {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuscoJob {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadQcJob {
    pub base: Utf8PathBuf,
    /// `None` means every accession-named directory under `base`.
    pub accessions: Option<Vec<RunAccession>>,
    pub run_label: String,
    /// `None` sends the table to stdout.
    pub output: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeaksJob {
    pub input: Utf8PathBuf,
    pub output: Utf8PathBuf,
    pub preamble_lines: usize,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub genes: Option<GenesJob>,
    pub busco: Option<BuscoJob>,
    pub readqc: Option<ReadQcJob>,
    pub peaks: Option<PeaksJob>,
}

impl ResolvedConfig {
    pub fn is_empty(&self) -> bool {
        self.genes.is_none() && self.busco.is_none() && self.readqc.is_none() && self.peaks.is_none()
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, TabError> {
        let config_path = match path {
            Some(path) => Utf8PathBuf::from(path),
            None => Utf8PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Err(TabError::MissingConfig);
        }

        let content = fs::read_to_string(config_path.as_std_path())
            .map_err(|_| TabError::ConfigRead(config_path.clone()))?;
        let config: Config =
            serde_json::from_str(&content).map_err(|err| TabError::ConfigParse(err.to_string()))?;

        let base_dir = config_path.parent().unwrap_or(Utf8Path::new(""));
        Self::resolve_config(config, base_dir)
    }

    /// Relative paths in `config` are taken relative to `base_dir`.
    pub fn resolve_config(config: Config, base_dir: &Utf8Path) -> Result<ResolvedConfig, TabError> {
        let schema_version = config.schema_version.unwrap_or(1);
        let path = |value: &str| base_dir.join(value);

        let genes = config.genes.map(|entry| GenesJob {
            input: path(&entry.input),
            output: path(&entry.output),
        });
        let busco = config.busco.map(|entry| BuscoJob {
            input: path(&entry.input),
            output: path(&entry.output),
        });
        let readqc = config
            .readqc
            .map(|entry| {
                let accessions = entry
                    .accessions
                    .map(|values| {
                        values
                            .iter()
                            .map(|value| value.parse::<RunAccession>())
                            .collect::<Result<Vec<_>, TabError>>()
                    })
                    .transpose()?;
                Ok::<_, TabError>(ReadQcJob {
                    base: path(&entry.base),
                    accessions,
                    run_label: entry
                        .run_label
                        .unwrap_or_else(|| DEFAULT_RUN_LABEL.to_string()),
                    output: Some(path(&entry.output)),
                })
            })
            .transpose()?;
        let peaks = config.peaks.map(|entry| PeaksJob {
            input: path(&entry.input),
            output: path(&entry.output),
            preamble_lines: entry.preamble_lines.unwrap_or(DEFAULT_PREAMBLE_LINES),
        });

        Ok(ResolvedConfig {
            schema_version,
            genes,
            busco,
            readqc,
            peaks,
        })
    }
}
