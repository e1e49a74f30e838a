use camino::Utf8PathBuf;
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum TabError {
    #[error("input not found: {0}")]
    #[diagnostic(help("check the input path or the directory layout it points to"))]
    MissingInputFile(Utf8PathBuf),

    #[error("unexpected format in {path}: {detail}")]
    UnexpectedFormat { path: Utf8PathBuf, detail: String },

    #[error("missing field `{field}` in {path}")]
    MissingField { path: Utf8PathBuf, field: String },

    #[error("cannot average {0}: no data rows")]
    EmptyDenominator(String),

    #[error("missing config file kira-tab.json in current directory")]
    MissingConfig,

    #[error("failed to read config file at {0}")]
    ConfigRead(Utf8PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("invalid run accession: {0}")]
    InvalidAccession(String),

    #[error("output directory {0} is the input directory")]
    #[diagnostic(help("choose a separate output directory so reports are not overwritten"))]
    OutputIsInput(Utf8PathBuf),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl TabError {
    pub(crate) fn format(path: &camino::Utf8Path, detail: impl Into<String>) -> Self {
        TabError::UnexpectedFormat {
            path: path.to_owned(),
            detail: detail.into(),
        }
    }
}
