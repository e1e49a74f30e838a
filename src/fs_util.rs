use std::fs;
use std::io::Read;

use camino::{Utf8Path, Utf8PathBuf};
use flate2::read::MultiGzDecoder;

use crate::error::TabError;

/// Read a text input, inflating `*.gz` files on the way. Invalid UTF-8 is replaced.
pub fn read_text(path: &Utf8Path) -> Result<String, TabError> {
    if !path.is_file() {
        return Err(TabError::MissingInputFile(path.to_owned()));
    }
    let bytes =
        fs::read(path.as_std_path()).map_err(|err| TabError::Filesystem(format!("read {path}: {err}")))?;
    if path.extension() != Some("gz") {
        return Ok(String::from_utf8_lossy(&bytes).into_owned());
    }
    let mut decoder = MultiGzDecoder::new(bytes.as_slice());
    let mut inflated = Vec::new();
    decoder
        .read_to_end(&mut inflated)
        .map_err(|err| TabError::format(path, format!("gzip: {err}")))?;
    Ok(String::from_utf8_lossy(&inflated).into_owned())
}

/// Directory entries ordered by file name, so repeated runs see the same order.
pub fn sorted_entries(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, TabError> {
    if !dir.is_dir() {
        return Err(TabError::MissingInputFile(dir.to_owned()));
    }
    let entries = dir
        .read_dir_utf8()
        .map_err(|err| TabError::Filesystem(format!("list {dir}: {err}")))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| TabError::Filesystem(format!("list {dir}: {err}")))?;
        paths.push(entry.into_path());
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(paths)
}

pub fn sorted_files(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, TabError> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|path| path.is_file())
        .collect())
}

pub fn sorted_dirs(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, TabError> {
    Ok(sorted_entries(dir)?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect())
}

pub fn file_name(path: &Utf8Path) -> &str {
    path.file_name().unwrap_or(path.as_str())
}

/// File name with a trailing `.gz` removed, for outputs written uncompressed.
pub fn plain_file_name(path: &Utf8Path) -> &str {
    let name = file_name(path);
    name.strip_suffix(".gz").filter(|stem| !stem.is_empty()).unwrap_or(name)
}

/// Whether two paths name the same directory, resolving links when both exist.
pub fn same_dir(a: &Utf8Path, b: &Utf8Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize_utf8(), b.canonicalize_utf8()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
