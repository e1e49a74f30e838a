use std::fs;
use std::io::Write;

use camino::Utf8Path;

use crate::error::TabError;

/// A fixed-column row that can be serialised as one TSV line.
pub trait TsvRecord {
    fn header() -> &'static [&'static str];
    fn fields(&self) -> Vec<String>;
}

/// Header line followed by one line per row, joined by `\n` with no trailing newline.
pub fn render_tsv<T: TsvRecord>(rows: &[T]) -> String {
    let mut out = T::header().join("\t");
    for row in rows {
        out.push('\n');
        let fields = row
            .fields()
            .iter()
            .map(|field| sanitize_field(field))
            .collect::<Vec<_>>();
        out.push_str(&fields.join("\t"));
    }
    out
}

/// Tabs and line breaks inside a value would split the row; collapse them to a space.
pub fn sanitize_field(value: &str) -> String {
    if !value.contains(['\t', '\n', '\r']) {
        return value.to_string();
    }
    value.replace(['\t', '\n', '\r'], " ")
}

pub fn write_tsv_atomic(path: &Utf8Path, content: &str) -> Result<(), TabError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| TabError::Filesystem(format!("create {parent}: {err}")))?;
    let mut temp = tempfile::Builder::new()
        .prefix(".kira-tab")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| TabError::Filesystem(err.to_string()))?;
    temp.write_all(content.as_bytes())
        .map_err(|err| TabError::Filesystem(format!("write {path}: {err}")))?;
    if path.as_std_path().exists() {
        fs::remove_file(path.as_std_path())
            .map_err(|err| TabError::Filesystem(format!("replace {path}: {err}")))?;
    }
    temp.persist(path.as_std_path())
        .map_err(|err| TabError::Filesystem(format!("persist {path}: {}", err.error)))?;
    Ok(())
}
