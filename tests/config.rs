use std::fs;

use assert_matches::assert_matches;
use camino::Utf8PathBuf;

use kira_tabulate::config::ConfigLoader;
use kira_tabulate::error::TabError;

#[test]
fn relative_paths_follow_the_config_file() {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    let path = root.join("kira-tab.json");
    fs::write(
        path.as_std_path(),
        r#"{
            "schema_version": 1,
            "genes": {"input": "busco_genes", "output": "/abs/all_genes.tsv"},
            "readqc": {"base": "runs", "accessions": ["SRR1", "SRR2"], "run_label": "RUN02", "output": "readqc.tsv"}
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(Some(path.as_str())).unwrap();
    let genes = resolved.genes.unwrap();
    assert_eq!(genes.input, root.join("busco_genes"));
    assert_eq!(genes.output, Utf8PathBuf::from("/abs/all_genes.tsv"));
    let readqc = resolved.readqc.unwrap();
    assert_eq!(readqc.run_label, "RUN02");
    assert_eq!(readqc.accessions.unwrap().len(), 2);
    assert_eq!(readqc.output, Some(root.join("readqc.tsv")));
    assert!(resolved.busco.is_none());
}

#[test]
fn invalid_accession_in_config_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("kira-tab.json")).unwrap();
    fs::write(
        path.as_std_path(),
        r#"{"readqc": {"base": "runs", "accessions": ["../etc"], "output": "o.tsv"}}"#,
    )
    .unwrap();

    let err = ConfigLoader::resolve(Some(path.as_str())).unwrap_err();
    assert_matches!(err, TabError::InvalidAccession(_));
}

#[test]
fn malformed_config_is_a_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = Utf8PathBuf::from_path_buf(temp.path().join("kira-tab.json")).unwrap();
    fs::write(path.as_std_path(), "{ not json").unwrap();

    let err = ConfigLoader::resolve(Some(path.as_str())).unwrap_err();
    assert_matches!(err, TabError::ConfigParse(_));
}

#[test]
fn explicit_missing_config_is_a_read_error() {
    let err = ConfigLoader::resolve(Some("/no/such/kira-tab.json")).unwrap_err();
    assert_matches!(err, TabError::ConfigRead(_));
}
