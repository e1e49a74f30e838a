use std::fs;

use assert_matches::assert_matches;
use camino::{Utf8Path, Utf8PathBuf};

use kira_tabulate::app::{App, ProgressEvent, ProgressSink, RunOptions};
use kira_tabulate::config::{BuscoJob, GenesJob, PeaksJob, ReadQcJob, ResolvedConfig};
use kira_tabulate::domain::JobKind;
use kira_tabulate::error::TabError;
use kira_tabulate::peaks::DEFAULT_PREAMBLE_LINES;
use kira_tabulate::readqc::DEFAULT_RUN_LABEL;

struct NoopSink;

impl ProgressSink for NoopSink {
    fn event(&self, _event: ProgressEvent) {}
}

fn temp_root() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
    (temp, root)
}

fn write(path: &Utf8Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap().as_std_path()).unwrap();
    fs::write(path.as_std_path(), content).unwrap();
}

fn read(path: &Utf8Path) -> String {
    fs::read_to_string(path.as_std_path()).unwrap()
}

fn peak_report(peaks: &[(&str, &str)]) -> String {
    let mut text = "banner\n".repeat(DEFAULT_PREAMBLE_LINES);
    for (idx, (name, qual)) in peaks.iter().enumerate() {
        text.push_str(&format!("{:>3} {:>8} {:>8}\n", idx + 1, "5.000", "1.50"));
        text.push_str(&format!(
            "{:17}{name:<40}{:>8} {:>12} {qual:>3}\n",
            "", "100", "000050-00-0"
        ));
    }
    text
}

#[test]
fn genes_job_writes_table_and_is_idempotent() {
    let (_temp, root) = temp_root();
    write(&root.join("in/busco_R018/R018_flye_bin_0001001.faa"), ">a\n>b\n");
    let job = GenesJob {
        input: root.join("in"),
        output: root.join("out/all_genes.tsv"),
    };
    let app = App::new(RunOptions::default());

    let summary = app.genes(&job, &NoopSink).unwrap();
    assert_eq!(summary.job, JobKind::Genes);
    assert_eq!(summary.rows, 1);
    let first = read(&job.output);
    assert_eq!(first, "SampleName\tBin\tGenes\nR018\t001\t2");

    app.genes(&job, &NoopSink).unwrap();
    assert_eq!(read(&job.output), first);
}

#[test]
fn dry_run_writes_nothing() {
    let (_temp, root) = temp_root();
    fs::create_dir_all(root.join("summaries").as_std_path()).unwrap();
    let job = BuscoJob {
        input: root.join("summaries"),
        output: root.join("busco.tsv"),
    };
    let app = App::new(RunOptions { dry_run: true });

    let summary = app.busco(&job, &NoopSink).unwrap();
    assert!(summary.dry_run);
    assert_eq!(summary.outputs, [job.output.to_string()]);
    assert!(!job.output.exists());
}

#[test]
fn peaks_job_writes_one_file_per_report_and_isolates_failures() {
    let (_temp, root) = temp_root();
    write(&root.join("Peak IDs/a.txt"), &peak_report(&[("Hexanal", "91")]));
    write(&root.join("Peak IDs/b.txt"), &peak_report(&[]));
    write(
        &root.join("Peak IDs/c.txt"),
        &format!("{}  7\n", "banner\n".repeat(DEFAULT_PREAMBLE_LINES)),
    );
    let job = PeaksJob {
        input: root.join("Peak IDs"),
        output: root.join("Peak ID TSVs"),
        preamble_lines: DEFAULT_PREAMBLE_LINES,
    };

    let summary = App::default().peaks(&job, &NoopSink).unwrap();
    assert_eq!(summary.processed, 3);
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.skipped.len(), 1);
    assert!(summary.skipped[0].item.ends_with("c.txt"));

    let a = read(&job.output.join("a.txt"));
    assert_eq!(a.lines().count(), 2);
    assert!(a.lines().nth(1).unwrap().starts_with("1\t5.000\t1.50\tHexanal\t100\t000050-00-0\t91"));
    let b = read(&job.output.join("b.txt"));
    assert_eq!(b.lines().count(), 1);
    assert!(!job.output.join("c.txt").exists());
}

#[test]
fn readqc_without_output_returns_the_table() {
    let (_temp, root) = temp_root();
    fs::create_dir_all(root.join("SRR1").as_std_path()).unwrap();
    let job = ReadQcJob {
        base: root.clone(),
        accessions: None,
        run_label: DEFAULT_RUN_LABEL.to_string(),
        output: None,
    };

    let outcome = App::default().readqc(&job, &NoopSink).unwrap();
    assert!(outcome.summary.skipped.is_empty());
    assert_eq!(outcome.summary.rows, 1);
    assert!(outcome.summary.outputs.is_empty());
    let table = outcome.table.unwrap();
    assert!(table.starts_with("run_accession\t"));
    assert_eq!(table.lines().nth(1), Some("SRR1\t\t\t\t\t\t0\t0\t0"));
}

#[test]
fn config_runs_jobs_in_order() {
    let (_temp, root) = temp_root();
    fs::create_dir_all(root.join("genes").as_std_path()).unwrap();
    fs::create_dir_all(root.join("peaks").as_std_path()).unwrap();
    let config = ResolvedConfig {
        schema_version: 1,
        genes: Some(GenesJob {
            input: root.join("genes"),
            output: root.join("genes.tsv"),
        }),
        busco: None,
        readqc: None,
        peaks: Some(PeaksJob {
            input: root.join("peaks"),
            output: root.join("peak_tsvs"),
            preamble_lines: DEFAULT_PREAMBLE_LINES,
        }),
    };

    let summaries = App::default().run_config(&config, &NoopSink).unwrap();
    let jobs = summaries.iter().map(|summary| summary.job).collect::<Vec<_>>();
    assert_eq!(jobs, [JobKind::Genes, JobKind::Peaks]);
    assert_eq!(read(&root.join("genes.tsv")), "SampleName\tBin\tGenes");
}

#[test]
fn gzipped_peak_report_is_written_without_gz_suffix() {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    let (_temp, root) = temp_root();
    let input = root.join("Peak IDs");
    fs::create_dir_all(input.as_std_path()).unwrap();
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(peak_report(&[("Octanal", "87")]).as_bytes())
        .unwrap();
    fs::write(input.join("run1.txt.gz").as_std_path(), encoder.finish().unwrap()).unwrap();
    let job = PeaksJob {
        input,
        output: root.join("Peak ID TSVs"),
        preamble_lines: DEFAULT_PREAMBLE_LINES,
    };

    let summary = App::default().peaks(&job, &NoopSink).unwrap();
    assert_eq!(summary.rows, 1);
    assert!(!job.output.join("run1.txt.gz").exists());
    let table = read(&job.output.join("run1.txt"));
    assert!(table.lines().nth(1).unwrap().contains("\tOctanal\t"));
}

#[test]
fn peaks_output_into_input_directory_is_rejected() {
    let (_temp, root) = temp_root();
    let report = root.join("Peak IDs/a.txt");
    let original = peak_report(&[("Hexanal", "91")]);
    write(&report, &original);
    let job = PeaksJob {
        input: root.join("Peak IDs"),
        output: root.join("Peak IDs/."),
        preamble_lines: DEFAULT_PREAMBLE_LINES,
    };

    let err = App::default().peaks(&job, &NoopSink).unwrap_err();
    assert_matches!(err, TabError::OutputIsInput(_));
    assert_eq!(read(&report), original);
}
