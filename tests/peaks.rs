use camino::Utf8Path;

use kira_tabulate::domain::PeakRow;
use kira_tabulate::peaks::{DEFAULT_PREAMBLE_LINES, parse_peak_report};
use kira_tabulate::tsv::{TsvRecord, render_tsv};

fn preamble() -> String {
    (1..=DEFAULT_PREAMBLE_LINES)
        .map(|idx| format!("Library Search Report banner line {idx}\n"))
        .collect()
}

fn peak_header(peak: u32, rt: &str, area: &str) -> String {
    format!("{peak:>3} {rt:>8} {area:>8}  C:\\Database\\NIST11.L\n")
}

fn name_start(name: &str, reference: &str, cas: &str, qual: &str) -> String {
    format!("{:17}{name:<40}{reference:>8} {cas:>12} {qual:>3}\n", "")
}

fn continuation(text: &str) -> String {
    format!("{:17}{text}\n", "")
}

fn two_peak_report() -> String {
    let mut text = preamble();
    text.push_str(&peak_header(1, "3.512", "0.42"));
    text.push_str(&name_start("Hexanal", "5678", "000066-25-1", "91"));
    text.push_str(&peak_header(2, "7.804", "12.17"));
    text.push_str(&name_start("Nonane", "1234", "000111-84-2", "90"));
    text.push_str(&name_start("Octane, 2-methyl-", "1100", "003221-61-2", "72"));
    text.push_str(&name_start("Heptane, 3-ethyl-", "1101", "015869-80-4", "64"));
    text
}

#[test]
fn two_peaks_fill_one_and_three_identification_slots() {
    let rows = parse_peak_report(Utf8Path::new("sample.txt"), &two_peak_report(), DEFAULT_PREAMBLE_LINES)
        .unwrap();
    assert_eq!(rows.len(), 2);

    let first = rows[0].fields();
    assert_eq!(first.len(), 15);
    assert_eq!(&first[..3], ["1", "3.512", "0.42"]);
    assert_eq!(&first[3..7], ["Hexanal", "5678", "000066-25-1", "91"]);
    assert!(first[7..].iter().all(String::is_empty));

    let second = rows[1].fields();
    assert!(second.iter().all(|field| !field.is_empty()));
    assert_eq!(second[3], "Nonane");
    assert_eq!(second[7], "Octane, 2-methyl-");
    assert_eq!(second[11], "Heptane, 3-ethyl-");
    assert_eq!(second[14], "64");
}

#[test]
fn continuation_lines_are_prepended() {
    let mut text = preamble();
    text.push_str(&peak_header(1, "4.100", "1.00"));
    text.push_str(&name_start("Beta", "42", "000100-00-0", "80"));
    text.push_str(&continuation("Alpha"));
    let rows = parse_peak_report(Utf8Path::new("wrap.txt"), &text, DEFAULT_PREAMBLE_LINES).unwrap();
    assert_eq!(rows[0].identifications[0].name, "Alpha Beta");
}

#[test]
fn each_continuation_goes_in_front() {
    let mut text = preamble();
    text.push_str(&peak_header(1, "4.100", "1.00"));
    text.push_str(&name_start("Gamma", "42", "000100-00-0", "80"));
    text.push_str(&continuation("Beta"));
    text.push_str(&continuation("Alpha"));
    text.push_str(&peak_header(2, "5.200", "2.00"));
    let rows = parse_peak_report(Utf8Path::new("wrap.txt"), &text, DEFAULT_PREAMBLE_LINES).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].identifications.len(), 1);
    assert_eq!(rows[0].identifications[0].name, "Alpha Beta Gamma");
    assert_eq!(rows[0].identifications[0].quality, "80");
}

#[test]
fn peak_without_compounds_keeps_empty_slots() {
    let mut text = preamble();
    text.push_str(&peak_header(1, "4.100", "1.00"));
    let rows = parse_peak_report(Utf8Path::new("bare.txt"), &text, DEFAULT_PREAMBLE_LINES).unwrap();
    let rendered = render_tsv(&rows);
    let data_line = rendered.lines().nth(1).unwrap();
    assert_eq!(data_line, format!("1\t4.100\t1.00{}", "\t".repeat(12)));
}

#[test]
fn report_without_peaks_renders_header_only() {
    let rows = parse_peak_report(Utf8Path::new("empty.txt"), &preamble(), DEFAULT_PREAMBLE_LINES).unwrap();
    assert!(rows.is_empty());
    assert_eq!(render_tsv(&rows), PeakRow::header().join("\t"));
}

#[test]
fn preamble_lines_are_never_scanned() {
    let mut text = String::new();
    for _ in 0..DEFAULT_PREAMBLE_LINES {
        text.push_str(&peak_header(9, "1.000", "9.99"));
    }
    text.push_str(&peak_header(1, "3.512", "0.42"));
    let rows = parse_peak_report(Utf8Path::new("banner.txt"), &text, DEFAULT_PREAMBLE_LINES).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].peak, "1");
}
