use std::io;
use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use kira_tabulate::app::{App, ProgressSink, RunOptions, RunSummary};
use kira_tabulate::config::{BuscoJob, ConfigLoader, GenesJob, PeaksJob, ReadQcJob};
use kira_tabulate::domain::RunAccession;
use kira_tabulate::error::TabError;
use kira_tabulate::fs_util;
use kira_tabulate::output::{JsonOutput, OutputMode, TextOutput};
use kira_tabulate::peaks::DEFAULT_PREAMBLE_LINES;
use kira_tabulate::readqc::DEFAULT_RUN_LABEL;

#[derive(Parser)]
#[command(name = "kira-tab")]
#[command(about = "Flatten BUSCO, ReadQC, gene FASTA and Peak ID reports into TSV tables")]
#[command(version, author)]
struct Cli {
    /// Print the run summary as JSON on stdout.
    #[arg(long, global = true)]
    json: bool,

    /// Build the tables without writing them.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Count predicted genes per sample and bin")]
    Genes(GenesArgs),
    #[command(about = "Aggregate BUSCO JSON summaries")]
    Busco(BuscoArgs),
    #[command(about = "Summarise ReadQC reports per run accession")]
    Readqc(ReadQcArgs),
    #[command(about = "Convert Peak ID text reports, one TSV per report")]
    Peaks(PeaksArgs),
    #[command(about = "Run every job listed in kira-tab.json")]
    Run(RunArgs),
}

#[derive(Args)]
struct GenesArgs {
    /// Directory with one sub-directory of gene FASTA files per sample.
    #[arg(long, env = "KIRA_TAB_GENES_INPUT")]
    input: Utf8PathBuf,

    #[arg(long, env = "KIRA_TAB_GENES_OUTPUT")]
    output: Utf8PathBuf,
}

#[derive(Args)]
struct BuscoArgs {
    /// Directory of BUSCO short_summary JSON files.
    #[arg(long, env = "KIRA_TAB_BUSCO_INPUT")]
    input: Utf8PathBuf,

    #[arg(long, env = "KIRA_TAB_BUSCO_OUTPUT")]
    output: Utf8PathBuf,
}

#[derive(Args)]
struct ReadQcArgs {
    /// Run accessions; every accession-named directory under --base when omitted.
    accessions: Vec<String>,

    #[arg(long, env = "KIRA_TAB_READQC_BASE")]
    base: Utf8PathBuf,

    /// File with one accession per line (`#` starts a comment).
    #[arg(long)]
    accessions_file: Option<Utf8PathBuf>,

    #[arg(long, default_value = DEFAULT_RUN_LABEL)]
    run_label: String,

    /// Defaults to stdout.
    #[arg(long, env = "KIRA_TAB_READQC_OUTPUT")]
    output: Option<Utf8PathBuf>,
}

#[derive(Args)]
struct PeaksArgs {
    /// Folder of Peak ID text exports.
    #[arg(long, env = "KIRA_TAB_PEAKS_INPUT")]
    input: Utf8PathBuf,

    /// Folder that receives one TSV per report.
    #[arg(long, env = "KIRA_TAB_PEAKS_OUTPUT")]
    output: Utf8PathBuf,

    #[arg(long, default_value_t = DEFAULT_PREAMBLE_LINES)]
    preamble_lines: usize,
}

#[derive(Args)]
struct RunArgs {
    #[arg(long)]
    config: Option<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<TabError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &TabError) -> u8 {
    match error {
        TabError::MissingInputFile(_) | TabError::MissingConfig | TabError::ConfigRead(_) => 2,
        TabError::UnexpectedFormat { .. }
        | TabError::MissingField { .. }
        | TabError::ConfigParse(_)
        | TabError::InvalidAccession(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Json => &JsonOutput,
        OutputMode::Text => &TextOutput,
    };
    let app = App::new(RunOptions {
        dry_run: cli.dry_run,
    });

    match cli.command {
        Commands::Genes(args) => {
            let job = GenesJob {
                input: args.input,
                output: args.output,
            };
            let summary = app.genes(&job, sink)?;
            report(output_mode, &[summary])
        }
        Commands::Busco(args) => {
            let job = BuscoJob {
                input: args.input,
                output: args.output,
            };
            let summary = app.busco(&job, sink)?;
            report(output_mode, &[summary])
        }
        Commands::Readqc(args) => run_readqc(args, &app, sink, output_mode),
        Commands::Peaks(args) => {
            let job = PeaksJob {
                input: args.input,
                output: args.output,
                preamble_lines: args.preamble_lines,
            };
            let summary = app.peaks(&job, sink)?;
            report(output_mode, &[summary])
        }
        Commands::Run(args) => {
            let config = ConfigLoader::resolve(args.config.as_deref())?;
            if config.is_empty() {
                return Err(miette::Report::msg("config lists no jobs"));
            }
            let summaries = app.run_config(&config, sink)?;
            report(output_mode, &summaries)
        }
    }
}

fn run_readqc(
    args: ReadQcArgs,
    app: &App,
    sink: &dyn ProgressSink,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let mut values = args.accessions;
    if let Some(path) = &args.accessions_file {
        let text = fs_util::read_text(path)?;
        values.extend(
            text.lines()
                .map(|line| line.split('#').next().unwrap_or("").trim())
                .filter(|line| !line.is_empty())
                .map(str::to_string),
        );
    }
    let accessions = if values.is_empty() {
        None
    } else {
        Some(
            values
                .iter()
                .map(|value| value.parse::<RunAccession>())
                .collect::<Result<Vec<_>, TabError>>()?,
        )
    };

    let job = ReadQcJob {
        base: args.base,
        accessions,
        run_label: args.run_label,
        output: args.output,
    };
    let outcome = app.readqc(&job, sink)?;
    match outcome.table {
        // The table owns stdout, so the summary goes to stderr.
        Some(table) => {
            println!("{table}");
            let summaries = [outcome.summary];
            let printed = match output_mode {
                OutputMode::Json => JsonOutput::print_json(&mut io::stderr(), &summaries[..]),
                OutputMode::Text => TextOutput::print_summaries(&mut io::stderr(), &summaries),
            };
            printed.into_diagnostic()
        }
        None => report(output_mode, &[outcome.summary]),
    }
}

fn report(output_mode: OutputMode, summaries: &[RunSummary]) -> miette::Result<()> {
    match output_mode {
        OutputMode::Json => JsonOutput::print_summaries(summaries).into_diagnostic(),
        OutputMode::Text => TextOutput::print_summaries(&mut io::stderr(), summaries).into_diagnostic(),
    }
}
