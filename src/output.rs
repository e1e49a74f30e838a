use std::io::{self, Write};

use serde::Serialize;

use crate::app::{ProgressEvent, ProgressSink, RunSummary};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summaries(summaries: &[RunSummary]) -> io::Result<()> {
        Self::print_json(&mut io::stdout(), summaries)
    }

    pub fn print_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Human-readable progress on stderr.
pub struct TextOutput;

impl TextOutput {
    pub fn print_summaries<W: Write>(writer: &mut W, summaries: &[RunSummary]) -> io::Result<()> {
        let green = "\x1b[32m";
        let yellow = "\x1b[33m";
        let cyan = "\x1b[36m";
        let reset = "\x1b[0m";

        for summary in summaries {
            writeln!(writer, "{cyan}kira-tab {}{reset}", summary.job)?;
            writeln!(
                writer,
                "{green}  rows written: {} (from {} record(s)){reset}",
                summary.rows, summary.processed
            )?;
            if summary.superseded > 0 {
                writeln!(
                    writer,
                    "{green}  superseded by specific runs: {}{reset}",
                    summary.superseded
                )?;
            }
            if summary.conflicts > 0 {
                writeln!(
                    writer,
                    "{yellow}  conflicting duplicates kept: {}{reset}",
                    summary.conflicts
                )?;
            }
            writeln!(writer, "{yellow}  skipped: {}{reset}", summary.skipped.len())?;
            for item in &summary.skipped {
                writeln!(writer, "{yellow}    - {}: {}{reset}", item.item, item.reason)?;
            }
            let verb = if summary.dry_run { "would write" } else { "wrote" };
            for output in &summary.outputs {
                writeln!(writer, "  {verb} {output}")?;
            }
        }
        Ok(())
    }
}

impl ProgressSink for TextOutput {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("{} ({:.2?})", event.message, elapsed),
            None => eprintln!("{}", event.message),
        }
    }
}
