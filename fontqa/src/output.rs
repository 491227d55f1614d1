//! Rendering a [`Report`] for people and for machines.

use std::{
    collections::BTreeMap,
    fs,
    io::{self, Write},
    path::Path,
};

use chrono::{DateTime, Utc};
use qaengine::{Check, CheckResult, JobTimer, Report, Severity};
use serde::Serialize;

use crate::Error;

/// Results at least this bad are spelled out in the terminal.
const DETAIL_THRESHOLD: Severity = Severity::Warn;

/// The json document written by `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    fontqa_version: &'static str,
    generated: DateTime<Utc>,
    summary: &'a BTreeMap<Severity, usize>,
    results: &'a [CheckResult],
}

/// Write every non-passing result and a one line summary.
pub fn write_text(report: &Report, out: &mut impl Write) -> Result<(), io::Error> {
    for result in report
        .results()
        .iter()
        .filter(|r| r.verdict >= DETAIL_THRESHOLD)
    {
        writeln!(out, ">> {} on {}", result.check_id, result.entity)?;
        for status in result.statuses.iter() {
            let code = status
                .code
                .as_deref()
                .map(|c| format!(" [{c}]"))
                .unwrap_or_default();
            let mut lines = status.message.lines();
            writeln!(
                out,
                "   {}{code}: {}",
                status.severity,
                lines.next().unwrap_or_default()
            )?;
            for line in lines {
                writeln!(out, "      {line}")?;
            }
        }
        if let Some(error) = &result.error {
            writeln!(out, "   ({}) {}", error.kind, error.context)?;
        }
        writeln!(out)?;
    }
    writeln!(out, "{}", summary_line(report))
}

/// E.g. "ERROR: 0 | FAIL: 1 | WARN: 0 | SKIP: 3 | PASS: 12"
pub fn summary_line(report: &Report) -> String {
    Severity::ALL
        .iter()
        .rev()
        .filter(|s| s.is_substantive())
        .map(|s| format!("{s}: {}", report.count(*s)))
        .collect::<Vec<_>>()
        .join(" | ")
}

pub fn to_json(report: &Report) -> Result<String, Error> {
    let doc = JsonReport {
        fontqa_version: env!("CARGO_PKG_VERSION"),
        generated: Utc::now(),
        summary: report.summary(),
        results: report.results(),
    };
    serde_json::to_string_pretty(&doc).map_err(Into::into)
}

pub fn write_json(report: &Report, path: &Path) -> Result<(), Error> {
    fs::write(path, to_json(report)?).map_err(|source| Error::IoError {
        path: path.to_path_buf(),
        source,
    })
}

pub fn write_timing(timer: &mut JobTimer, path: &Path) -> Result<(), Error> {
    let io_err = |source| Error::IoError {
        path: path.to_path_buf(),
        source,
    };
    let mut file = io::BufWriter::new(fs::File::create(path).map_err(io_err)?);
    timer.write_svg(&mut file).map_err(io_err)?;
    file.flush().map_err(io_err)
}

/// One line per check, with its scope, then the title.
pub fn write_check_list(checks: &[&Check], out: &mut impl Write) -> Result<(), io::Error> {
    for check in checks {
        writeln!(out, "{} ({})", check.id(), check.scope())?;
        if !check.title().is_empty() {
            writeln!(out, "    {}", check.title())?;
        }
    }
    Ok(())
}
