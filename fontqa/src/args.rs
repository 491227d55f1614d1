//! Command line arguments

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use qaengine::{GroupBy, Severity};

/// Which fonts of yours would you like checked today?
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(version, about)]
pub struct Args {
    /// Font files, or directories containing font files
    #[arg(required_unless_present = "list_checks")]
    pub inputs: Vec<PathBuf>,

    /// Only run checks whose id matches one of these regexes
    #[arg(short = 'c', long = "checkid")]
    pub checkid: Vec<String>,

    /// Don't run checks whose id matches one of these regexes
    #[arg(short = 'x', long = "exclude-checkid")]
    pub exclude_checkid: Vec<String>,

    /// A yaml file with check exclusions and per-check options
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Also write the report, as json, to this file
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// How fonts are grouped into families
    #[arg(long, value_enum)]
    #[clap(default_value = "directory")]
    pub group_by: Grouping,

    /// Number of threads to run checks on. 0 uses every core.
    ///
    /// Overrides the config file. Defaults to 1, which runs checks in order on
    /// the main thread.
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// List every item in messages rather than a sample
    #[arg(long)]
    #[clap(default_value = "false")]
    pub full_lists: bool,

    /// Write an svg timeline of which check ran where, and when, to this file
    #[arg(long)]
    pub emit_timing: Option<PathBuf>,

    /// Print the checks that would run and exit
    #[arg(long)]
    #[clap(default_value = "false")]
    pub list_checks: bool,

    /// Exit unsuccessfully if any result is at least this bad
    #[arg(long)]
    #[clap(default_value = "FAIL")]
    pub error_on: Severity,
}

/// Command line spelling of [`GroupBy`].
#[derive(ValueEnum, Debug, Copy, Clone, PartialEq, Eq)]
pub enum Grouping {
    Directory,
    FamilyName,
}

impl From<Grouping> for GroupBy {
    fn from(value: Grouping) -> Self {
        match value {
            Grouping::Directory => GroupBy::Directory,
            Grouping::FamilyName => GroupBy::FamilyName,
        }
    }
}

impl Args {
    /// Arguments to check `inputs` with everything else defaulted.
    pub fn new(inputs: Vec<PathBuf>) -> Args {
        Args {
            inputs,
            checkid: Vec::new(),
            exclude_checkid: Vec::new(),
            config: None,
            json: None,
            group_by: Grouping::Directory,
            jobs: None,
            full_lists: false,
            emit_timing: None,
            list_checks: false,
            error_on: Severity::Fail,
        }
    }
}
