//! A font quality assurance tool.
//!
//! Loads fonts, picks checks and hands both to [`qaengine`].

mod args;
mod config;
mod error;
pub mod output;

pub use args::{Args, Grouping};
pub use config::Config;
pub use error::Error;

use log::info;
use qaengine::{Check, Registry, Report, RunContext, Runner, Severity};

/// Every check fontqa knows about.
pub fn registry() -> Result<Registry, Error> {
    let mut registry = Registry::new();
    qachecks::register_all(&mut registry)?;
    Ok(registry)
}

pub fn load_config(args: &Args) -> Result<Config, Error> {
    match &args.config {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    }
}

/// The checks `args` would run, in the order they are registered.
pub fn selected_checks<'a>(
    args: &Args,
    registry: &'a Registry,
) -> Result<Vec<&'a Check>, Error> {
    load_config(args)?.select(args, registry)
}

/// Check the fonts named by `args`.
///
/// Writes the json report and timing svg if asked to.
pub fn run(args: &Args) -> Result<Report, Error> {
    let registry = registry()?;
    let config = load_config(args)?;
    let (run_config, checks) = config.run_config(args, &registry)?;

    let run = RunContext::load(&args.inputs, args.group_by.into());
    info!(
        "Running {} checks against {} fonts in {} families",
        checks.len(),
        run.fonts().len(),
        run.families().len()
    );

    let runner = Runner::new(&registry, &run, run_config)?;
    let report = match &args.emit_timing {
        Some(path) => {
            let (report, mut timer) = runner.run_timed();
            output::write_timing(&mut timer, path)?;
            report
        }
        None => runner.run(),
    };
    info!("{}", output::summary_line(&report));

    if let Some(path) = &args.json {
        output::write_json(&report, path)?;
    }
    Ok(report)
}

/// Whether the run should be reported as unsuccessful.
pub fn is_failure(report: &Report, error_on: Severity) -> bool {
    report.worst().is_some_and(|worst| worst >= error_on)
}
