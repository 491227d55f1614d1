//! Runs every selected check against every entity of its scope.

use std::panic::AssertUnwindSafe;

use indexmap::IndexMap;
use log::{debug, error, trace, warn};
use rayon::prelude::*;
use smol_str::SmolStr;

use crate::{
    check::{Check, CheckInput, CheckOptions},
    condition::{ConditionCache, RunEnv},
    error::{CheckError, ConfigError},
    registry::Registry,
    report::{CheckResult, ErrorInfo, Report, ReportBuilder},
    resolve::{resolve, Resolution},
    status::{verdict, Severity, Status},
    testable::{RunContext, Scope, Testable},
    timing::{JobTime, JobTimer},
};

/// Code of the status emitted when a check body errors or panics.
pub const FAILED_CHECK: &str = "failed-check";

/// How a run should be carried out.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Check ids to run, in any order. None runs everything registered.
    pub selected: Option<Vec<SmolStr>>,
    /// Options handed to check bodies, by check id.
    pub options: IndexMap<SmolStr, CheckOptions>,
    /// List every item in messages instead of a sample.
    pub full_lists: bool,
    /// Worker threads. 1 runs sequentially on the calling thread, 0 lets
    /// rayon decide.
    pub jobs: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            selected: None,
            options: Default::default(),
            full_lists: false,
            jobs: 1,
        }
    }
}

/// Where a (check, entity) pair is in its life.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CheckState {
    Pending,
    Resolving,
    Running,
    Skipped,
    Passed,
    Warned,
    Failed,
    Errored,
}

impl CheckState {
    fn advance(self, next: CheckState, check: &Check, testable: &Testable) -> CheckState {
        use CheckState::*;
        let legal = matches!(
            (self, next),
            (Pending, Resolving)
                | (Resolving, Running | Skipped | Errored)
                | (Running, Passed | Warned | Failed | Skipped | Errored)
        );
        if !legal {
            panic!(
                "Illegal transition {self:?} => {next:?} for {} on {}",
                check.id(),
                testable.id()
            );
        }
        trace!("{} on {}: {self:?} => {next:?}", check.id(), testable.id());
        next
    }

    fn finished(verdict: Severity) -> CheckState {
        match verdict {
            Severity::Pass => CheckState::Passed,
            Severity::Skip => CheckState::Skipped,
            Severity::Warn => CheckState::Warned,
            Severity::Fail => CheckState::Failed,
            Severity::Error | Severity::Info | Severity::Debug => CheckState::Errored,
        }
    }
}

/// Executes a suite against one run.
///
/// Owns the condition cache, so a runner is good for exactly one run.
pub struct Runner<'a> {
    registry: &'a Registry,
    run: &'a RunContext,
    config: RunConfig,
    checks: Vec<&'a Check>,
    cache: ConditionCache,
}

impl<'a> Runner<'a> {
    pub fn new(
        registry: &'a Registry,
        run: &'a RunContext,
        config: RunConfig,
    ) -> Result<Runner<'a>, ConfigError> {
        registry.validate()?;
        let checks = match &config.selected {
            None => registry.checks().collect(),
            Some(selected) => {
                if let Some(unknown) = selected.iter().find(|id| registry.check(id).is_none()) {
                    return Err(ConfigError::UnknownCheck(unknown.clone()));
                }
                registry
                    .checks()
                    .filter(|c| selected.contains(c.id()))
                    .collect()
            }
        };
        Ok(Runner {
            registry,
            run,
            config,
            checks,
            cache: ConditionCache::new(),
        })
    }

    /// The checks that will run, in registration order.
    pub fn checks(&self) -> &[&'a Check] {
        &self.checks
    }

    /// Every (check, entity) pair, entities outermost.
    ///
    /// A run without fonts has nothing to check, not even at run scope.
    fn jobs(&self) -> Vec<(&'a Check, Testable)> {
        let mut jobs = Vec::new();
        if self.run.is_empty() {
            return jobs;
        }
        for scope in [Scope::Font, Scope::Collection, Scope::Family, Scope::Run] {
            if !self.checks.iter().any(|c| c.scope() == scope) {
                continue;
            }
            for testable in self.run.testables(scope) {
                for check in self.checks.iter().filter(|c| c.scope() == scope) {
                    jobs.push((*check, testable.clone()));
                }
            }
        }
        jobs
    }

    pub fn run(self) -> Report {
        self.run_timed().0
    }

    pub fn run_timed(self) -> (Report, JobTimer) {
        let mut timer = JobTimer::new();
        let jobs: Vec<_> = self
            .jobs()
            .into_iter()
            .map(|(check, testable)| {
                let time = timer.create_timer(check.id().clone(), testable.id().clone());
                (check, testable, time)
            })
            .collect();
        debug!(
            "Running {} jobs for {} checks over {} fonts",
            jobs.len(),
            self.checks.len(),
            self.run.fonts().len()
        );

        let run_job = |(check, testable, time): (&Check, Testable, JobTime)| {
            let time = time.run();
            let result = self.run_one(check, &testable);
            let time = time.complete(result.verdict);
            (result, time)
        };

        let outcomes: Vec<(CheckResult, JobTime)> = match self.config.jobs {
            1 => jobs.into_iter().map(run_job).collect(),
            threads => match rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
            {
                Ok(pool) => {
                    let jobs: Vec<_> = jobs
                        .into_iter()
                        .map(|(c, t, time)| (c, t, time.queued()))
                        .collect();
                    pool.install(|| jobs.into_par_iter().map(run_job).collect())
                }
                Err(e) => {
                    warn!("Unable to create a thread pool, running sequentially: {e}");
                    jobs.into_iter().map(run_job).collect()
                }
            },
        };

        let mut builder = ReportBuilder::new();
        for (result, time) in outcomes {
            builder.record(result);
            timer.add(time);
        }
        debug!(
            "{} conditions evaluated for {} results",
            self.cache.evaluations(),
            builder.len()
        );
        (builder.finalize(), timer)
    }

    fn env(&self) -> RunEnv<'_> {
        RunEnv {
            registry: self.registry,
            run: self.run,
            cache: &self.cache,
        }
    }

    /// Run one check against one entity; never fails, never panics.
    fn run_one(&self, check: &Check, testable: &Testable) -> CheckResult {
        let context = format!("check '{}' on {}", check.id(), testable.id());
        let state = CheckState::Pending.advance(CheckState::Resolving, check, testable);

        let bound = match resolve(check, testable, self.env()) {
            Resolution::Ready(bound) => bound,
            Resolution::Unmet { status, errors } => {
                state.advance(CheckState::Skipped, check, testable);
                debug!("{context}: {}", status.message);
                return CheckResult {
                    check_id: check.id().clone(),
                    entity: testable.id().clone(),
                    verdict: Severity::Skip,
                    statuses: vec![status],
                    error: (!errors.is_empty()).then(|| ErrorInfo {
                        kind: "condition-error".to_string(),
                        message: errors
                            .iter()
                            .map(|e| e.to_string())
                            .collect::<Vec<_>>()
                            .join("; "),
                        context,
                    }),
                };
            }
            Resolution::Undecodable { status, errors } => {
                state.advance(CheckState::Errored, check, testable);
                return CheckResult {
                    check_id: check.id().clone(),
                    entity: testable.id().clone(),
                    verdict: Severity::Error,
                    error: Some(ErrorInfo {
                        kind: "decode-error".to_string(),
                        message: errors
                            .iter()
                            .map(|e| e.to_string())
                            .collect::<Vec<_>>()
                            .join("; "),
                        context,
                    }),
                    statuses: vec![status],
                };
            }
        };

        let state = state.advance(CheckState::Running, check, testable);
        let input = CheckInput {
            check,
            testable,
            run: self.run,
            conditions: bound,
            options: self.config.options.get(check.id()),
            full_lists: self.config.full_lists,
        };

        // the body and the draining of its statuses may both fail
        let mut statuses = Vec::new();
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| -> Result<(), CheckError> {
            for status in check.run(&input)? {
                statuses.push(status);
            }
            Ok(())
        }));
        let mut error = None;
        match outcome {
            Ok(Ok(())) => (),
            Ok(Err(e)) => {
                let message = error_chain(&e);
                error!("{context} failed: {message}");
                statuses.push(Status::error(FAILED_CHECK, message.clone()));
                error = Some(ErrorInfo {
                    kind: e.kind().to_string(),
                    message,
                    context,
                });
            }
            Err(panic) => {
                let message = get_panic_message(panic);
                error!("{context} panicked: {message}");
                statuses.push(Status::error(
                    FAILED_CHECK,
                    format!("Check panicked: {message}"),
                ));
                error = Some(ErrorInfo {
                    kind: "panic".to_string(),
                    message,
                    context,
                });
            }
        }

        let verdict = match verdict(&statuses) {
            Ok(verdict) => verdict,
            Err(status) => {
                warn!("{} on {}: {}", check.id(), testable.id(), status.message);
                statuses.push(status);
                Severity::Error
            }
        };
        state.advance(CheckState::finished(verdict), check, testable);
        debug!("{} on {}: {verdict}", check.id(), testable.id());
        CheckResult {
            check_id: check.id().clone(),
            entity: testable.id().clone(),
            verdict,
            statuses,
            error,
        }
    }
}

/// The error and every source under it, outermost first.
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = inner.source();
    }
    message
}

// taken from std:
// <https://github.com/rust-lang/rust/blob/d5a82bbd26e1ad8b7401f6a718a9c57c96905483/library/std/src/panicking.rs#L247-L253>
pub(crate) fn get_panic_message(msg: Box<dyn std::any::Any + Send + 'static>) -> String {
    match msg.downcast_ref::<&'static str>() {
        Some(s) => s.to_string(),
        None => match msg.downcast_ref::<String>() {
            Some(s) => s.to_owned(),
            None => "Box<dyn Any>".to_owned(),
        },
    }
}

/// Convenience for callers that already hold fonts.
pub fn run_checks(
    registry: &Registry,
    run: &RunContext,
    config: RunConfig,
) -> Result<Report, ConfigError> {
    Ok(Runner::new(registry, run, config)?.run())
}
