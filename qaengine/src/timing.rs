//! Helps to understand what threads are up to during a run.
//!
//! Each (check, entity) job gets a timer; the collected timers render as an
//! svg timeline with one row per thread.

use std::{
    collections::HashMap,
    io::Write,
    thread::ThreadId,
    time::{Duration, Instant},
};

use log::warn;
use smol_str::SmolStr;

use crate::{status::Severity, testable::EntityId};

const ROW_HEIGHT: usize = 15;
const TEXT_HEIGHT: usize = 12;
/// Jobs narrower than this share of the timeline get no label.
const MIN_LABELLED_PCT: f64 = 5.0;

/// Collects finished [`JobTime`]s, grouped by the thread that ran them.
///
/// Not threadsafe; the runner adds timings once jobs are done.
#[derive(Debug)]
pub struct JobTimer {
    start: Instant,
    by_thread: HashMap<ThreadId, Vec<JobTime>>,
}

impl Default for JobTimer {
    fn default() -> Self {
        JobTimer {
            start: Instant::now(),
            by_thread: HashMap::new(),
        }
    }
}

impl JobTimer {
    pub fn new() -> Self {
        Default::default()
    }

    /// A timer for a job that is about to be scheduled.
    pub fn create_timer(&self, check: SmolStr, entity: EntityId) -> JobTime {
        let now = Instant::now();
        JobTime {
            phase: Phase::Ready,
            check,
            entity,
            verdict: None,
            thread: std::thread::current().id(),
            queued: now,
            started: now,
            finished: now,
        }
    }

    /// Keep a finished timing. Anything else is logged and dropped.
    pub fn add(&mut self, timing: JobTime) {
        if timing.phase != Phase::Done {
            warn!(
                "Dropping timing of {} on {}, it is {:?}",
                timing.check, timing.entity, timing.phase
            );
            return;
        }
        self.by_thread.entry(timing.thread).or_default().push(timing);
    }

    /// How many finished jobs have been recorded.
    pub fn len(&self) -> usize {
        self.by_thread.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_thread.is_empty()
    }

    /// How many distinct threads ran jobs.
    pub fn threads(&self) -> usize {
        self.by_thread.len()
    }

    fn offset(&self, at: Instant) -> f64 {
        at.saturating_duration_since(self.start).as_secs_f64()
    }

    /// Render one row per thread, rows ordered by their first job.
    pub fn write_svg(&mut self, out: &mut impl Write) -> Result<(), std::io::Error> {
        for jobs in self.by_thread.values_mut() {
            jobs.sort_by_key(|j| j.started);
        }
        let mut rows: Vec<&Vec<JobTime>> = self.by_thread.values().collect();
        rows.sort_by_key(|jobs| jobs.first().map(|j| j.started));

        let span = self
            .by_thread
            .values()
            .flatten()
            .map(|j| j.finished.saturating_duration_since(self.start))
            .max()
            .unwrap_or(Duration::ZERO)
            .as_secs_f64()
            .max(f64::EPSILON);
        let pct = |secs: f64| 100.0 * secs / span;

        writeln!(out, r#"<svg xmlns="http://www.w3.org/2000/svg">"#)?;
        writeln!(
            out,
            "<style type=\"text/css\">text {{ font-family: monospace; font-size: 12pt; }}</style>"
        )?;
        for (row, jobs) in rows.into_iter().enumerate() {
            let y = ROW_HEIGHT * row;
            for job in jobs {
                let queued = self.offset(job.queued);
                let started = self.offset(job.started);
                let finished = self.offset(job.finished);
                let x = pct(started);
                let width = pct(finished - started);
                // $('g[check="..."]') finds every run of a check from the browser console
                writeln!(out, "  <g check=\"{}\">", job.check)?;
                writeln!(
                    out,
                    "    <rect x=\"{x:.2}%\" y=\"{y}\" width=\"{width:.2}%\" height=\"{ROW_HEIGHT}\" fill=\"{}\" stroke=\"black\" />",
                    color(job.verdict)
                )?;
                if width > MIN_LABELLED_PCT {
                    writeln!(
                        out,
                        "    <text x=\"{x:.2}%\" y=\"{}\">{}</text>",
                        y + TEXT_HEIGHT,
                        short_name(&job.check)
                    )?;
                }
                writeln!(
                    out,
                    "    <title>{} on {}: {}\n{:.1}ms ({width:.2}%), queued {:.1}ms, started {:.1}ms</title>",
                    job.check,
                    escape(&job.entity.to_string()),
                    job.verdict.map(Severity::as_str).unwrap_or("no verdict"),
                    1000.0 * (finished - started),
                    1000.0 * queued,
                    1000.0 * started,
                )?;
                writeln!(out, "  </g>")?;
            }
        }
        writeln!(out, "</svg>")
    }
}

/// The last path component of a check id.
fn short_name(check: &str) -> &str {
    check.rsplit('/').next().unwrap_or(check)
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn color(verdict: Option<Severity>) -> &'static str {
    match verdict {
        Some(Severity::Pass) => "#009a00",
        Some(Severity::Warn) => "#e18707",
        Some(Severity::Fail) => "#830356",
        Some(Severity::Error) => "#c00000",
        _ => "gray",
    }
}

/// How far along a timed job is.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Phase {
    Ready,
    /// Handed to a thread pool
    Queued,
    Running,
    Done,
}

/// The timing of one (check, entity) job.
///
/// Moves forward with [`JobTime::queued`], [`JobTime::run`] and
/// [`JobTime::complete`]; out of order calls are logged and ignored.
#[derive(Debug, Clone)]
pub struct JobTime {
    phase: Phase,
    check: SmolStr,
    entity: EntityId,
    verdict: Option<Severity>,
    thread: ThreadId,
    queued: Instant,
    started: Instant,
    finished: Instant,
}

impl JobTime {
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn advance(mut self, allowed_from: &[Phase], to: Phase) -> Result<Self, Self> {
        if !allowed_from.contains(&self.phase) {
            warn!(
                "Timer for {} on {} can't go from {:?} to {to:?}",
                self.check, self.entity, self.phase
            );
            return Err(self);
        }
        self.phase = to;
        Ok(self)
    }

    pub fn queued(self) -> Self {
        match self.advance(&[Phase::Ready], Phase::Queued) {
            Ok(mut t) => {
                t.queued = Instant::now();
                t
            }
            Err(t) => t,
        }
    }

    /// Records the current time and thread. Queueing first is optional.
    pub fn run(self) -> Self {
        match self.advance(&[Phase::Ready, Phase::Queued], Phase::Running) {
            Ok(mut t) => {
                t.started = Instant::now();
                t.thread = std::thread::current().id();
                t
            }
            Err(t) => t,
        }
    }

    pub fn complete(self, verdict: Severity) -> Self {
        match self.advance(&[Phase::Running], Phase::Done) {
            Ok(mut t) => {
                t.finished = Instant::now();
                t.verdict = Some(verdict);
                t
            }
            Err(t) => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn only_finished_jobs_are_kept() {
        let mut timer = JobTimer::new();
        let unfinished = timer.create_timer("a".into(), EntityId::Run).queued();
        assert_eq!(Phase::Queued, unfinished.phase());
        timer.add(unfinished);
        assert!(timer.is_empty());

        let done = timer
            .create_timer("family/b".into(), EntityId::Run)
            .queued()
            .run()
            .complete(Severity::Warn);
        timer.add(done);
        assert_eq!(1, timer.len());
        assert_eq!(1, timer.threads());
    }

    #[test]
    fn out_of_order_is_ignored() {
        let timer = JobTimer::new();
        let t = timer.create_timer("a".into(), EntityId::Run).complete(Severity::Pass);
        assert_eq!(Phase::Ready, t.phase());
        let t = t.run().queued();
        assert_eq!(Phase::Running, t.phase());
    }

    #[test]
    fn svg_mentions_every_job() {
        let mut timer = JobTimer::new();
        for id in ["one", "family/two"] {
            let t = timer
                .create_timer(id.into(), EntityId::Run)
                .run()
                .complete(Severity::Pass);
            timer.add(t);
        }
        let mut out = Vec::new();
        timer.write_svg(&mut out).unwrap();
        let svg = String::from_utf8(out).unwrap();
        assert!(svg.contains("check=\"one\""), "{svg}");
        assert!(svg.contains("check=\"family/two\""), "{svg}");
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
