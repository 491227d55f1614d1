//! Collects per-(check, entity) results into a stable, serializable report.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::{
    status::{Severity, Status},
    testable::EntityId,
};

/// Diagnostics for a result that ended in an engine-level failure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
    pub context: String,
}

/// The outcome of one check against one entity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResult {
    pub check_id: SmolStr,
    pub entity: EntityId,
    pub verdict: Severity,
    pub statuses: Vec<Status>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
}

impl CheckResult {
    /// The first status carrying `code`, if any.
    pub fn status_with_code(&self, code: &str) -> Option<&Status> {
        self.statuses
            .iter()
            .find(|s| s.code.as_deref() == Some(code))
    }
}

/// Accumulates results while a run is in progress.
#[derive(Default, Debug)]
pub struct ReportBuilder {
    results: HashMap<(EntityId, SmolStr), CheckResult>,
}

impl ReportBuilder {
    pub fn new() -> ReportBuilder {
        Default::default()
    }

    /// Record a result.
    ///
    /// Each (entity, check) pair runs exactly once; a second result for the
    /// same pair is a bug in the runner.
    pub fn record(&mut self, result: CheckResult) {
        let key = (result.entity.clone(), result.check_id.clone());
        if self.results.contains_key(&key) {
            panic!("Multiple results for {} on {}", key.1, key.0);
        }
        self.results.insert(key, result);
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn finalize(self) -> Report {
        let mut results: Vec<_> = self.results.into_values().collect();
        results.sort_by(|a, b| (&a.entity, &a.check_id).cmp(&(&b.entity, &b.check_id)));
        let mut summary = BTreeMap::new();
        for result in results.iter() {
            *summary.entry(result.verdict).or_default() += 1;
        }
        Report { results, summary }
    }
}

/// Every result of a run, ordered by (entity, check id).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    results: Vec<CheckResult>,
    summary: BTreeMap<Severity, usize>,
}

impl Report {
    pub fn results(&self) -> &[CheckResult] {
        &self.results
    }

    /// How many results ended with each verdict.
    pub fn summary(&self) -> &BTreeMap<Severity, usize> {
        &self.summary
    }

    pub fn count(&self, verdict: Severity) -> usize {
        self.summary.get(&verdict).copied().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn results_for<'a>(
        &'a self,
        entity: &'a EntityId,
    ) -> impl Iterator<Item = &'a CheckResult> + 'a {
        self.results.iter().filter(move |r| &r.entity == entity)
    }

    pub fn result(&self, entity: &EntityId, check_id: &str) -> Option<&CheckResult> {
        self.results
            .iter()
            .find(|r| &r.entity == entity && r.check_id == check_id)
    }

    /// Every result for `check_id`, across entities.
    pub fn results_of<'a>(&'a self, check_id: &'a str) -> impl Iterator<Item = &'a CheckResult> + 'a {
        self.results.iter().filter(move |r| r.check_id == check_id)
    }

    /// The most severe verdict in the report.
    pub fn worst(&self) -> Option<Severity> {
        self.summary.keys().next_back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn result(path: &str, check: &str, verdict: Severity) -> CheckResult {
        CheckResult {
            check_id: check.into(),
            entity: EntityId::Font {
                path: path.into(),
                index: None,
            },
            verdict,
            statuses: vec![Status::new(verdict, None, "x")],
            error: None,
        }
    }

    #[test]
    fn orders_and_counts() {
        let mut builder = ReportBuilder::new();
        builder.record(result("b.ttf", "one", Severity::Pass));
        builder.record(CheckResult {
            entity: EntityId::Run,
            ..result("", "one", Severity::Warn)
        });
        builder.record(result("a.ttf", "two", Severity::Fail));
        builder.record(result("a.ttf", "one", Severity::Pass));
        let report = builder.finalize();

        let order: Vec<_> = report
            .results()
            .iter()
            .map(|r| format!("{} {}", r.entity, r.check_id))
            .collect();
        assert_eq!(vec!["a.ttf one", "a.ttf two", "b.ttf one", "run one"], order);
        assert_eq!(2, report.count(Severity::Pass));
        assert_eq!(0, report.count(Severity::Error));
        assert_eq!(Some(Severity::Fail), report.worst());

        let a = EntityId::Font {
            path: "a.ttf".into(),
            index: None,
        };
        assert_eq!(2, report.results_for(&a).count());
        assert_eq!(
            Severity::Fail,
            report.result(&a, "two").unwrap().verdict
        );
        assert!(report.result(&a, "three").is_none());
    }

    #[test]
    #[should_panic(expected = "Multiple results")]
    fn duplicate_record_panics() {
        let mut builder = ReportBuilder::new();
        builder.record(result("a.ttf", "one", Severity::Pass));
        builder.record(result("a.ttf", "one", Severity::Fail));
    }

    #[test]
    fn empty_report() {
        let report = ReportBuilder::new().finalize();
        assert!(report.is_empty());
        assert_eq!(None, report.worst());
    }
}
