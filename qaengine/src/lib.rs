//! The check execution engine.
//!
//! Checks are declared into a [`Registry`] together with the conditions they
//! depend on. A [`Runner`] executes them against every entity of a
//! [`RunContext`], evaluating each condition at most once per entity, and
//! gathers the outcomes into a [`Report`].

pub mod check;
pub mod condition;
pub mod error;
pub mod font;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod status;
#[cfg(test)]
mod test_util;
pub mod testable;
pub mod timing;

pub use check::{Check, CheckInput, CheckOptions, ConditionExpr};
pub use condition::{Condition, ConditionCache, ConditionInput, Truthy, Value};
pub use error::{CheckError, ConditionError, ConfigError, DecodeError};
pub use font::{Font, FontCopy};
pub use registry::Registry;
pub use report::{CheckResult, ErrorInfo, Report, ReportBuilder};
pub use runner::{run_checks, RunConfig, Runner};
pub use status::{return_result, CheckFnResult, Severity, Status, StatusIter};
pub use testable::{EntityId, FontSet, GroupBy, RunContext, Scope, Testable};
pub use timing::JobTimer;
