//! Individual findings emitted by checks and how they fold into a verdict.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// How bad a finding is.
///
/// Ordered from least to most severe. Debug and Info never decide a verdict.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Debug,
    Info,
    Pass,
    Skip,
    Warn,
    Fail,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 7] = [
        Severity::Debug,
        Severity::Info,
        Severity::Pass,
        Severity::Skip,
        Severity::Warn,
        Severity::Fail,
        Severity::Error,
    ];

    /// Whether this severity can decide a verdict.
    pub fn is_substantive(self) -> bool {
        self >= Severity::Pass
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Pass => "PASS",
            Severity::Skip => "SKIP",
            Severity::Warn => "WARN",
            Severity::Fail => "FAIL",
            Severity::Error => "ERROR",
        }
    }
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Severity::ALL
            .into_iter()
            .find(|sev| sev.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown severity '{s}'"))
    }
}

/// A single finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub message: String,
}

impl Status {
    pub fn new(severity: Severity, code: Option<&str>, message: impl Into<String>) -> Status {
        Status {
            severity,
            code: code.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Status {
        Status::new(Severity::Pass, None, message)
    }

    pub fn debug(code: &str, message: impl Into<String>) -> Status {
        Status::new(Severity::Debug, Some(code), message)
    }

    pub fn info(code: &str, message: impl Into<String>) -> Status {
        Status::new(Severity::Info, Some(code), message)
    }

    pub fn skip(code: &str, message: impl Into<String>) -> Status {
        Status::new(Severity::Skip, Some(code), message)
    }

    pub fn warn(code: &str, message: impl Into<String>) -> Status {
        Status::new(Severity::Warn, Some(code), message)
    }

    pub fn fail(code: &str, message: impl Into<String>) -> Status {
        Status::new(Severity::Fail, Some(code), message)
    }

    pub fn error(code: &str, message: impl Into<String>) -> Status {
        Status::new(Severity::Error, Some(code), message)
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} [{}]: {}", self.severity, code, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// What a check body hands back: a lazy sequence of findings.
pub type StatusIter = Box<dyn Iterator<Item = Status> + Send>;

pub type CheckFnResult = Result<StatusIter, CheckError>;

/// Convenience for check bodies that collect their findings eagerly.
pub fn return_result(statuses: Vec<Status>) -> CheckFnResult {
    Ok(Box::new(statuses.into_iter()))
}

/// Engine-synthesized code for a check that emitted nothing.
pub const NO_RESULT: &str = "no-result";
/// Engine-synthesized code for a check that only emitted Debug/Info.
pub const NO_SUBSTANTIVE_RESULT: &str = "no-substantive-result";

/// Fold findings into a verdict.
///
/// A check that said nothing substantive has misbehaved; the returned error
/// status should be appended to its findings and becomes the verdict.
pub fn verdict(statuses: &[Status]) -> Result<Severity, Status> {
    if statuses.is_empty() {
        return Err(Status::error(
            NO_RESULT,
            "Check returned without emitting any status",
        ));
    }
    statuses
        .iter()
        .map(|s| s.severity)
        .filter(|s| s.is_substantive())
        .max()
        .ok_or_else(|| {
            Status::error(
                NO_SUBSTANTIVE_RESULT,
                "Check only emitted informational statuses",
            )
        })
}
