//! Errors for the check engine.
//!
//! Configuration errors are fatal and surface before any entity is touched.
//! Everything else is contained to a single check result.

use std::path::PathBuf;

use smol_str::SmolStr;
use thiserror::Error;
use write_fonts::read::ReadError;

use crate::testable::{EntityId, Scope};

/// The check suite itself is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("check '{0}' is registered more than once")]
    DuplicateCheck(SmolStr),
    #[error("condition '{0}' is registered more than once")]
    DuplicateCondition(SmolStr),
    #[error("'{referrer}' depends on unknown condition '{condition}'")]
    UnknownCondition {
        referrer: SmolStr,
        condition: SmolStr,
    },
    #[error("condition dependencies form a cycle: {}", .0.join(" -> "))]
    ConditionCycle(Vec<SmolStr>),
    #[error("check '{check}' runs per {check_scope} but its condition '{condition}' is per {condition_scope}")]
    ScopeMismatch {
        check: SmolStr,
        check_scope: Scope,
        condition: SmolStr,
        condition_scope: Scope,
    },
    #[error("unknown check '{0}'")]
    UnknownCheck(SmolStr),
    #[error("'{check}' has an unparseable condition expression '{expr}'")]
    BadConditionExpr { check: SmolStr, expr: String },
}

/// A font could not be loaded or parsed.
///
/// Kept as strings so the error can be cloned and replayed to every check
/// that touches the font.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unable to read {path:?}: {reason}")]
    Io { path: PathBuf, reason: String },
    #[error("unable to decode {path:?}: {reason}")]
    Read { path: PathBuf, reason: String },
}

impl DecodeError {
    pub fn path(&self) -> &PathBuf {
        match self {
            DecodeError::Io { path, .. } | DecodeError::Read { path, .. } => path,
        }
    }
}

/// Evaluating a condition did not produce a value.
///
/// Cached alongside successful values; every consumer sees an identical error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("condition '{condition}' failed: {message}")]
    Failed { condition: SmolStr, message: String },
    #[error("condition '{condition}' panicked: {message}")]
    Panicked { condition: SmolStr, message: String },
    #[error("condition '{condition}' asked for '{dependency}' without declaring it")]
    Undeclared {
        condition: SmolStr,
        dependency: SmolStr,
    },
    #[error("unknown condition '{0}'")]
    Unknown(SmolStr),
    #[error("condition '{condition}' is per {scope} but {entity} has no enclosing {scope}")]
    NoEnclosingEntity {
        condition: SmolStr,
        scope: Scope,
        entity: EntityId,
    },
    #[error("condition '{condition}' is a {actual}, not a {expected}")]
    WrongType {
        condition: SmolStr,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("condition needs a single font, got {0}")]
    NotAFont(EntityId),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("font read error: {0}")]
    Read(String),
}

impl ConditionError {
    pub fn failed(condition: &str, message: impl std::fmt::Display) -> ConditionError {
        ConditionError::Failed {
            condition: condition.into(),
            message: message.to_string(),
        }
    }
}

impl From<ReadError> for ConditionError {
    fn from(value: ReadError) -> Self {
        ConditionError::Read(value.to_string())
    }
}

/// A check body gave up.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("{0}")]
    Failed(String),
    #[error("condition '{0}' is not bound for this check")]
    MissingCondition(SmolStr),
    #[error("check needs a {expected} but ran against {actual}")]
    WrongEntity { expected: Scope, actual: EntityId },
    #[error("bad value for option '{key}': {reason}")]
    BadOption { key: String, reason: String },
    #[error(transparent)]
    Condition(#[from] ConditionError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error("font read error")]
    Read(#[from] ReadError),
}

impl CheckError {
    pub fn failed(message: impl std::fmt::Display) -> CheckError {
        CheckError::Failed(message.to_string())
    }

    /// A short, stable name for the kind of error, used in reports.
    pub fn kind(&self) -> &'static str {
        match self {
            CheckError::Failed(..) => "check-failed",
            CheckError::MissingCondition(..) => "missing-condition",
            CheckError::WrongEntity { .. } => "wrong-entity",
            CheckError::BadOption { .. } => "bad-option",
            CheckError::Condition(..) => "condition-error",
            CheckError::Decode(..) => "decode-error",
            CheckError::Read(..) => "read-error",
        }
    }
}
