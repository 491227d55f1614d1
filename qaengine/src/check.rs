//! Check definitions and what a check body gets to see.

use std::{any::Any, fmt::Debug, str::FromStr, sync::Arc};

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use smol_str::SmolStr;

use crate::{
    condition::Value,
    error::{CheckError, ConfigError},
    font::Font,
    status::CheckFnResult,
    testable::{RunContext, Scope, Testable},
};

/// Free-form per-check configuration, keyed by option name.
pub type CheckOptions = IndexMap<String, serde_yaml::Value>;

pub type CheckFn = Arc<dyn Fn(&CheckInput<'_>) -> CheckFnResult + Send + Sync>;

/// A reference to a condition, possibly negated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConditionExpr {
    pub name: SmolStr,
    pub negated: bool,
}

impl FromStr for ConditionExpr {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (negated, name) = match s.strip_prefix("not ") {
            Some(rest) => (true, rest.trim()),
            None => (false, s),
        };
        if name.is_empty() || name.contains(char::is_whitespace) {
            return Err(format!("'{s}' is not a condition name"));
        }
        Ok(ConditionExpr {
            name: name.into(),
            negated,
        })
    }
}

impl std::fmt::Display for ConditionExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            f.write_str("not ")?;
        }
        f.write_str(&self.name)
    }
}

/// A named, self-describing test.
#[derive(Clone)]
pub struct Check {
    id: SmolStr,
    title: String,
    rationale: String,
    proposals: Vec<String>,
    scope: Scope,
    conditions: Vec<ConditionExpr>,
    bad_conditions: Vec<String>,
    requires_decoding: bool,
    body: CheckFn,
}

impl Check {
    pub fn new(
        id: &str,
        scope: Scope,
        body: impl Fn(&CheckInput<'_>) -> CheckFnResult + Send + Sync + 'static,
    ) -> Check {
        Check {
            id: id.into(),
            title: String::new(),
            rationale: String::new(),
            proposals: Vec::new(),
            scope,
            conditions: Vec::new(),
            bad_conditions: Vec::new(),
            requires_decoding: true,
            body: Arc::new(body),
        }
    }

    pub fn with_title(mut self, title: &str) -> Check {
        self.title = title.to_string();
        self
    }

    pub fn with_rationale(mut self, rationale: &str) -> Check {
        self.rationale = rationale.to_string();
        self
    }

    pub fn with_proposal(mut self, proposal: &str) -> Check {
        self.proposals.push(proposal.to_string());
        self
    }

    /// Conditions that must all hold for the check to run.
    ///
    /// `"not name"` requires the condition to be falsy instead.
    pub fn with_conditions(mut self, conditions: &[&str]) -> Check {
        for cond in conditions {
            match cond.parse() {
                Ok(expr) => self.conditions.push(expr),
                Err(_) => self.bad_conditions.push(cond.to_string()),
            }
        }
        self
    }

    /// The check reads raw bytes and doesn't need its fonts to decode.
    pub fn raw_bytes_only(mut self) -> Check {
        self.requires_decoding = false;
        self
    }

    pub fn id(&self) -> &SmolStr {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn rationale(&self) -> &str {
        &self.rationale
    }

    pub fn proposals(&self) -> &[String] {
        &self.proposals
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn condition_exprs(&self) -> &[ConditionExpr] {
        &self.conditions
    }

    pub fn requires_decoding(&self) -> bool {
        self.requires_decoding
    }

    pub(crate) fn validate_exprs(&self) -> Result<(), ConfigError> {
        match self.bad_conditions.first() {
            Some(expr) => Err(ConfigError::BadConditionExpr {
                check: self.id.clone(),
                expr: expr.clone(),
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn run(&self, input: &CheckInput<'_>) -> CheckFnResult {
        (self.body)(input)
    }
}

impl Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("scope", &self.scope)
            .field("conditions", &self.conditions)
            .field("requires_decoding", &self.requires_decoding)
            .finish()
    }
}

/// Everything a check body is given.
pub struct CheckInput<'a> {
    pub(crate) check: &'a Check,
    pub(crate) testable: &'a Testable,
    pub(crate) run: &'a RunContext,
    pub(crate) conditions: IndexMap<SmolStr, Value>,
    pub(crate) options: Option<&'a CheckOptions>,
    pub(crate) full_lists: bool,
}

impl<'a> CheckInput<'a> {
    pub fn check(&self) -> &'a Check {
        self.check
    }

    pub fn testable(&self) -> &'a Testable {
        self.testable
    }

    pub fn run(&self) -> &'a RunContext {
        self.run
    }

    /// The font, for checks over single fonts.
    pub fn font(&self) -> Result<&'a Arc<Font>, CheckError> {
        self.testable
            .as_font()
            .ok_or_else(|| CheckError::WrongEntity {
                expected: Scope::Font,
                actual: self.testable.id().clone(),
            })
    }

    pub fn fonts(&self) -> &'a [Arc<Font>] {
        self.testable.fonts()
    }

    /// The value of one of this check's conditions.
    ///
    /// Only conditions that held are bound; negated ones never are.
    pub fn condition<T: Any + Send + Sync>(&self, name: &str) -> Result<Arc<T>, CheckError> {
        let value = self
            .conditions
            .get(name)
            .ok_or_else(|| CheckError::MissingCondition(name.into()))?;
        value.downcast::<T>().ok_or_else(|| {
            crate::error::ConditionError::WrongType {
                condition: name.into(),
                expected: std::any::type_name::<T>(),
                actual: value.type_name(),
            }
            .into()
        })
    }

    /// A configured option for this check, None if unset.
    pub fn option<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CheckError> {
        let Some(value) = self.options.and_then(|o| o.get(key)) else {
            return Ok(None);
        };
        serde_yaml::from_value(value.clone())
            .map(Some)
            .map_err(|e| CheckError::BadOption {
                key: key.to_string(),
                reason: e.to_string(),
            })
    }

    /// Whether messages should list every item rather than a sample.
    pub fn full_lists(&self) -> bool {
        self.full_lists
    }
}
