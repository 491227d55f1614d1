//! Where checks and conditions are declared.

use std::collections::HashMap;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::{check::Check, condition::Condition, error::ConfigError};

/// The set of known checks and conditions.
///
/// Iteration follows registration order.
#[derive(Default, Debug)]
pub struct Registry {
    checks: IndexMap<SmolStr, Check>,
    conditions: IndexMap<SmolStr, Condition>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Visiting,
    Done,
}

impl Registry {
    pub fn new() -> Registry {
        Default::default()
    }

    pub fn register_check(&mut self, check: Check) -> Result<(), ConfigError> {
        if self.checks.contains_key(check.id()) {
            return Err(ConfigError::DuplicateCheck(check.id().clone()));
        }
        check.validate_exprs()?;
        self.checks.insert(check.id().clone(), check);
        Ok(())
    }

    pub fn register_condition(&mut self, condition: Condition) -> Result<(), ConfigError> {
        if self.conditions.contains_key(condition.name()) {
            return Err(ConfigError::DuplicateCondition(condition.name().clone()));
        }
        self.conditions
            .insert(condition.name().clone(), condition);
        Ok(())
    }

    pub fn check(&self, id: &str) -> Option<&Check> {
        self.checks.get(id)
    }

    pub fn checks(&self) -> impl Iterator<Item = &Check> {
        self.checks.values()
    }

    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.values()
    }

    /// Confirm the suite is internally consistent.
    ///
    /// Every referenced condition exists, condition dependencies are acyclic
    /// and every condition a check uses is evaluated on an entity that
    /// encloses the check's own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for condition in self.conditions.values() {
            for dep in condition.dependencies() {
                if !self.conditions.contains_key(dep) {
                    return Err(ConfigError::UnknownCondition {
                        referrer: condition.name().clone(),
                        condition: dep.clone(),
                    });
                }
            }
        }

        let mut marks = HashMap::new();
        let mut path = Vec::new();
        for name in self.conditions.keys() {
            self.visit(name, &mut marks, &mut path)?;
        }

        for check in self.checks.values() {
            for expr in check.condition_exprs() {
                let Some(condition) = self.conditions.get(&expr.name) else {
                    return Err(ConfigError::UnknownCondition {
                        referrer: check.id().clone(),
                        condition: expr.name.clone(),
                    });
                };
                if !check.scope().nests_in(condition.scope()) {
                    return Err(ConfigError::ScopeMismatch {
                        check: check.id().clone(),
                        check_scope: check.scope(),
                        condition: condition.name().clone(),
                        condition_scope: condition.scope(),
                    });
                }
            }
        }
        Ok(())
    }

    fn visit<'a>(
        &'a self,
        name: &'a SmolStr,
        marks: &mut HashMap<&'a SmolStr, Mark>,
        path: &mut Vec<&'a SmolStr>,
    ) -> Result<(), ConfigError> {
        match marks.get(name) {
            Some(Mark::Done) => return Ok(()),
            Some(Mark::Visiting) => {
                let start = path.iter().position(|n| *n == name).unwrap_or_default();
                let mut cycle: Vec<SmolStr> = path[start..].iter().map(|n| (*n).clone()).collect();
                cycle.push(name.clone());
                return Err(ConfigError::ConditionCycle(cycle));
            }
            None => (),
        }
        marks.insert(name, Mark::Visiting);
        path.push(name);
        if let Some(condition) = self.conditions.get(name) {
            for dep in condition.dependencies() {
                self.visit(dep, marks, path)?;
            }
        }
        path.pop();
        marks.insert(name, Mark::Done);
        Ok(())
    }
}
