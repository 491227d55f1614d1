//! Decide whether a check can run against an entity, and with what.

use indexmap::IndexMap;
use log::trace;
use smol_str::SmolStr;

use crate::{
    check::Check,
    condition::{RunEnv, Value},
    error::{ConditionError, DecodeError},
    status::Status,
    testable::Testable,
};

pub const DECODE_ERROR: &str = "decode-error";
pub const UNFULFILLED_CONDITIONS: &str = "unfulfilled-conditions";

/// The outcome of resolving a check's prerequisites.
#[derive(Debug)]
pub enum Resolution {
    /// The body may run with these bound conditions.
    Ready(IndexMap<SmolStr, Value>),
    /// Some condition doesn't hold; the body must not run.
    Unmet {
        status: Status,
        errors: Vec<ConditionError>,
    },
    /// A font the check needs doesn't decode.
    Undecodable {
        status: Status,
        errors: Vec<DecodeError>,
    },
}

/// Resolve everything `check` needs to run against `testable`.
pub fn resolve(check: &Check, testable: &Testable, env: RunEnv<'_>) -> Resolution {
    if check.requires_decoding() {
        let errors: Vec<_> = testable
            .fonts()
            .iter()
            .filter_map(|font| font.decode().err())
            .collect();
        if !errors.is_empty() {
            let message = errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("; ");
            return Resolution::Undecodable {
                status: Status::error(DECODE_ERROR, format!("Font failed to decode: {message}")),
                errors,
            };
        }
    }

    let mut bound = IndexMap::new();
    let mut unmet = Vec::new();
    let mut errors = Vec::new();
    for expr in check.condition_exprs() {
        match env.condition(&expr.name, testable) {
            Ok(value) => {
                trace!(
                    "'{}' on {}: {expr} is {}",
                    check.id(),
                    testable.id(),
                    value.is_truthy()
                );
                if value.is_truthy() == expr.negated {
                    unmet.push(expr.to_string());
                } else if !expr.negated {
                    bound.insert(expr.name.clone(), value);
                }
            }
            Err(e) => {
                unmet.push(format!("{expr} (due to evaluation error: {e})"));
                errors.push(e);
            }
        }
    }

    if unmet.is_empty() {
        return Resolution::Ready(bound);
    }
    Resolution::Unmet {
        status: Status::skip(
            UNFULFILLED_CONDITIONS,
            format!("Unfulfilled Conditions: {}", unmet.join(", ")),
        ),
        errors,
    }
}
