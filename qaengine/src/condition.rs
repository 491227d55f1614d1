//! Named, memoized facts about testables that checks depend on.
//!
//! A condition is computed at most once per enclosing entity per run. Both
//! values and errors are cached; every consumer sees the same outcome.

use std::{
    any::Any,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    fmt::Debug,
    panic::AssertUnwindSafe,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, OnceLock,
    },
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};
use parking_lot::Mutex;
use smol_str::SmolStr;

use crate::{
    error::ConditionError,
    font::Font,
    registry::Registry,
    runner::get_panic_message,
    testable::{EntityId, RunContext, Scope, Testable},
};

/// Values that can gate a check.
///
/// Anything empty, zero or false is falsy.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

macro_rules! truthy_numbers {
    ($($ty:ty),*) => {
        $(impl Truthy for $ty {
            fn is_truthy(&self) -> bool {
                *self != (0 as $ty)
            }
        })*
    };
}

truthy_numbers!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize, f32, f64);

macro_rules! truthy_containers {
    ($($ty:ty => [$($gen:ident),*]),*) => {
        $(impl<$($gen),*> Truthy for $ty {
            fn is_truthy(&self) -> bool {
                !self.is_empty()
            }
        })*
    };
}

truthy_containers!(
    String => [],
    &'static str => [],
    Vec<T> => [T],
    BTreeSet<T> => [T],
    BTreeMap<K, V> => [K, V],
    HashSet<T> => [T],
    HashMap<K, V> => [K, V],
    IndexSet<T> => [T],
    IndexMap<K, V> => [K, V]
);

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl<T: Truthy> Truthy for Arc<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_truthy()
    }
}

/// The value of a condition, type-erased.
#[derive(Clone)]
pub struct Value {
    inner: Arc<dyn Any + Send + Sync>,
    truthy: bool,
    type_name: &'static str,
}

impl Value {
    pub fn new<T: Truthy + Any + Send + Sync>(value: T) -> Value {
        Value {
            truthy: value.is_truthy(),
            inner: Arc::new(value),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn is_truthy(&self) -> bool {
        self.truthy
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.inner.clone().downcast::<T>().ok()
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Value")
            .field("type", &self.type_name)
            .field("truthy", &self.truthy)
            .finish()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::new(value)
    }
}

pub type ConditionFn =
    Arc<dyn Fn(&ConditionInput<'_>) -> Result<Value, ConditionError> + Send + Sync>;

/// A named computation over a testable of a given scope.
#[derive(Clone)]
pub struct Condition {
    name: SmolStr,
    scope: Scope,
    dependencies: Vec<SmolStr>,
    compute: ConditionFn,
}

impl Condition {
    pub fn new(
        name: &str,
        scope: Scope,
        compute: impl Fn(&ConditionInput<'_>) -> Result<Value, ConditionError> + Send + Sync + 'static,
    ) -> Condition {
        Condition {
            name: name.into(),
            scope,
            dependencies: Vec::new(),
            compute: Arc::new(compute),
        }
    }

    /// Conditions this one may read through [`ConditionInput::get`].
    pub fn depends_on(mut self, dependencies: &[&str]) -> Condition {
        self.dependencies
            .extend(dependencies.iter().map(|d| SmolStr::new(d)));
        self
    }

    pub fn name(&self) -> &SmolStr {
        &self.name
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn dependencies(&self) -> &[SmolStr] {
        &self.dependencies
    }
}

impl Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("scope", &self.scope)
            .field("dependencies", &self.dependencies)
            .finish()
    }
}

/// What resolving a condition needs: the definitions, the run and the cache.
#[derive(Clone, Copy)]
pub struct RunEnv<'a> {
    pub registry: &'a Registry,
    pub run: &'a RunContext,
    pub cache: &'a ConditionCache,
}

impl<'a> RunEnv<'a> {
    /// The outcome of `name` for the entity enclosing `testable`.
    pub fn condition(&self, name: &str, testable: &Testable) -> Result<Value, ConditionError> {
        self.cache.get_or_compute(*self, name, testable)
    }
}

/// What a condition's computation sees.
pub struct ConditionInput<'a> {
    condition: &'a Condition,
    testable: &'a Testable,
    env: RunEnv<'a>,
}

impl<'a> ConditionInput<'a> {
    pub fn testable(&self) -> &'a Testable {
        self.testable
    }

    pub fn run(&self) -> &'a RunContext {
        self.env.run
    }

    pub fn fonts(&self) -> &'a [Arc<Font>] {
        self.testable.fonts()
    }

    /// The font, for conditions over single fonts.
    pub fn font(&self) -> Result<&'a Arc<Font>, ConditionError> {
        self.testable
            .as_font()
            .ok_or_else(|| ConditionError::NotAFont(self.testable.id().clone()))
    }

    /// The value of a declared dependency for this condition's entity.
    pub fn get<T: Any + Send + Sync>(&self, dependency: &str) -> Result<Arc<T>, ConditionError> {
        self.get_for(dependency, self.testable)
    }

    /// The value of a declared dependency for some other entity.
    ///
    /// Lets a condition over a group read per-font conditions of its members.
    pub fn get_for<T: Any + Send + Sync>(
        &self,
        dependency: &str,
        testable: &Testable,
    ) -> Result<Arc<T>, ConditionError> {
        let value = self.value_for(dependency, testable)?;
        value.downcast::<T>().ok_or_else(|| ConditionError::WrongType {
            condition: dependency.into(),
            expected: std::any::type_name::<T>(),
            actual: value.type_name(),
        })
    }

    /// The untyped value of a declared dependency.
    pub fn value_for(&self, dependency: &str, testable: &Testable) -> Result<Value, ConditionError> {
        if !self.condition.dependencies.iter().any(|d| d == dependency) {
            return Err(ConditionError::Undeclared {
                condition: self.condition.name.clone(),
                dependency: dependency.into(),
            });
        }
        self.env.condition(dependency, testable)
    }
}

/// Identifies one cached condition outcome.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub condition: SmolStr,
    pub entity: EntityId,
}

type Slot = Arc<OnceLock<Result<Value, ConditionError>>>;

/// Run-scoped memo of condition outcomes.
///
/// The map lock is only held to find or create a slot. Computation happens
/// inside the slot, so concurrent askers for one key wait for a single
/// evaluation while other keys proceed.
#[derive(Default)]
pub struct ConditionCache {
    slots: Mutex<HashMap<CacheKey, Slot>>,
    evaluations: AtomicUsize,
}

impl ConditionCache {
    pub fn new() -> ConditionCache {
        Default::default()
    }

    /// How many times any condition has actually been computed.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Acquire)
    }

    /// How many outcomes are cached or in progress.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A cached outcome, if there is one.
    pub fn peek(&self, key: &CacheKey) -> Option<Result<Value, ConditionError>> {
        let slot = self.slots.lock().get(key).cloned()?;
        slot.get().cloned()
    }

    pub fn get_or_compute(
        &self,
        env: RunEnv<'_>,
        name: &str,
        testable: &Testable,
    ) -> Result<Value, ConditionError> {
        let condition = env
            .registry
            .condition(name)
            .ok_or_else(|| ConditionError::Unknown(name.into()))?;
        let target = env
            .run
            .enclosing(testable, condition.scope())
            .ok_or_else(|| ConditionError::NoEnclosingEntity {
                condition: condition.name().clone(),
                scope: condition.scope(),
                entity: testable.id().clone(),
            })?;
        let key = CacheKey {
            condition: condition.name().clone(),
            entity: target.id().clone(),
        };
        let slot = self.slots.lock().entry(key).or_default().clone();
        if let Some(outcome) = slot.get() {
            trace!("Reusing '{}' for {}", condition.name(), target.id());
            return outcome.clone();
        }
        slot.get_or_init(|| self.evaluate(env, condition, &target))
            .clone()
    }

    fn evaluate(
        &self,
        env: RunEnv<'_>,
        condition: &Condition,
        target: &Testable,
    ) -> Result<Value, ConditionError> {
        self.evaluations.fetch_add(1, Ordering::AcqRel);
        debug!("Evaluating '{}' for {}", condition.name(), target.id());
        let input = ConditionInput {
            condition,
            testable: target,
            env,
        };
        let result = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            (condition.compute)(&input)
        })) {
            Ok(result) => result,
            Err(err) => Err(ConditionError::Panicked {
                condition: condition.name().clone(),
                message: get_panic_message(err),
            }),
        };
        if let Err(e) = &result {
            debug!("'{}' for {} failed: {e}", condition.name(), target.id());
        }
        result
    }
}
