//! Recursive boolean condition trees gating access rules.
//!
//! A condition tree is evaluated against an
//! [`AuthorizationContext`](crate::traits::AuthorizationContext) which
//! resolves [`Specifier`]s to values. The tree is composed of the core kinds
//! `and`, `or`, `not`, `exists` and `equals`; further kinds can be added
//! through the [`registry`].

mod json;
mod registry;

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;

use crate::specifier::Specifier;
use crate::traits::AuthorizationContext;

pub use registry::{register_condition_kind, ConditionFactory, ConditionRegistry};

/// A leaf condition kind provided by a third party and registered under a
/// unique name via [`register_condition_kind`].
pub trait CustomCondition: std::fmt::Debug + Send + Sync {
    /// The registered kind name, used as the JSON field name.
    fn kind(&self) -> &str;

    /// Evaluate the condition against the given context.
    fn matches(&self, context: &dyn AuthorizationContext) -> bool;

    /// The JSON payload this condition serializes to.
    fn to_json(&self) -> Value;
}

/// A node of a condition tree.
#[derive(Debug, Clone)]
pub enum Condition {
    /// True iff all children are true. The empty `and` is true.
    And(CompositeCondition),

    /// True iff any child is true. The empty `or` is false.
    Or(CompositeCondition),

    /// True iff all children are false: a `not` wraps one or more conditions
    /// and negates their disjunction. The empty `not` is true.
    Not(CompositeCondition),

    /// True iff every target resolves to a non-null value.
    Exists(ExistsCondition),

    /// True iff every predicate's resolved value equals one of its expected
    /// values.
    Equals(EqualsCondition),

    /// A registered third-party condition kind.
    Custom(Arc<dyn CustomCondition>),
}

impl Condition {
    /// The kind name under which this condition serializes.
    pub fn kind(&self) -> &str {
        match self {
            Condition::And(_) => "and",
            Condition::Or(_) => "or",
            Condition::Not(_) => "not",
            Condition::Exists(_) => "exists",
            Condition::Equals(_) => "equals",
            Condition::Custom(custom) => custom.kind(),
        }
    }

    /// Evaluate this condition against the given context. Evaluation is pure
    /// and free of side effects.
    pub fn matches(&self, context: &dyn AuthorizationContext) -> bool {
        match self {
            Condition::And(composite) => {
                composite.conditions.iter().all(|c| c.matches(context))
            }
            Condition::Or(composite) => {
                composite.conditions.iter().any(|c| c.matches(context))
            }
            Condition::Not(composite) => {
                composite.conditions.iter().all(|c| !c.matches(context))
            }
            Condition::Exists(exists) => exists
                .targets
                .iter()
                .all(|t| context.resolve_value(t).is_some_and(|v| !v.is_null())),
            Condition::Equals(equals) => {
                equals.predicates.iter().all(|(target, expected)| {
                    context
                        .resolve_value(target)
                        .is_some_and(|v| expected.contains(&v))
                })
            }
            Condition::Custom(custom) => custom.matches(context),
        }
    }
}

impl PartialEq for Condition {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Condition::And(a), Condition::And(b)) => a == b,
            (Condition::Or(a), Condition::Or(b)) => a == b,
            (Condition::Not(a), Condition::Not(b)) => a == b,
            (Condition::Exists(a), Condition::Exists(b)) => a == b,
            (Condition::Equals(a), Condition::Equals(b)) => a == b,
            (Condition::Custom(a), Condition::Custom(b)) => {
                a.kind() == b.kind() && a.to_json() == b.to_json()
            }
            _ => false,
        }
    }
}

/// A named list of child conditions, owned by an `and`, `or` or `not` node.
/// Child order is kept for readability but is irrelevant for evaluation.
///
/// The empty composite doubles as the "no conditions" marker on an access
/// rule, where it is satisfied by any context (and-identity).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompositeCondition {
    /// An optional name used for diagnostics only.
    pub name: Option<String>,

    /// The child conditions, in insertion order.
    pub conditions: Vec<Condition>,
}

impl CompositeCondition {
    pub fn new() -> Self {
        CompositeCondition::default()
    }

    pub fn of<I: IntoIterator<Item = Condition>>(conditions: I) -> Self {
        CompositeCondition {
            name: None,
            conditions: conditions.into_iter().collect(),
        }
    }

    pub fn add_condition(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate this composite with and-semantics, the rooting used by
    /// access rules.
    pub fn matches(&self, context: &dyn AuthorizationContext) -> bool {
        self.conditions.iter().all(|c| c.matches(context))
    }
}

/// The `exists` leaf: all targets must resolve to non-null values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExistsCondition {
    pub name: Option<String>,
    pub targets: Vec<Specifier>,
}

impl ExistsCondition {
    pub fn of<I: IntoIterator<Item = Specifier>>(targets: I) -> Self {
        ExistsCondition {
            name: None,
            targets: targets.into_iter().collect(),
        }
    }
}

/// The `equals` leaf: every predicate's resolved value must deep-equal at
/// least one of the expected values. Comparison honors JSON types; the
/// boolean `true` does not equal the string `"true"`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EqualsCondition {
    pub name: Option<String>,
    pub predicates: BTreeMap<Specifier, Vec<Value>>,
}

impl EqualsCondition {
    pub fn of<I>(predicates: I) -> Self
    where
        I: IntoIterator<Item = (Specifier, Vec<Value>)>,
    {
        EqualsCondition {
            name: None,
            predicates: predicates.into_iter().collect(),
        }
    }
}
