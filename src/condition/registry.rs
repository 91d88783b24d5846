//! The extensible kind-name registry for condition trees.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::error::PolicyError;

use super::json;
use super::Condition;

/// Builds a condition from its JSON payload.
pub type ConditionFactory =
    Arc<dyn Fn(&Value) -> Result<Condition, PolicyError> + Send + Sync>;

/// A mapping from condition kind names to factories. The kind name doubles
/// as the JSON field name of the serialized condition.
#[derive(Clone)]
pub struct ConditionRegistry {
    factories: BTreeMap<String, ConditionFactory>,
}

impl ConditionRegistry {
    /// A registry holding only the core kinds `and`, `or`, `not`, `exists`
    /// and `equals`.
    pub fn core() -> Self {
        let mut registry = ConditionRegistry {
            factories: BTreeMap::new(),
        };

        registry.register("and", Arc::new(|v| json::and_from_json(v)));
        registry.register("or", Arc::new(|v| json::or_from_json(v)));
        registry.register("not", Arc::new(|v| json::not_from_json(v)));
        registry.register("exists", Arc::new(|v| json::exists_from_json(v)));
        registry.register("equals", Arc::new(|v| json::equals_from_json(v)));

        registry
    }

    /// Register a factory under the given kind name, replacing any previous
    /// registration.
    pub fn register<S: Into<String>>(&mut self, kind: S, factory: ConditionFactory) {
        self.factories.insert(kind.into(), factory);
    }

    /// Look up the factory for a kind name.
    pub fn factory(&self, kind: &str) -> Option<ConditionFactory> {
        self.factories.get(kind).cloned()
    }

    /// The registered kind names.
    pub fn kinds(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }
}

/// The global registry consulted during policy deserialization, seeded with
/// the core kinds.
static CONDITION_REGISTRY: Lazy<RwLock<ConditionRegistry>> =
    Lazy::new(|| RwLock::new(ConditionRegistry::core()));

/// Register an additional condition kind with the global registry. Intended
/// to be called once at startup, before any policies are deserialized.
pub fn register_condition_kind<S: Into<String>>(kind: S, factory: ConditionFactory) {
    CONDITION_REGISTRY.write().unwrap().register(kind, factory);
}

/// Build a condition of the given kind from its JSON payload, consulting the
/// global registry.
pub(crate) fn resolve_condition(kind: &str, payload: &Value) -> Result<Condition, PolicyError> {
    let factory = CONDITION_REGISTRY
        .read()
        .map_err(|e| PolicyError::LockError(e.to_string()))?
        .factory(kind);

    match factory {
        Some(factory) => factory(payload),
        None => Err(PolicyError::UnknownConditionKind(kind.to_string())),
    }
}
