//! The JSON marshalling contract for condition trees.
//!
//! A composite serializes in *simple form*, one object field per condition
//! kind, whenever its child kinds are pairwise distinct:
//!
//! ```json
//! { "equals": { "foo": ["bar"] }, "exists": { "targets": ["baz"] } }
//! ```
//!
//! When a kind repeats, the children move into the reserved `conditions`
//! array (*array form*), each entry holding one or more kind-keyed objects:
//!
//! ```json
//! { "conditions": [ { "equals": { "foo1": [true] } },
//!                   { "equals": { "foo2": [true] } } ] }
//! ```
//!
//! Both forms may be mixed within one composite. The field `name` carries an
//! optional diagnostic label. Any other field name must be a registered
//! condition kind; unknown names are rejected.

use std::collections::HashSet;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::error::PolicyError;
use crate::specifier::Specifier;

use super::registry::resolve_condition;
use super::{CompositeCondition, Condition, EqualsCondition, ExistsCondition};

pub(crate) fn and_from_json(payload: &Value) -> Result<Condition, PolicyError> {
    Ok(Condition::And(composite_from_json(payload)?))
}

pub(crate) fn or_from_json(payload: &Value) -> Result<Condition, PolicyError> {
    Ok(Condition::Or(composite_from_json(payload)?))
}

pub(crate) fn not_from_json(payload: &Value) -> Result<Condition, PolicyError> {
    Ok(Condition::Not(composite_from_json(payload)?))
}

/// Parse an `exists` payload. Accepts the singular `target` as well as the
/// plural `targets`; serialization always emits `targets`.
pub(crate) fn exists_from_json(payload: &Value) -> Result<Condition, PolicyError> {
    let object = payload_object(payload, "exists")?;

    let mut exists = ExistsCondition::default();
    for (key, value) in object {
        match key.as_str() {
            "name" => exists.name = name_from_json(value)?,
            "target" => exists.targets.push(specifier_from_json(value)?),
            "targets" => {
                let items = value.as_array().ok_or_else(|| {
                    PolicyError::InvalidPolicy("exists targets must be an array".into())
                })?;
                for item in items {
                    exists.targets.push(specifier_from_json(item)?);
                }
            }
            other => {
                return Err(PolicyError::InvalidPolicy(format!(
                    "unrecognized field `{other}` in exists condition"
                )))
            }
        }
    }

    Ok(Condition::Exists(exists))
}

/// Parse an `equals` payload: a map from specifier to the expected value or
/// list of expected values. A scalar is normalized to a one-element list.
pub(crate) fn equals_from_json(payload: &Value) -> Result<Condition, PolicyError> {
    let object = payload_object(payload, "equals")?;

    let mut equals = EqualsCondition::default();
    for (key, value) in object {
        if key == "name" {
            equals.name = name_from_json(value)?;
            continue;
        }

        let target = Specifier::parse(key)?;
        let expected = match value {
            Value::Array(items) => items.clone(),
            scalar => vec![scalar.clone()],
        };
        equals.predicates.insert(target, expected);
    }

    Ok(Condition::Equals(equals))
}

/// Parse a composite payload, accepting simple form, array form and any mix
/// of the two.
pub(crate) fn composite_from_json(payload: &Value) -> Result<CompositeCondition, PolicyError> {
    let object = payload_object(payload, "composite")?;

    let mut composite = CompositeCondition::new();
    for (key, value) in object {
        match key.as_str() {
            "name" => composite.name = name_from_json(value)?,
            "conditions" => conditions_array_from_json(value, &mut composite)?,
            kind => composite.add_condition(resolve_condition(kind, value)?),
        }
    }

    Ok(composite)
}

fn conditions_array_from_json(
    value: &Value,
    composite: &mut CompositeCondition,
) -> Result<(), PolicyError> {
    match value {
        Value::Null => Ok(()),
        Value::Array(entries) => {
            for entry in entries {
                // each entry holds one or more conditions keyed by kind
                let object = payload_object(entry, "conditions array entry")?;
                for (kind, payload) in object {
                    composite.add_condition(resolve_condition(kind, payload)?);
                }
            }
            Ok(())
        }
        _ => Err(PolicyError::InvalidPolicy(
            "`conditions` must be an array of kind-keyed objects".into(),
        )),
    }
}

fn payload_object<'a>(
    payload: &'a Value,
    kind: &str,
) -> Result<&'a Map<String, Value>, PolicyError> {
    payload.as_object().ok_or_else(|| {
        PolicyError::InvalidPolicy(format!("{kind} condition payload must be an object"))
    })
}

fn name_from_json(value: &Value) -> Result<Option<String>, PolicyError> {
    match value {
        Value::Null => Ok(None),
        Value::String(name) => Ok(Some(name.clone())),
        _ => Err(PolicyError::InvalidPolicy(
            "condition name must be a string".into(),
        )),
    }
}

fn specifier_from_json(value: &Value) -> Result<Specifier, PolicyError> {
    let s = value.as_str().ok_or_else(|| {
        PolicyError::InvalidPolicy("exists target must be a string".into())
    })?;
    Specifier::parse(s)
}

/// Render a composite payload, choosing simple form when the child kinds are
/// pairwise distinct and array form otherwise.
pub(crate) fn composite_to_json(composite: &CompositeCondition) -> Value {
    let mut object = Map::new();

    if let Some(name) = &composite.name {
        object.insert("name".into(), Value::String(name.clone()));
    }

    let distinct: HashSet<&str> = composite.conditions.iter().map(Condition::kind).collect();
    if distinct.len() == composite.conditions.len() {
        for condition in &composite.conditions {
            object.insert(condition.kind().into(), condition_payload(condition));
        }
    } else {
        let entries: Vec<Value> = composite
            .conditions
            .iter()
            .map(|condition| {
                let mut entry = Map::new();
                entry.insert(condition.kind().into(), condition_payload(condition));
                Value::Object(entry)
            })
            .collect();
        object.insert("conditions".into(), Value::Array(entries));
    }

    Value::Object(object)
}

fn condition_payload(condition: &Condition) -> Value {
    match condition {
        Condition::And(composite) | Condition::Or(composite) | Condition::Not(composite) => {
            composite_to_json(composite)
        }
        Condition::Exists(exists) => {
            let mut object = Map::new();
            if let Some(name) = &exists.name {
                object.insert("name".into(), Value::String(name.clone()));
            }
            object.insert(
                "targets".into(),
                Value::Array(
                    exists
                        .targets
                        .iter()
                        .map(|t| Value::String(t.as_string()))
                        .collect(),
                ),
            );
            Value::Object(object)
        }
        Condition::Equals(equals) => {
            let mut object = Map::new();
            if let Some(name) = &equals.name {
                object.insert("name".into(), Value::String(name.clone()));
            }
            for (target, expected) in &equals.predicates {
                object.insert(target.as_string(), Value::Array(expected.clone()));
            }
            Value::Object(object)
        }
        Condition::Custom(custom) => custom.to_json(),
    }
}

impl CompositeCondition {
    /// Parse an and-rooted composite from its JSON payload.
    pub fn from_json(payload: &Value) -> Result<Self, PolicyError> {
        composite_from_json(payload)
    }

    /// Render this composite to its JSON payload.
    pub fn to_json(&self) -> Value {
        composite_to_json(self)
    }
}

impl Condition {
    /// Render this condition as a single kind-keyed JSON object.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(self.kind().into(), condition_payload(self));
        Value::Object(object)
    }
}

impl Serialize for CompositeCondition {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        composite_to_json(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CompositeCondition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let payload = Value::deserialize(deserializer)?;
        composite_from_json(&payload).map_err(DeError::custom)
    }
}
