//! Rewrites for PATCH payloads sent by non-conformant clients.
//!
//! A [`WorkaroundChain`] is an ordered list of predicate and transform pairs.
//! Every operation of a request runs through the chain in registration order
//! before it is interpreted. A workaround that fires may stop the chain for
//! the operations it produced.

use super::operation::{PatchOp, PatchOperation};
use crate::filter::parse_path;
use crate::schema::ResourceType;
use serde_json::{Value, json};
use std::fmt;

type Predicate = Box<dyn Fn(&PatchOperation, &ResourceType) -> bool + Send + Sync>;
type Transform = Box<dyn Fn(PatchOperation, &ResourceType) -> Vec<PatchOperation> + Send + Sync>;

/// One rewrite rule.
pub struct Workaround {
    name: String,
    applies: Predicate,
    rewrite: Transform,
    continue_chain: bool,
}

impl Workaround {
    pub fn new<P, T>(name: impl Into<String>, applies: P, rewrite: T) -> Self
    where
        P: Fn(&PatchOperation, &ResourceType) -> bool + Send + Sync + 'static,
        T: Fn(PatchOperation, &ResourceType) -> Vec<PatchOperation> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            applies: Box::new(applies),
            rewrite: Box::new(rewrite),
            continue_chain: true,
        }
    }

    /// Stop evaluating later workarounds once this one has fired.
    pub fn stop_chain(mut self) -> Self {
        self.continue_chain = false;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn continues_chain(&self) -> bool {
        self.continue_chain
    }

    /// `remove` with a path and a `[{"value": X}, ...]` payload becomes one
    /// `remove` per value, targeting `path[value eq X]`.
    pub fn remove_with_value() -> Self {
        Self::new(
            "remove-with-value",
            |op, _| {
                op.op == PatchOp::Remove
                    && op.path.as_deref().is_some_and(|p| !p.contains('['))
                    && op.value.as_ref().is_some_and(|v| !removal_values(v).is_empty())
            },
            |op, _| {
                let path = op.path.clone().unwrap_or_default();
                op.value
                    .as_ref()
                    .map(removal_values)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|value| {
                        let literal = serde_json::to_string(&value).unwrap_or_default();
                        PatchOperation::remove(&format!("{}[value eq {}]", path, literal))
                    })
                    .collect()
            },
        )
        .stop_chain()
    }

    /// `add`/`replace` of a bare scalar on a complex attribute with a `value`
    /// sub-attribute wraps the scalar as `{"value": ...}`.
    pub fn complex_simple_value() -> Self {
        Self::new(
            "complex-simple-value",
            |op, resource_type| {
                if op.op == PatchOp::Remove {
                    return false;
                }
                let scalar = matches!(
                    op.value,
                    Some(Value::String(_) | Value::Number(_) | Value::Bool(_))
                );
                scalar
                    && op
                        .path
                        .as_deref()
                        .and_then(|p| parse_path(p, resource_type).ok())
                        .is_some_and(|path| {
                            path.sub_attribute.is_none()
                                && path.attribute.is_complex()
                                && path.attribute.sub_attribute("value").is_some()
                        })
            },
            |mut op, _| {
                op.value = op.value.take().map(|v| json!({ "value": v }));
                vec![op]
            },
        )
    }

    /// `{"value": "<json object text>"}` is replaced by the embedded object.
    pub fn stringified_value() -> Self {
        Self::new(
            "stringified-value",
            |op, _| op.value.as_ref().and_then(embedded_object).is_some(),
            |mut op, _| {
                if let Some(embedded) = op.value.as_ref().and_then(embedded_object) {
                    op.value = Some(embedded);
                }
                vec![op]
            },
        )
    }
}

impl fmt::Debug for Workaround {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Workaround")
            .field("name", &self.name)
            .field("continue_chain", &self.continue_chain)
            .finish()
    }
}

fn removal_values(value: &Value) -> Vec<Value> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        single @ Value::Object(_) => std::slice::from_ref(single),
        _ => return Vec::new(),
    };
    items
        .iter()
        .filter_map(|item| item.get("value"))
        .filter(|v| matches!(v, Value::String(_) | Value::Number(_) | Value::Bool(_)))
        .cloned()
        .collect()
}

fn embedded_object(value: &Value) -> Option<Value> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    let text = object.get("value")?.as_str()?.trim();
    if !text.starts_with('{') {
        return None;
    }
    serde_json::from_str::<Value>(text)
        .ok()
        .filter(Value::is_object)
}

/// Ordered workaround list.
#[derive(Debug, Default)]
pub struct WorkaroundChain {
    workarounds: Vec<Workaround>,
}

impl WorkaroundChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, workaround: Workaround) {
        self.workarounds.push(workaround);
    }

    pub fn with(mut self, workaround: Workaround) -> Self {
        self.push(workaround);
        self
    }

    pub fn len(&self) -> usize {
        self.workarounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workarounds.is_empty()
    }

    /// Run one operation through the chain.
    pub fn apply(&self, operation: PatchOperation, resource_type: &ResourceType) -> Vec<PatchOperation> {
        let mut operations = vec![operation];
        for workaround in &self.workarounds {
            let mut fired = false;
            operations = operations
                .into_iter()
                .flat_map(|op| {
                    if (workaround.applies)(&op, resource_type) {
                        log::debug!("Applying PATCH workaround '{}'", workaround.name);
                        fired = true;
                        (workaround.rewrite)(op, resource_type)
                    } else {
                        vec![op]
                    }
                })
                .collect();
            if fired && !workaround.continue_chain {
                break;
            }
        }
        operations
    }
}
