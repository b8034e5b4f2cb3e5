//! PATCH request payloads (RFC 7644 §3.5.2).

use crate::error::{ScimError, ScimResult};
use crate::schema::validation::lookup;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Schema URI every PATCH request body must declare.
pub const PATCH_OP_URI: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

/// PATCH operation kind. Parsed case-insensitively, so `Add` and `add` are
/// the same operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchOp {
    Add,
    Replace,
    Remove,
}

impl PatchOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        }
    }
}

impl FromStr for PatchOp {
    type Err = ScimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "add" => Ok(Self::Add),
            "replace" => Ok(Self::Replace),
            "remove" => Ok(Self::Remove),
            other => Err(ScimError::invalid_syntax(format!(
                "Unsupported PATCH operation '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PatchOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a PATCH request's `Operations` array.
#[derive(Debug, Clone, PartialEq)]
pub struct PatchOperation {
    pub op: PatchOp,
    pub path: Option<String>,
    pub value: Option<Value>,
}

impl PatchOperation {
    pub fn new(op: PatchOp, path: Option<&str>, value: Option<Value>) -> Self {
        Self {
            op,
            path: path.map(str::to_string),
            value,
        }
    }

    pub fn add(path: Option<&str>, value: Value) -> Self {
        Self::new(PatchOp::Add, path, Some(value))
    }

    pub fn replace(path: Option<&str>, value: Value) -> Self {
        Self::new(PatchOp::Replace, path, Some(value))
    }

    pub fn remove(path: &str) -> Self {
        Self::new(PatchOp::Remove, Some(path), None)
    }

    /// Parse one raw operation object.
    pub fn from_json(raw: &Value) -> ScimResult<Self> {
        let object = raw
            .as_object()
            .ok_or_else(|| ScimError::invalid_syntax("PATCH operation must be an object"))?;

        let op: PatchOp = lookup(object, "op")
            .and_then(Value::as_str)
            .ok_or_else(|| ScimError::invalid_syntax("PATCH operation must have an 'op' field"))?
            .parse()?;

        let path = match lookup(object, "path") {
            None | Some(Value::Null) => None,
            Some(Value::String(path)) if path.trim().is_empty() => None,
            Some(Value::String(path)) => Some(path.trim().to_string()),
            Some(_) => return Err(ScimError::invalid_syntax("PATCH 'path' must be a string")),
        };

        let value = lookup(object, "value").cloned();
        if op != PatchOp::Remove && value.is_none() {
            return Err(ScimError::invalid_syntax(format!(
                "PATCH '{}' operation requires a value",
                op
            )));
        }

        Ok(Self { op, path, value })
    }

    pub fn to_json(&self) -> Value {
        let mut object = serde_json::Map::new();
        object.insert("op".to_string(), Value::String(self.op.as_str().to_string()));
        if let Some(path) = &self.path {
            object.insert("path".to_string(), Value::String(path.clone()));
        }
        if let Some(value) = &self.value {
            object.insert("value".to_string(), value.clone());
        }
        Value::Object(object)
    }
}

/// A complete PATCH request body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchRequest {
    pub operations: Vec<PatchOperation>,
}

impl PatchRequest {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self { operations }
    }

    /// Parse a `PatchOp` message. The body must list [`PATCH_OP_URI`] in
    /// `schemas` and carry a non-empty `Operations` array.
    pub fn from_json(raw: &Value) -> ScimResult<Self> {
        let object = raw
            .as_object()
            .ok_or_else(|| ScimError::invalid_syntax("PATCH request must be a JSON object"))?;

        let declares_patch_op = lookup(object, "schemas")
            .and_then(Value::as_array)
            .is_some_and(|schemas| {
                schemas
                    .iter()
                    .filter_map(Value::as_str)
                    .any(|uri| uri.eq_ignore_ascii_case(PATCH_OP_URI))
            });
        if !declares_patch_op {
            return Err(ScimError::invalid_syntax(format!(
                "PATCH request must declare schema '{}'",
                PATCH_OP_URI
            )));
        }

        let operations = lookup(object, "Operations")
            .and_then(Value::as_array)
            .ok_or_else(|| ScimError::invalid_syntax("PATCH request must have an 'Operations' array"))?;
        if operations.is_empty() {
            return Err(ScimError::invalid_syntax("PATCH request has no operations"));
        }

        operations
            .iter()
            .map(PatchOperation::from_json)
            .collect::<ScimResult<Vec<_>>>()
            .map(Self::new)
    }
}
