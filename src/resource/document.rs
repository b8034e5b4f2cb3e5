//! Schema-bound resource documents.
//!
//! A [`Document`] is the validated, typed form of a SCIM resource. Every node
//! carries the [`SchemaAttribute`] it was validated against, so consumers read
//! values through schema metadata rather than by probing raw JSON. Extension
//! attributes live under an [`AttributeNode::Extension`] keyed by the
//! extension's schema URI, mirroring the wire format.

use super::value::ScalarValue;
use crate::schema::{ResourceType, Schema, SchemaAttribute};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Ordered attribute map with case-insensitive lookup.
///
/// Keys are stored with the schema's canonical spelling.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributeMap {
    entries: Vec<(String, AttributeNode)>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&AttributeNode> {
        self.entries
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttributeNode> {
        self.entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, node)| node)
    }

    /// Insert or replace, keeping the position of an existing key.
    pub fn insert(&mut self, name: impl Into<String>, node: AttributeNode) {
        let name = name.into();
        match self
            .entries
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(&name))
        {
            Some(entry) => *entry = (name, node),
            None => self.entries.push((name, node)),
        }
    }

    /// The node stored under `name`, inserting `node()` at the end when absent.
    pub fn get_or_insert_with(
        &mut self,
        name: &str,
        node: impl FnOnce() -> AttributeNode,
    ) -> &mut AttributeNode {
        let index = match self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            Some(index) => index,
            None => {
                self.entries.push((name.to_string(), node()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    pub fn remove(&mut self, name: &str) -> Option<AttributeNode> {
        let index = self
            .entries
            .iter()
            .position(|(key, _)| key.eq_ignore_ascii_case(name))?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeNode)> {
        self.entries.iter().map(|(key, node)| (key.as_str(), node))
    }

    /// The scalar held by a single-valued simple attribute.
    pub fn scalar(&self, name: &str) -> Option<&ScalarValue> {
        match self.get(name)? {
            AttributeNode::Simple { value, .. } => Some(value),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.to_json_map())
    }

    fn to_json_map(&self) -> Map<String, Value> {
        self.entries
            .iter()
            .map(|(key, node)| (key.clone(), node.to_json()))
            .collect()
    }
}

/// One attribute value in a document.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeNode {
    Simple {
        attribute: Arc<SchemaAttribute>,
        value: ScalarValue,
    },
    MultiSimple {
        attribute: Arc<SchemaAttribute>,
        values: Vec<ScalarValue>,
    },
    Complex {
        attribute: Arc<SchemaAttribute>,
        value: AttributeMap,
    },
    MultiComplex {
        attribute: Arc<SchemaAttribute>,
        values: Vec<AttributeMap>,
    },
    /// Attributes contributed by one schema extension
    Extension {
        schema: Arc<Schema>,
        value: AttributeMap,
    },
}

impl AttributeNode {
    fn empty_extension(schema: &Arc<Schema>) -> Self {
        Self::Extension {
            schema: Arc::clone(schema),
            value: AttributeMap::new(),
        }
    }

    /// Attributes of an extension container. Any other node is replaced by
    /// an empty container first.
    fn extension_value_mut(&mut self, schema: &Arc<Schema>) -> &mut AttributeMap {
        match self {
            Self::Extension { value, .. } => value,
            other => {
                *other = Self::empty_extension(schema);
                other.extension_value_mut(schema)
            }
        }
    }

    /// Schema attribute of the node; `None` for extension containers.
    pub fn attribute(&self) -> Option<&Arc<SchemaAttribute>> {
        match self {
            Self::Simple { attribute, .. }
            | Self::MultiSimple { attribute, .. }
            | Self::Complex { attribute, .. }
            | Self::MultiComplex { attribute, .. } => Some(attribute),
            Self::Extension { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Simple { .. } => false,
            Self::MultiSimple { values, .. } => values.is_empty(),
            Self::Complex { value, .. } | Self::Extension { value, .. } => value.is_empty(),
            Self::MultiComplex { values, .. } => values.is_empty(),
        }
    }

    /// Scalars held directly by simple nodes.
    pub fn scalars(&self) -> Vec<&ScalarValue> {
        match self {
            Self::Simple { value, .. } => vec![value],
            Self::MultiSimple { values, .. } => values.iter().collect(),
            _ => Vec::new(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Simple { value, .. } => value.to_json(),
            Self::MultiSimple { values, .. } => {
                Value::Array(values.iter().map(ScalarValue::to_json).collect())
            }
            Self::Complex { value, .. } | Self::Extension { value, .. } => value.to_json(),
            Self::MultiComplex { values, .. } => {
                Value::Array(values.iter().map(AttributeMap::to_json).collect())
            }
        }
    }
}

/// A validated SCIM resource.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    schemas: Vec<String>,
    attributes: AttributeMap,
}

impl Document {
    pub fn new(schemas: Vec<String>, attributes: AttributeMap) -> Self {
        Self {
            schemas,
            attributes,
        }
    }

    pub fn schemas(&self) -> &[String] {
        &self.schemas
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut AttributeMap {
        &mut self.attributes
    }

    pub fn id(&self) -> Option<&str> {
        self.attributes.scalar("id").and_then(ScalarValue::as_str)
    }

    /// Raw `meta.version` value, if set.
    pub fn version(&self) -> Option<&str> {
        match self.attributes.get("meta")? {
            AttributeNode::Complex { value, .. } => {
                value.scalar("version").and_then(ScalarValue::as_str)
            }
            _ => None,
        }
    }

    /// Set the server-assigned `id`.
    pub fn set_id(&mut self, resource_type: &ResourceType, id: impl Into<String>) {
        if let Some(attribute) = resource_type.core_attribute("id") {
            self.attributes.insert(
                attribute.name.clone(),
                AttributeNode::Simple {
                    attribute: Arc::clone(attribute),
                    value: ScalarValue::String(id.into()),
                },
            );
        }
    }

    /// Extension container for `uri`, if present.
    pub fn extension(&self, uri: &str) -> Option<&AttributeMap> {
        match self.attributes.get(uri)? {
            AttributeNode::Extension { value, .. } => Some(value),
            _ => None,
        }
    }

    /// The map holding the top-level attribute that `attribute` belongs to.
    fn container_of(&self, attribute: &SchemaAttribute) -> Option<&AttributeMap> {
        if let Some(extension) = self.extension(&attribute.schema_uri) {
            return Some(extension);
        }
        Some(&self.attributes)
    }

    /// Top-level node for `attribute` (or for its parent, for sub-attributes).
    fn top_level(&self, attribute: &SchemaAttribute) -> Option<&AttributeNode> {
        let name = attribute.parent_name.as_deref().unwrap_or(&attribute.name);
        let node = self.container_of(attribute)?.get(name)?;
        node.attribute()
            .filter(|declared| declared.schema_uri == attribute.schema_uri)
            .map(|_| node)
    }

    /// Node of a top-level attribute, or of a sub-attribute of a
    /// single-valued complex attribute.
    pub fn get(&self, attribute: &SchemaAttribute) -> Option<&AttributeNode> {
        let node = self.top_level(attribute)?;
        match (&attribute.parent_name, node) {
            (None, node) => Some(node),
            (Some(_), AttributeNode::Complex { value, .. }) => value.get(&attribute.name),
            _ => None,
        }
    }

    /// Every scalar reachable for `attribute`.
    ///
    /// Sub-attributes of multi-valued complex attributes yield one value per
    /// entry; multi-valued simple attributes yield all their values.
    pub fn values_of(&self, attribute: &SchemaAttribute) -> Vec<&ScalarValue> {
        let Some(node) = self.top_level(attribute) else {
            return Vec::new();
        };
        match (&attribute.parent_name, node) {
            (None, node) => node.scalars(),
            (Some(_), AttributeNode::Complex { value, .. }) => value
                .get(&attribute.name)
                .map(AttributeNode::scalars)
                .unwrap_or_default(),
            (Some(_), AttributeNode::MultiComplex { values, .. }) => values
                .iter()
                .filter_map(|entry| entry.get(&attribute.name))
                .flat_map(AttributeNode::scalars)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Entries of a multi-valued complex attribute.
    pub fn complex_entries(&self, attribute: &SchemaAttribute) -> &[AttributeMap] {
        match self.top_level(attribute) {
            Some(AttributeNode::MultiComplex { values, .. }) if attribute.parent_name.is_none() => {
                values
            }
            _ => &[],
        }
    }

    /// Mutable map that holds (or will hold) the top-level `attribute`.
    ///
    /// Extension containers are created on demand and their URI added to
    /// `schemas`.
    pub fn container_mut(
        &mut self,
        resource_type: &ResourceType,
        attribute: &SchemaAttribute,
    ) -> &mut AttributeMap {
        match resource_type.extension(&attribute.schema_uri) {
            Some(extension) => self.extension_mut(&extension.schema),
            None => &mut self.attributes,
        }
    }

    /// Mutable extension container, created when missing.
    pub fn extension_mut(&mut self, schema: &Arc<Schema>) -> &mut AttributeMap {
        if !self
            .schemas
            .iter()
            .any(|uri| uri.eq_ignore_ascii_case(&schema.id))
        {
            self.schemas.push(schema.id.clone());
        }
        self.attributes
            .get_or_insert_with(&schema.id, || AttributeNode::empty_extension(schema))
            .extension_value_mut(schema)
    }

    /// Drop an extension container and its `schemas` entry.
    pub fn remove_extension(&mut self, uri: &str) -> Option<AttributeMap> {
        self.schemas.retain(|s| !s.eq_ignore_ascii_case(uri));
        match self.attributes.remove(uri)? {
            AttributeNode::Extension { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Wire representation with `schemas` first.
    pub fn to_json(&self) -> Value {
        let mut object = Map::new();
        object.insert(
            "schemas".to_string(),
            Value::Array(self.schemas.iter().cloned().map(Value::String).collect()),
        );
        object.extend(self.attributes.to_json_map());
        Value::Object(object)
    }
}
