//! `attributes` / `excludedAttributes` projection of response documents.
//!
//! `returned = never` attributes are never rendered, `returned = always`
//! attributes always are. `returned = request` attributes only appear when
//! named in `attributes`. `schemas` is always rendered.

use crate::resource::{AttributeMap, AttributeNode, Document};
use crate::schema::{ResourceType, Returned, SchemaAttribute};
use serde_json::{Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pick {
    Omit,
    /// Render the attribute with all returnable sub-attributes
    All,
    /// Render only the sub-attributes that are picked themselves
    Some,
}

/// Resolved attribute selection of one request.
#[derive(Debug, Clone, Default)]
pub(crate) struct AttributeSelection {
    attributes: Vec<Arc<SchemaAttribute>>,
    excluded: Vec<Arc<SchemaAttribute>>,
}

impl AttributeSelection {
    /// Resolve attribute names against the resource type. Names that do not
    /// resolve are ignored.
    pub(crate) fn resolve(
        resource_type: &ResourceType,
        attributes: &[String],
        excluded: &[String],
    ) -> Self {
        let resolve = |names: &[String]| {
            names
                .iter()
                .map(|name| name.trim())
                .filter(|name| !name.is_empty())
                .filter_map(|name| {
                    let found = resource_type.find_attribute(name);
                    if found.is_none() {
                        log::debug!("Ignoring unknown attribute '{}' in projection", name);
                    }
                    found
                })
                .collect::<Vec<_>>()
        };
        Self {
            attributes: resolve(attributes),
            excluded: resolve(excluded),
        }
    }

    pub(crate) fn render(&self, document: &Document) -> Value {
        let mut object = Map::new();
        object.insert(
            "schemas".to_string(),
            Value::Array(
                document
                    .schemas()
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );
        self.render_map(document.attributes(), &mut object);
        Value::Object(object)
    }

    fn render_map(&self, map: &AttributeMap, out: &mut Map<String, Value>) {
        for (name, node) in map.iter() {
            let rendered = match node {
                AttributeNode::Extension { value, .. } => {
                    let mut inner = Map::new();
                    self.render_map(value, &mut inner);
                    (!inner.is_empty()).then_some(Value::Object(inner))
                }
                _ => node
                    .attribute()
                    .and_then(|attribute| self.render_node(attribute, node, self.pick(attribute))),
            };
            if let Some(value) = rendered {
                out.insert(name.to_string(), value);
            }
        }
    }

    fn render_node(&self, attribute: &SchemaAttribute, node: &AttributeNode, pick: Pick) -> Option<Value> {
        match (pick, node) {
            (Pick::Omit, _) => None,
            (_, AttributeNode::Complex { value, .. }) => {
                let rendered = self.render_entry(value, pick);
                (!rendered.is_empty()).then_some(Value::Object(rendered))
            }
            (_, AttributeNode::MultiComplex { values, .. }) => {
                let entries: Vec<Value> = values
                    .iter()
                    .map(|entry| self.render_entry(entry, pick))
                    .filter(|entry| !entry.is_empty())
                    .map(Value::Object)
                    .collect();
                (!entries.is_empty()).then_some(Value::Array(entries))
            }
            _ if attribute.returned == Returned::Never => None,
            _ => Some(node.to_json()),
        }
    }

    fn render_entry(&self, entry: &AttributeMap, parent: Pick) -> Map<String, Value> {
        let mut out = Map::new();
        for (name, node) in entry.iter() {
            let Some(attribute) = node.attribute() else {
                continue;
            };
            let pick = match parent {
                Pick::All if attribute.returned == Returned::Never => Pick::Omit,
                Pick::All => Pick::All,
                _ => self.pick(attribute),
            };
            if pick != Pick::Omit && attribute.returned != Returned::Never {
                out.insert(name.to_string(), node.to_json());
            }
        }
        out
    }

    fn pick(&self, attribute: &SchemaAttribute) -> Pick {
        match attribute.returned {
            Returned::Never => return Pick::Omit,
            Returned::Always => return Pick::All,
            Returned::Default | Returned::Request => {}
        }

        if !self.attributes.is_empty() {
            if self
                .attributes
                .iter()
                .any(|requested| same(requested, attribute) || is_parent_of(requested, attribute))
            {
                return Pick::All;
            }
            if self
                .attributes
                .iter()
                .any(|requested| is_parent_of(attribute, requested))
            {
                return Pick::Some;
            }
            return Pick::Omit;
        }

        if attribute.returned == Returned::Request {
            return Pick::Omit;
        }
        if self
            .excluded
            .iter()
            .any(|excluded| same(excluded, attribute) || is_parent_of(excluded, attribute))
        {
            return Pick::Omit;
        }
        if self
            .excluded
            .iter()
            .any(|excluded| is_parent_of(attribute, excluded))
        {
            return Pick::Some;
        }
        Pick::All
    }
}

fn same(a: &SchemaAttribute, b: &SchemaAttribute) -> bool {
    a.full_name().eq_ignore_ascii_case(&b.full_name())
}

fn is_parent_of(parent: &SchemaAttribute, child: &SchemaAttribute) -> bool {
    parent.parent_name.is_none()
        && parent.schema_uri.eq_ignore_ascii_case(&child.schema_uri)
        && child
            .parent_name
            .as_deref()
            .is_some_and(|name| name.eq_ignore_ascii_case(&parent.name))
}
