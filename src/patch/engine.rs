//! PATCH interpretation over typed documents.
//!
//! Operations are applied in order to a copy of the stored document; the
//! copy is only returned once every operation succeeded and the result passed
//! full schema validation, so a failing request never leaves a partially
//! patched resource behind.

use super::operation::{PatchOp, PatchOperation};
use super::path::{PatchPath, Target};
use super::workarounds::{Workaround, WorkaroundChain};
use crate::error::{ScimError, ScimResult};
use crate::filter::FilterNode;
use crate::resource::document::{AttributeMap, AttributeNode, Document};
use crate::resource::value::ScalarValue;
use crate::schema::validation::validate_attribute_value;
use crate::schema::{Mutability, OperationContext, ResourceType, Schema, SchemaAttribute, SchemaValidator};
use serde_json::{Map, Value};
use std::sync::Arc;

/// PATCH behaviour switches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchConfig {
    /// Rewrite `remove` operations that carry a value list into filtered removes
    pub remove_with_value: bool,
    /// Wrap bare scalars sent for complex attributes as `{"value": ...}`
    pub complex_simple_value: bool,
    /// Unwrap `{"value": "<json object>"}` payloads
    pub stringified_value: bool,
    /// A `replace` through a value filter that matches nothing creates the
    /// entry when the filter is a pure equality conjunction. Off by default:
    /// such a replace fails with `noTarget`.
    pub implicit_add_on_replace: bool,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            remove_with_value: true,
            complex_simple_value: true,
            stringified_value: true,
            implicit_add_on_replace: false,
        }
    }
}

/// Applies PATCH operations to documents.
#[derive(Debug)]
pub struct PatchEngine {
    config: PatchConfig,
    workarounds: WorkaroundChain,
}

impl Default for PatchEngine {
    fn default() -> Self {
        Self::new(PatchConfig::default())
    }
}

impl PatchEngine {
    pub fn new(config: PatchConfig) -> Self {
        let mut workarounds = WorkaroundChain::new();
        if config.stringified_value {
            workarounds.push(Workaround::stringified_value());
        }
        if config.complex_simple_value {
            workarounds.push(Workaround::complex_simple_value());
        }
        if config.remove_with_value {
            workarounds.push(Workaround::remove_with_value());
        }
        Self {
            config,
            workarounds,
        }
    }

    /// Append a custom workaround after the built-in ones.
    pub fn with_workaround(mut self, workaround: Workaround) -> Self {
        self.workarounds.push(workaround);
        self
    }

    pub fn config(&self) -> &PatchConfig {
        &self.config
    }

    /// Apply `operations` to `document` and return the patched copy.
    pub fn apply(
        &self,
        resource_type: &ResourceType,
        document: &Document,
        operations: &[PatchOperation],
    ) -> ScimResult<Document> {
        let mut working = document.clone();
        for operation in operations {
            for op in self.workarounds.apply(operation.clone(), resource_type) {
                log::trace!(
                    "Applying PATCH {} at '{}'",
                    op.op,
                    op.path.as_deref().unwrap_or("")
                );
                self.apply_operation(resource_type, &mut working, &op)?;
            }
        }
        let patched = SchemaValidator::new(resource_type, OperationContext::Patch)
            .validate(&working.to_json())?;
        Ok(patched)
    }

    fn apply_operation(
        &self,
        resource_type: &ResourceType,
        document: &mut Document,
        op: &PatchOperation,
    ) -> ScimResult<()> {
        let Some(path) = op.path.as_deref() else {
            return self.apply_without_path(resource_type, document, op);
        };
        match PatchPath::parse(path, resource_type)? {
            PatchPath::ExtensionRoot(schema) => {
                if op.op != PatchOp::Add {
                    document.remove_extension(&schema.id);
                }
                match (op.op, op.value.as_ref()) {
                    (PatchOp::Remove, _) => Ok(()),
                    (_, Some(value)) => {
                        self.merge_extension(resource_type, document, op.op, &schema, value)
                    }
                    (_, None) => Err(missing_value(op.op)),
                }
            }
            PatchPath::Attribute(expression) => self.apply_to_target(
                resource_type,
                document,
                op.op,
                path,
                Target::new(&expression),
                op.value.as_ref(),
            ),
        }
    }

    /// `add`/`replace` without a path: every member of the value object is
    /// applied as if it had been named by a path.
    fn apply_without_path(
        &self,
        resource_type: &ResourceType,
        document: &mut Document,
        op: &PatchOperation,
    ) -> ScimResult<()> {
        if op.op == PatchOp::Remove {
            return Err(ScimError::no_target(""));
        }
        let object = op.value.as_ref().and_then(Value::as_object).ok_or_else(|| {
            ScimError::invalid_value("PATCH operation without a path requires an object value")
        })?;

        for (key, value) in object {
            if key.eq_ignore_ascii_case("schemas") {
                continue;
            }
            if let Some(extension) = resource_type.extension(key) {
                let schema = Arc::clone(&extension.schema);
                self.merge_extension(resource_type, document, op.op, &schema, value)?;
                continue;
            }
            self.apply_keyed(resource_type, document, op.op, key, value)?;
        }
        Ok(())
    }

    fn merge_extension(
        &self,
        resource_type: &ResourceType,
        document: &mut Document,
        op: PatchOp,
        schema: &Arc<Schema>,
        value: &Value,
    ) -> ScimResult<()> {
        let object = value.as_object().ok_or_else(|| {
            ScimError::invalid_value(format!(
                "Value for extension '{}' must be an object",
                schema.id
            ))
        })?;
        for (key, inner) in object {
            let path = format!("{}:{}", schema.id, key);
            self.apply_keyed(resource_type, document, op, &path, inner)?;
        }
        Ok(())
    }

    fn apply_keyed(
        &self,
        resource_type: &ResourceType,
        document: &mut Document,
        op: PatchOp,
        key: &str,
        value: &Value,
    ) -> ScimResult<()> {
        match PatchPath::parse(key, resource_type) {
            Ok(PatchPath::Attribute(expression)) => self.apply_to_target(
                resource_type,
                document,
                op,
                key,
                Target::new(&expression),
                Some(value),
            ),
            Ok(PatchPath::ExtensionRoot(schema)) => {
                self.merge_extension(resource_type, document, op, &schema, value)
            }
            Err(_) => {
                log::debug!("Ignoring unknown attribute '{}' in PATCH value", key);
                Ok(())
            }
        }
    }

    fn apply_to_target(
        &self,
        resource_type: &ResourceType,
        document: &mut Document,
        op: PatchOp,
        path: &str,
        target: Target<'_>,
        value: Option<&Value>,
    ) -> ScimResult<()> {
        let leaf = target.leaf();
        if target.attribute.is_read_only() || leaf.is_read_only() {
            return Err(ScimError::mutability(
                leaf.scim_name(),
                "attribute is readOnly",
            ));
        }
        let removes_entries = target.filter.is_some() && target.sub_attribute.is_none();
        if op == PatchOp::Remove && leaf.required && !removes_entries {
            return Err(ScimError::mutability(
                leaf.scim_name(),
                "required attribute cannot be removed",
            ));
        }

        let value = match op {
            PatchOp::Remove => None,
            _ => Some(value.ok_or_else(|| missing_value(op))?),
        };

        let container = document.container_mut(resource_type, target.attribute);
        match (target.filter, target.sub_attribute) {
            (None, None) => write_attribute(container, op, target.attribute, value),
            (None, Some(sub)) => write_sub_attribute(container, op, target.attribute, sub, value, path),
            (Some(filter), sub) => {
                self.write_filtered(container, op, target.attribute, filter, sub, value, path)
            }
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn write_filtered(
        &self,
        container: &mut AttributeMap,
        op: PatchOp,
        attribute: &Arc<SchemaAttribute>,
        filter: &FilterNode,
        sub: Option<&Arc<SchemaAttribute>>,
        value: Option<&Value>,
        path: &str,
    ) -> ScimResult<()> {
        let name = attribute.name.as_str();
        let matched: Vec<usize> = match container.get(name) {
            Some(AttributeNode::MultiComplex { values, .. }) => values
                .iter()
                .enumerate()
                .filter(|(_, entry)| filter.matches_entry(entry))
                .map(|(index, _)| index)
                .collect(),
            Some(AttributeNode::Complex { value, .. }) if filter.matches_entry(value) => vec![0],
            _ => Vec::new(),
        };

        if matched.is_empty() {
            let implicit = match op {
                PatchOp::Remove => false,
                PatchOp::Add => true,
                PatchOp::Replace => self.config.implicit_add_on_replace,
            };
            let terms = filter
                .equality_terms()
                .filter(|_| implicit && attribute.multi_valued);
            return match terms {
                Some(terms) => add_implicit_entry(container, attribute, &terms, sub, value),
                None => Err(ScimError::no_target(path)),
            };
        }

        match (op, sub) {
            (PatchOp::Remove, None) => {
                let emptied = match container.get_mut(name) {
                    Some(AttributeNode::MultiComplex { values, .. }) => {
                        let mut index = 0;
                        values.retain(|_| {
                            let keep = !matched.contains(&index);
                            index += 1;
                            keep
                        });
                        values.is_empty()
                    }
                    _ => true,
                };
                if emptied {
                    container.remove(name);
                }
                Ok(())
            }
            (_, None) => {
                let incoming = match value {
                    Some(value) => client_entry(attribute, value)?,
                    None => return Err(missing_value(op)),
                };
                let entries = entries_mut(container, name).ok_or_else(|| ScimError::no_target(path))?;
                for &index in &matched {
                    if op == PatchOp::Replace {
                        check_immutable_entry(attribute, &entries[index], &incoming)?;
                        entries[index] = incoming.clone();
                    } else {
                        merge_entry(attribute, &mut entries[index], &incoming)?;
                    }
                }
                clear_other_primaries(attribute, entries, &matched);
                Ok(())
            }
            (_, Some(sub)) => {
                let node = match value {
                    Some(value) => client_node(sub, value)?,
                    None => None,
                };
                let entries = entries_mut(container, name).ok_or_else(|| ScimError::no_target(path))?;
                write_in_entries(attribute, entries, &matched, sub, node)
            }
        }
    }
}

fn missing_value(op: PatchOp) -> ScimError {
    ScimError::invalid_syntax(format!("PATCH '{}' operation requires a value", op))
}

fn immutable_error(attribute: &SchemaAttribute) -> ScimError {
    ScimError::mutability(
        attribute.scim_name(),
        "immutable attribute already has a value",
    )
}

/// Whole-attribute write: `userName`, `emails`, `name`.
fn write_attribute(
    container: &mut AttributeMap,
    op: PatchOp,
    attribute: &Arc<SchemaAttribute>,
    value: Option<&Value>,
) -> ScimResult<()> {
    let name = attribute.name.as_str();
    if attribute.mutability == Mutability::Immutable
        && container.get(name).is_some_and(|node| !node.is_empty())
    {
        return Err(immutable_error(attribute));
    }

    let Some(value) = value else {
        container.remove(name);
        return Ok(());
    };

    if attribute.multi_valued {
        let items = match value {
            Value::Array(_) => value.clone(),
            other => Value::Array(vec![other.clone()]),
        };
        match (op, client_node(attribute, &items)?) {
            (PatchOp::Replace, None) => {
                container.remove(name);
            }
            (PatchOp::Replace, Some(node)) => container.insert(name, node),
            (_, None) => {}
            (_, Some(node)) => {
                let added = append(container, name, node);
                if let Some(AttributeNode::MultiComplex { values, .. }) = container.get_mut(name) {
                    clear_other_primaries(attribute, values, &added);
                }
            }
        }
        return Ok(());
    }

    match client_node(attribute, value)? {
        None if op == PatchOp::Replace => {
            container.remove(name);
        }
        None => {}
        Some(AttributeNode::Complex {
            attribute: declared,
            value: incoming,
        }) => match container.get_mut(name) {
            // sub-attributes not named in the value are left unchanged
            Some(AttributeNode::Complex { value: current, .. }) => {
                merge_entry(attribute, current, &incoming)?;
            }
            _ => container.insert(
                name,
                AttributeNode::Complex {
                    attribute: declared,
                    value: incoming,
                },
            ),
        },
        Some(node) => container.insert(name, node),
    }
    Ok(())
}

/// `name.givenName`, or `emails.type` applied to every entry.
fn write_sub_attribute(
    container: &mut AttributeMap,
    op: PatchOp,
    attribute: &Arc<SchemaAttribute>,
    sub: &Arc<SchemaAttribute>,
    value: Option<&Value>,
    path: &str,
) -> ScimResult<()> {
    let node = match value {
        Some(value) => client_node(sub, value)?,
        None => None,
    };
    let name = attribute.name.as_str();

    if attribute.multi_valued {
        let Some(AttributeNode::MultiComplex { values, .. }) = container.get_mut(name) else {
            return match op {
                PatchOp::Remove => Ok(()),
                _ => Err(ScimError::no_target(path)),
            };
        };
        let all: Vec<usize> = (0..values.len()).collect();
        return write_in_entries(attribute, values, &all, sub, node);
    }

    match container.get_mut(name) {
        Some(AttributeNode::Complex { value: entry, .. }) => {
            write_in_entries(attribute, std::slice::from_mut(entry), &[0], sub, node)
        }
        _ => {
            if let Some(node) = node {
                let mut entry = AttributeMap::new();
                entry.insert(sub.name.clone(), node);
                container.insert(
                    name,
                    AttributeNode::Complex {
                        attribute: Arc::clone(attribute),
                        value: entry,
                    },
                );
            }
            Ok(())
        }
    }
}

/// Set (or, with `node == None`, remove) `sub` in the selected entries.
fn write_in_entries(
    attribute: &SchemaAttribute,
    entries: &mut [AttributeMap],
    indices: &[usize],
    sub: &SchemaAttribute,
    node: Option<AttributeNode>,
) -> ScimResult<()> {
    for &index in indices {
        let Some(entry) = entries.get_mut(index) else {
            continue;
        };
        if sub.mutability == Mutability::Immutable && entry.get(&sub.name).is_some() {
            return Err(immutable_error(sub));
        }
        match &node {
            Some(node) => entry.insert(sub.name.clone(), node.clone()),
            None => {
                entry.remove(&sub.name);
            }
        }
    }
    clear_other_primaries(attribute, entries, indices);
    Ok(())
}

/// A new entry built from the filter's equality terms plus the value, e.g.
/// `emails[type eq "work"].value` = `"x"` adds `{"type": "work", "value": "x"}`.
fn add_implicit_entry(
    container: &mut AttributeMap,
    attribute: &Arc<SchemaAttribute>,
    terms: &[(&Arc<SchemaAttribute>, &crate::filter::CompareValue)],
    sub: Option<&Arc<SchemaAttribute>>,
    value: Option<&Value>,
) -> ScimResult<()> {
    let mut object = Map::new();
    for (term, literal) in terms {
        object.insert(term.name.clone(), literal.to_json());
    }
    match (sub, value.map(single_item)) {
        (Some(sub), Some(value)) => {
            object.insert(sub.name.clone(), value.clone());
        }
        (None, Some(Value::Object(fields))) => {
            for (key, field) in fields {
                object.insert(key.clone(), field.clone());
            }
        }
        _ => {}
    }

    let entry = client_entry(attribute, &Value::Object(object))?;
    let added = append(
        container,
        &attribute.name,
        AttributeNode::MultiComplex {
            attribute: Arc::clone(attribute),
            values: vec![entry],
        },
    );
    if let Some(AttributeNode::MultiComplex { values, .. }) = container.get_mut(&attribute.name) {
        clear_other_primaries(attribute, values, &added);
    }
    Ok(())
}

/// Validate a client-supplied value for `attribute`, dropping readOnly
/// sub-attributes the client may have echoed back.
fn client_node(attribute: &Arc<SchemaAttribute>, value: &Value) -> ScimResult<Option<AttributeNode>> {
    let cleaned = strip_read_only(attribute, value);
    Ok(validate_attribute_value(
        attribute,
        &cleaned,
        OperationContext::Patch,
    )?)
}

/// Validate one complex entry for `attribute`.
fn client_entry(attribute: &Arc<SchemaAttribute>, value: &Value) -> ScimResult<AttributeMap> {
    let object = single_item(value);
    let wrapped = if attribute.multi_valued {
        Value::Array(vec![object.clone()])
    } else {
        object.clone()
    };
    match client_node(attribute, &wrapped)? {
        Some(AttributeNode::MultiComplex { mut values, .. }) if values.len() == 1 => {
            Ok(values.remove(0))
        }
        Some(AttributeNode::Complex { value, .. }) => Ok(value),
        _ => Err(ScimError::invalid_value(format!(
            "Value for '{}' must be a non-empty object",
            attribute.scim_name()
        ))),
    }
}

fn single_item(value: &Value) -> &Value {
    match value {
        Value::Array(items) if items.len() == 1 => &items[0],
        other => other,
    }
}

fn strip_read_only(attribute: &SchemaAttribute, value: &Value) -> Value {
    if !attribute.is_complex() {
        return value.clone();
    }
    match value {
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| strip_read_only(attribute, item))
                .collect(),
        ),
        Value::Object(object) => Value::Object(
            object
                .iter()
                .filter(|(key, _)| {
                    !attribute
                        .sub_attribute(key)
                        .is_some_and(|sub| sub.is_read_only())
                })
                .map(|(key, v)| (key.clone(), v.clone()))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn entries_mut<'m>(container: &'m mut AttributeMap, name: &str) -> Option<&'m mut [AttributeMap]> {
    match container.get_mut(name)? {
        AttributeNode::MultiComplex { values, .. } => Some(values.as_mut_slice()),
        AttributeNode::Complex { value, .. } => Some(std::slice::from_mut(value)),
        _ => None,
    }
}

/// Append the values of `node` to the attribute, skipping duplicates.
/// Returns the indices of newly added complex entries.
fn append(container: &mut AttributeMap, name: &str, node: AttributeNode) -> Vec<usize> {
    if container.get(name).is_none() {
        let added = match &node {
            AttributeNode::MultiComplex { values, .. } => (0..values.len()).collect(),
            _ => Vec::new(),
        };
        container.insert(name, node);
        return added;
    }
    let Some(existing) = container.get_mut(name) else {
        return Vec::new();
    };

    match (existing, node) {
        (
            AttributeNode::MultiComplex { values, .. },
            AttributeNode::MultiComplex {
                values: incoming, ..
            },
        ) => {
            let mut added = Vec::new();
            for entry in incoming {
                if !values.contains(&entry) {
                    added.push(values.len());
                    values.push(entry);
                }
            }
            added
        }
        (
            AttributeNode::MultiSimple { attribute, values },
            AttributeNode::MultiSimple {
                values: incoming, ..
            },
        ) => {
            for value in incoming {
                if !values.iter().any(|v| v.equals(&value, attribute.case_exact)) {
                    values.push(value);
                }
            }
            Vec::new()
        }
        (existing, node) => {
            *existing = node;
            Vec::new()
        }
    }
}

/// Merge the sub-attributes of `incoming` into `current`.
fn merge_entry(
    attribute: &SchemaAttribute,
    current: &mut AttributeMap,
    incoming: &AttributeMap,
) -> ScimResult<()> {
    for (key, node) in incoming.iter() {
        if let (Some(sub), Some(existing)) = (attribute.sub_attribute(key), current.get(key)) {
            if sub.mutability == Mutability::Immutable && existing != node {
                return Err(immutable_error(sub));
            }
        }
        current.insert(key, node.clone());
    }
    Ok(())
}

fn check_immutable_entry(
    attribute: &SchemaAttribute,
    current: &AttributeMap,
    incoming: &AttributeMap,
) -> ScimResult<()> {
    for sub in &attribute.sub_attributes {
        if sub.mutability != Mutability::Immutable {
            continue;
        }
        if let Some(existing) = current.get(&sub.name) {
            if incoming.get(&sub.name) != Some(existing) {
                return Err(immutable_error(sub));
            }
        }
    }
    Ok(())
}

/// When one of `changed` became primary, no other entry may stay primary.
fn clear_other_primaries(attribute: &SchemaAttribute, entries: &mut [AttributeMap], changed: &[usize]) {
    if !attribute.has_primary() {
        return;
    }
    let promoted = changed.iter().any(|&index| {
        entries
            .get(index)
            .and_then(|entry| entry.scalar("primary"))
            .and_then(ScalarValue::as_bool)
            == Some(true)
    });
    if !promoted {
        return;
    }
    for (index, entry) in entries.iter_mut().enumerate() {
        if changed.contains(&index) {
            continue;
        }
        if let Some(AttributeNode::Simple { value, .. }) = entry.get_mut("primary") {
            *value = ScalarValue::Boolean(false);
        }
    }
}
