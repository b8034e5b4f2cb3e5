//! Schema validation for SCIM resources.
//!
//! Validation turns raw JSON into a typed [`Document`] and collects every
//! offending attribute instead of stopping at the first one. What happens to
//! an attribute depends on the [`OperationContext`]:
//!
//! | context    | readOnly values          | returned=never values | required check |
//! |------------|--------------------------|-----------------------|----------------|
//! | `Create`   | dropped                  | kept                  | yes            |
//! | `Replace`  | existing value carried   | kept                  | yes            |
//! | `Patch`    | kept                     | kept                  | yes            |
//! | `Response` | kept                     | dropped               | yes            |
//!
//! Required attributes that are also readOnly are never reported missing;
//! the service provider assigns them.

use super::resource_type::ResourceType;
use super::types::{AttributeType, Mutability, Returned, SchemaAttribute};
use crate::error::{ValidationError, ValidationErrors, ValidationResult};
use crate::resource::document::{AttributeMap, AttributeNode, Document};
use crate::resource::value::{ScalarValue, decimal_from_number, parse_datetime};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde_json::{Map, Value};
use std::sync::Arc;

/// The operation a document is validated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationContext {
    /// POST body
    Create,
    /// PUT body
    Replace,
    /// Result of applying PATCH operations to a stored resource
    Patch,
    /// Resource returned by a handler, before it is sent to the client
    Response,
}

impl OperationContext {
    fn is_client_request(&self) -> bool {
        matches!(self, Self::Create | Self::Replace)
    }
}

/// Validates raw JSON against a resource type.
#[derive(Debug, Clone)]
pub struct SchemaValidator<'a> {
    resource_type: &'a ResourceType,
    context: OperationContext,
    strict: bool,
    existing: Option<&'a Document>,
}

impl<'a> SchemaValidator<'a> {
    pub fn new(resource_type: &'a ResourceType, context: OperationContext) -> Self {
        Self {
            resource_type,
            context,
            strict: false,
            existing: None,
        }
    }

    /// Reject unknown attributes instead of dropping them.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Stored resource a replacement is compared against, for immutability
    /// checks and to carry readOnly values over.
    pub fn with_existing(mut self, existing: &'a Document) -> Self {
        self.existing = Some(existing);
        self
    }

    pub fn validate(&self, raw: &Value) -> ValidationResult<Document> {
        let object = raw
            .as_object()
            .ok_or_else(|| ValidationError::custom("Resource must be a JSON object"))?;

        let rt = self.resource_type;
        let mut walker = Walker::new(self.context, self.strict && self.context.is_client_request());

        self.check_schemas(object, &mut walker.errors);

        let mut attributes = AttributeMap::new();
        for attr in rt.core_attributes() {
            let existing = self.existing.and_then(|doc| doc.get(attr));
            if let Some(node) = walker.attribute(attr, lookup(object, &attr.name), existing) {
                attributes.insert(attr.name.clone(), node);
            }
        }

        let mut schemas = vec![rt.schema.id.clone()];
        for extension in &rt.extensions {
            let uri = &extension.schema.id;
            let existing = self.existing.and_then(|doc| doc.extension(uri));
            let contributed = match lookup(object, uri) {
                Some(Value::Object(ext_object)) => {
                    let value = walker.object(&extension.schema.attributes, ext_object, existing, uri);
                    (!value.is_empty()).then_some(value)
                }
                None | Some(Value::Null) => match (self.context, existing) {
                    (OperationContext::Replace, Some(existing)) => {
                        walker.carry_read_only(&extension.schema.attributes, existing)
                    }
                    _ => None,
                },
                Some(other) => {
                    walker.errors.push(ValidationError::invalid_type(
                        uri.clone(),
                        "object",
                        json_type_name(other),
                    ));
                    None
                }
            };

            match contributed {
                Some(value) => {
                    schemas.push(uri.clone());
                    attributes.insert(
                        uri.clone(),
                        AttributeNode::Extension {
                            schema: Arc::clone(&extension.schema),
                            value,
                        },
                    );
                }
                None if extension.required && self.context != OperationContext::Response => {
                    walker
                        .errors
                        .push(ValidationError::MissingRequiredExtension { uri: uri.clone() });
                }
                None => {}
            }
        }

        for key in object.keys() {
            let known = key.eq_ignore_ascii_case("schemas")
                || rt.core_attribute(key).is_some()
                || rt.is_extension_uri(key);
            if !known {
                walker.unknown(key, &rt.schema.id);
            }
        }

        walker.errors.into_result(Document::new(schemas, attributes))
    }

    fn check_schemas(&self, object: &Map<String, Value>, errors: &mut ValidationErrors) {
        let declared: Vec<&str> = match lookup(object, "schemas") {
            Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
            Some(other) => {
                errors.push(ValidationError::invalid_type(
                    "schemas",
                    "array",
                    json_type_name(other),
                ));
                return;
            }
            None => {
                if self.context.is_client_request() {
                    errors.push(ValidationError::MissingSchemas);
                }
                return;
            }
        };

        let rt = self.resource_type;
        if self.context.is_client_request()
            && !declared.iter().any(|uri| uri.eq_ignore_ascii_case(&rt.schema.id))
        {
            errors.push(ValidationError::MissingBaseSchema {
                uri: rt.schema.id.clone(),
            });
        }
        for uri in declared.into_iter().filter(|uri| !rt.has_schema(uri)) {
            errors.push(ValidationError::UnknownSchemaUri {
                uri: uri.to_string(),
            });
        }
    }
}

/// Validate a complete resource document.
pub fn validate_document(
    resource_type: &ResourceType,
    raw: &Value,
    context: OperationContext,
) -> ValidationResult<Document> {
    SchemaValidator::new(resource_type, context).validate(raw)
}

/// Validate the value of one attribute in isolation.
///
/// Returns `Ok(None)` when the value is null or an empty array.
pub fn validate_attribute_value(
    attribute: &Arc<SchemaAttribute>,
    value: &Value,
    context: OperationContext,
) -> ValidationResult<Option<AttributeNode>> {
    let mut walker = Walker::new(context, false);
    let node = walker.attribute(attribute, Some(value), None);
    walker.errors.into_result(node)
}

/// Validate a single scalar against a simple attribute's type.
pub fn validate_scalar(attribute: &SchemaAttribute, value: &Value) -> ValidationResult<ScalarValue> {
    let mut walker = Walker::new(OperationContext::Patch, false);
    let scalar = walker.scalar(attribute, value);
    match scalar {
        Some(scalar) if walker.errors.is_empty() => Ok(scalar),
        _ => Err(walker.errors),
    }
}

/// Name of a JSON value's type, for error messages.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "decimal",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Case-insensitive key lookup, preferring an exact match.
pub(crate) fn lookup<'v>(object: &'v Map<String, Value>, name: &str) -> Option<&'v Value> {
    object.get(name).or_else(|| {
        object
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value)
    })
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

struct Walker {
    context: OperationContext,
    strict: bool,
    errors: ValidationErrors,
}

impl Walker {
    fn new(context: OperationContext, strict: bool) -> Self {
        Self {
            context,
            strict,
            errors: ValidationErrors::new(),
        }
    }

    fn attribute(
        &mut self,
        attr: &Arc<SchemaAttribute>,
        value: Option<&Value>,
        existing: Option<&AttributeNode>,
    ) -> Option<AttributeNode> {
        let present = value.filter(|v| !is_empty_value(v));

        if attr.is_read_only() && self.context.is_client_request() {
            if present.is_some() {
                log::debug!("Ignoring read-only attribute '{}' in request", attr.scim_name());
            }
            return match self.context {
                OperationContext::Replace => existing.cloned(),
                _ => None,
            };
        }

        if self.context == OperationContext::Response
            && (attr.returned == Returned::Never || attr.mutability == Mutability::WriteOnly)
        {
            return None;
        }

        let Some(value) = present else {
            if attr.mutability == Mutability::Immutable && self.context == OperationContext::Replace
            {
                return existing.cloned();
            }
            if attr.required && !attr.is_read_only() {
                self.errors
                    .push(ValidationError::missing_required(attr.scim_name()));
            }
            return None;
        };

        let node = if attr.multi_valued {
            self.multi_valued(attr, value)
        } else {
            self.single_valued(attr, value)
        }?;

        if attr.mutability == Mutability::Immutable && self.context == OperationContext::Replace {
            if let Some(existing) = existing {
                if existing.to_json() != node.to_json() {
                    self.errors.push(ValidationError::ImmutableMutabilityViolation {
                        attribute: attr.scim_name(),
                    });
                }
            }
        }

        Some(node)
    }

    fn multi_valued(&mut self, attr: &Arc<SchemaAttribute>, value: &Value) -> Option<AttributeNode> {
        let Value::Array(items) = value else {
            self.errors.push(ValidationError::ExpectedMultiValue {
                attribute: attr.scim_name(),
            });
            return None;
        };

        if attr.is_complex() {
            let mut entries = Vec::with_capacity(items.len());
            for item in items.iter().filter(|item| !item.is_null()) {
                if let Some(entry) = self.complex_entry(attr, item) {
                    if !entry.is_empty() {
                        entries.push(entry);
                    }
                }
            }
            if attr.has_primary() && self.context != OperationContext::Response {
                let primaries = entries
                    .iter()
                    .filter(|entry| entry.scalar("primary").and_then(ScalarValue::as_bool) == Some(true))
                    .count();
                if primaries > 1 {
                    self.errors.push(ValidationError::MultiplePrimaryValues {
                        attribute: attr.scim_name(),
                    });
                }
            }
            (!entries.is_empty()).then(|| AttributeNode::MultiComplex {
                attribute: Arc::clone(attr),
                values: entries,
            })
        } else {
            let values: Vec<ScalarValue> = items
                .iter()
                .filter(|item| !item.is_null())
                .filter_map(|item| self.scalar(attr, item))
                .collect();
            (!values.is_empty()).then(|| AttributeNode::MultiSimple {
                attribute: Arc::clone(attr),
                values,
            })
        }
    }

    fn single_valued(&mut self, attr: &Arc<SchemaAttribute>, value: &Value) -> Option<AttributeNode> {
        if value.is_array() {
            self.errors.push(ValidationError::ExpectedSingleValue {
                attribute: attr.scim_name(),
            });
            return None;
        }

        if attr.is_complex() {
            let entry = self.complex_entry(attr, value)?;
            (!entry.is_empty()).then(|| AttributeNode::Complex {
                attribute: Arc::clone(attr),
                value: entry,
            })
        } else {
            self.scalar(attr, value).map(|scalar| AttributeNode::Simple {
                attribute: Arc::clone(attr),
                value: scalar,
            })
        }
    }

    fn complex_entry(&mut self, attr: &Arc<SchemaAttribute>, value: &Value) -> Option<AttributeMap> {
        let Value::Object(object) = value else {
            self.errors.push(ValidationError::invalid_type(
                attr.scim_name(),
                "object",
                json_type_name(value),
            ));
            return None;
        };
        Some(self.object(&attr.sub_attributes, object, None, &attr.full_name()))
    }

    /// Validate the members of a complex value or extension object.
    fn object(
        &mut self,
        attributes: &[Arc<SchemaAttribute>],
        object: &Map<String, Value>,
        existing: Option<&AttributeMap>,
        owner: &str,
    ) -> AttributeMap {
        let mut map = AttributeMap::new();
        for attr in attributes {
            let existing_node = existing.and_then(|m| m.get(&attr.name));
            if let Some(node) = self.attribute(attr, lookup(object, &attr.name), existing_node) {
                map.insert(attr.name.clone(), node);
            }
        }
        for key in object.keys() {
            if !attributes.iter().any(|attr| attr.name.eq_ignore_ascii_case(key)) {
                self.unknown(key, owner);
            }
        }
        map
    }

    fn carry_read_only(
        &mut self,
        attributes: &[Arc<SchemaAttribute>],
        existing: &AttributeMap,
    ) -> Option<AttributeMap> {
        let mut map = AttributeMap::new();
        for attr in attributes {
            if attr.is_read_only() || attr.mutability == Mutability::Immutable {
                if let Some(node) = existing.get(&attr.name) {
                    map.insert(attr.name.clone(), node.clone());
                }
            }
        }
        (!map.is_empty()).then_some(map)
    }

    fn unknown(&mut self, key: &str, owner: &str) {
        if self.strict {
            self.errors.push(ValidationError::UnknownAttribute {
                attribute: key.to_string(),
                schema_id: owner.to_string(),
            });
        } else {
            log::debug!("Dropping unknown attribute '{}' of '{}'", key, owner);
        }
    }

    fn scalar(&mut self, attr: &SchemaAttribute, value: &Value) -> Option<ScalarValue> {
        let name = attr.scim_name();
        let type_error = |expected: &str| {
            ValidationError::invalid_type(name.clone(), expected, json_type_name(value))
        };

        let result = match (attr.data_type, value) {
            (AttributeType::String, Value::String(s)) => {
                if attr.allows_canonical(s) {
                    Ok(ScalarValue::String(s.clone()))
                } else {
                    Err(ValidationError::InvalidCanonicalValue {
                        attribute: name.clone(),
                        value: s.clone(),
                        allowed: attr.canonical_values.clone(),
                    })
                }
            }
            (AttributeType::Boolean, Value::Bool(b)) => Ok(ScalarValue::Boolean(*b)),
            (AttributeType::Integer, Value::Number(n)) => n
                .as_i64()
                .map(ScalarValue::Integer)
                .ok_or_else(|| ValidationError::InvalidIntegerValue {
                    attribute: name.clone(),
                    value: n.to_string(),
                }),
            (AttributeType::Decimal, Value::Number(n)) => decimal_from_number(n)
                .map(ScalarValue::Decimal)
                .ok_or_else(|| type_error("decimal")),
            (AttributeType::DateTime, Value::String(s)) => parse_datetime(s)
                .map(ScalarValue::DateTime)
                .ok_or_else(|| ValidationError::InvalidDateTimeFormat {
                    attribute: name.clone(),
                    value: s.clone(),
                }),
            (AttributeType::Reference, Value::String(s)) => {
                if attr.allows_canonical(s) {
                    Ok(ScalarValue::Reference(s.clone()))
                } else {
                    Err(ValidationError::InvalidCanonicalValue {
                        attribute: name.clone(),
                        value: s.clone(),
                        allowed: attr.canonical_values.clone(),
                    })
                }
            }
            (AttributeType::Binary, Value::String(s)) => match BASE64.decode(s) {
                Ok(_) => Ok(ScalarValue::Binary(s.clone())),
                Err(e) => Err(ValidationError::InvalidBinaryData {
                    attribute: name.clone(),
                    details: e.to_string(),
                }),
            },
            (AttributeType::Any, other) => Ok(ScalarValue::Any(other.clone())),
            (expected, _) => Err(type_error(expected.as_str())),
        };

        match result {
            Ok(scalar) => Some(scalar),
            Err(error) => {
                self.errors.push(error);
                None
            }
        }
    }
}
