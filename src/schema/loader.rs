//! Parsing of RFC 7643 schema documents into attribute metadata.
//!
//! Parsing fails closed: an attribute with an unknown `type` or a missing
//! `name` makes the whole schema unusable, while unknown `mutability`,
//! `returned` and `uniqueness` values fall back to their RFC defaults.

use super::types::{AttributeType, Mutability, Returned, Schema, SchemaAttribute, Uniqueness};
use crate::error::{BuildError, BuildResult};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Parse a schema document.
pub fn parse_schema(document: &Value) -> BuildResult<Schema> {
    let object = document
        .as_object()
        .ok_or_else(|| BuildError::invalid_schema("<unknown>", "schema must be a JSON object"))?;

    let id = object
        .get("id")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| BuildError::invalid_schema("<unknown>", "missing 'id'"))?
        .to_string();

    let name = string_field(object, "name").unwrap_or_default();
    let description = string_field(object, "description").unwrap_or_default();

    let attributes = match object.get("attributes") {
        Some(Value::Array(items)) => parse_attribute_list(items, &id, None)?,
        Some(_) => return Err(BuildError::invalid_schema(&id, "'attributes' must be an array")),
        None => Vec::new(),
    };

    log::debug!(
        "Parsed schema '{}' with {} top-level attributes",
        id,
        attributes.len()
    );

    Ok(Schema {
        id,
        name,
        description,
        attributes,
        definition: document.clone(),
    })
}

/// Parse a JSON array of attribute definitions declared by `schema_uri`.
pub fn parse_attribute_list(
    items: &[Value],
    schema_uri: &str,
    parent: Option<&str>,
) -> BuildResult<Vec<Arc<SchemaAttribute>>> {
    let mut attributes: Vec<Arc<SchemaAttribute>> = Vec::with_capacity(items.len());
    for item in items {
        let attribute = parse_attribute(item, schema_uri, parent)?;
        if attributes
            .iter()
            .any(|existing| existing.name.eq_ignore_ascii_case(&attribute.name))
        {
            return Err(BuildError::invalid_schema(
                schema_uri,
                format!("duplicate attribute '{}'", attribute.scim_name()),
            ));
        }
        attributes.push(Arc::new(attribute));
    }
    Ok(attributes)
}

fn parse_attribute(
    value: &Value,
    schema_uri: &str,
    parent: Option<&str>,
) -> BuildResult<SchemaAttribute> {
    let object = value
        .as_object()
        .ok_or_else(|| BuildError::invalid_schema(schema_uri, "attribute must be a JSON object"))?;

    let name = string_field(object, "name")
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| BuildError::invalid_schema(schema_uri, "attribute without 'name'"))?;

    let qualified = match parent {
        Some(parent) => format!("{}.{}", parent, name),
        None => name.clone(),
    };

    let data_type = match object.get("type") {
        None => AttributeType::String,
        Some(Value::String(raw)) => AttributeType::parse(raw).ok_or_else(|| {
            BuildError::invalid_schema(
                schema_uri,
                format!("attribute '{}' has unknown type '{}'", qualified, raw),
            )
        })?,
        Some(_) => {
            return Err(BuildError::invalid_schema(
                schema_uri,
                format!("attribute '{}' has a non-string type", qualified),
            ));
        }
    };

    let sub_attributes = match (object.get("subAttributes"), data_type) {
        (Some(Value::Array(items)), AttributeType::Complex) => {
            if parent.is_some() {
                return Err(BuildError::invalid_schema(
                    schema_uri,
                    format!("sub-attribute '{}' cannot be complex", qualified),
                ));
            }
            parse_attribute_list(items, schema_uri, Some(&name))?
        }
        (Some(Value::Array(items)), _) if !items.is_empty() => {
            return Err(BuildError::invalid_schema(
                schema_uri,
                format!("attribute '{}' declares sub-attributes but is not complex", qualified),
            ));
        }
        (Some(Value::Array(_)) | None, _) => Vec::new(),
        (Some(_), _) => {
            return Err(BuildError::invalid_schema(
                schema_uri,
                format!("attribute '{}' has malformed 'subAttributes'", qualified),
            ));
        }
    };

    Ok(SchemaAttribute {
        name,
        schema_uri: schema_uri.to_string(),
        parent_name: parent.map(str::to_string),
        data_type,
        multi_valued: bool_field(object, "multiValued"),
        description: string_field(object, "description").unwrap_or_default(),
        required: bool_field(object, "required"),
        case_exact: bool_field(object, "caseExact"),
        mutability: string_field(object, "mutability")
            .map(|m| Mutability::parse(&m))
            .unwrap_or_default(),
        returned: string_field(object, "returned")
            .map(|r| Returned::parse(&r))
            .unwrap_or_default(),
        uniqueness: string_field(object, "uniqueness")
            .map(|u| Uniqueness::parse(&u))
            .unwrap_or_default(),
        canonical_values: string_list(object, "canonicalValues"),
        reference_types: string_list(object, "referenceTypes"),
        sub_attributes,
    })
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(object: &Map<String, Value>, key: &str) -> bool {
    object.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    object
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
