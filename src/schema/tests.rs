//! Validator tests against the embedded User and Group resource types.

use super::*;
use crate::error::ValidationError;
use crate::resource::{AttributeNode, ScalarValue};
use serde_json::json;
use std::sync::Arc;

fn registry() -> SchemaRegistry {
    SchemaRegistry::with_embedded_schemas().expect("embedded schemas load")
}

fn users() -> Arc<ResourceType> {
    Arc::clone(registry().get_resource_type("User").unwrap())
}

const USER: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
const ENTERPRISE: &str = "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

#[test]
fn test_valid_user_creates_typed_document() {
    let rt = users();
    let document = rt
        .validate(
            &json!({
                "schemas": [USER],
                "userName": "bjensen",
                "active": true,
                "name": {"givenName": "Barbara", "familyName": "Jensen"},
                "emails": [{"value": "bjensen@example.com", "type": "work", "primary": true}]
            }),
            OperationContext::Create,
        )
        .unwrap();

    let given = rt.find_attribute("name.givenName").unwrap();
    assert_eq!(document.values_of(&given)[0].as_str(), Some("Barbara"));

    let active = rt.find_attribute("active").unwrap();
    assert!(matches!(
        document.get(&active),
        Some(AttributeNode::Simple { value: ScalarValue::Boolean(true), .. })
    ));
    assert_eq!(document.schemas(), &[USER.to_string()]);
}

#[test]
fn test_attribute_names_normalized() {
    let rt = users();
    let document = rt
        .validate(
            &json!({"schemas": [USER], "USERNAME": "bjensen", "Name": {"GIVENNAME": "Barbara"}}),
            OperationContext::Create,
        )
        .unwrap();
    let json = document.to_json();
    assert_eq!(json["userName"], "bjensen");
    assert_eq!(json["name"]["givenName"], "Barbara");
}

#[test]
fn test_all_errors_collected() {
    let rt = users();
    let errors = rt
        .validate(
            &json!({
                "schemas": [USER],
                "active": "yes",
                "emails": {"value": "not-an-array@example.com"}
            }),
            OperationContext::Create,
        )
        .unwrap_err();

    assert_eq!(errors.len(), 3);
    assert!(errors.iter().any(|e| matches!(e, ValidationError::MissingRequiredAttribute { attribute } if attribute == "userName")));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidDataType { attribute, .. } if attribute == "active")));
    assert!(errors.iter().any(|e| matches!(e, ValidationError::ExpectedMultiValue { .. })));
}

#[test]
fn test_read_only_dropped_on_create() {
    let rt = users();
    let document = rt
        .validate(
            &json!({
                "schemas": [USER],
                "id": "client-chosen",
                "userName": "bjensen",
                "meta": {"resourceType": "User"},
                "groups": [{"value": "g1"}]
            }),
            OperationContext::Create,
        )
        .unwrap();
    assert!(document.id().is_none());
    let json = document.to_json();
    assert!(json.get("meta").is_none());
    assert!(json.get("groups").is_none());
}

#[test]
fn test_unknown_attributes_dropped_unless_strict() {
    let rt = users();
    let raw = json!({"schemas": [USER], "userName": "bjensen", "favoriteColor": "green"});

    let document = rt.validate(&raw, OperationContext::Create).unwrap();
    assert!(document.to_json().get("favoriteColor").is_none());

    let errors = SchemaValidator::new(&rt, OperationContext::Create)
        .strict(true)
        .validate(&raw)
        .unwrap_err();
    assert!(matches!(errors.errors[0], ValidationError::UnknownAttribute { .. }));
}

#[test]
fn test_canonical_values_enforced() {
    let rt = users();
    let errors = rt
        .validate(
            &json!({"schemas": [USER], "userName": "x", "emails": [{"value": "a@b.c", "type": "pigeon"}]}),
            OperationContext::Create,
        )
        .unwrap_err();
    assert!(matches!(errors.errors[0], ValidationError::InvalidCanonicalValue { .. }));

    // canonical comparison follows caseExact=false
    assert!(rt
        .validate(
            &json!({"schemas": [USER], "userName": "x", "emails": [{"value": "a@b.c", "type": "WORK"}]}),
            OperationContext::Create,
        )
        .is_ok());
}

#[test]
fn test_multiple_primary_rejected() {
    let rt = users();
    let errors = rt
        .validate(
            &json!({
                "schemas": [USER],
                "userName": "x",
                "emails": [
                    {"value": "a@example.com", "primary": true},
                    {"value": "b@example.com", "primary": true}
                ]
            }),
            OperationContext::Create,
        )
        .unwrap_err();
    assert!(matches!(errors.errors[0], ValidationError::MultiplePrimaryValues { .. }));
}

#[test]
fn test_extension_attributes() {
    let rt = users();
    let document = rt
        .validate(
            &json!({
                "schemas": [USER, ENTERPRISE],
                "userName": "bjensen",
                "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User": {"employeeNumber": "701984", "manager": {"value": "26118915"}}
            }),
            OperationContext::Create,
        )
        .unwrap();
    assert_eq!(document.schemas().len(), 2);
    let number = rt.find_attribute("employeeNumber").unwrap();
    assert_eq!(document.values_of(&number)[0].as_str(), Some("701984"));
}

#[test]
fn test_unknown_schema_uri_rejected() {
    let rt = users();
    let errors = rt
        .validate(
            &json!({"schemas": [USER, "urn:example:unknown"], "userName": "bjensen"}),
            OperationContext::Create,
        )
        .unwrap_err();
    assert!(matches!(errors.errors[0], ValidationError::UnknownSchemaUri { .. }));
}

#[test]
fn test_missing_schemas_rejected() {
    let rt = users();
    let errors = rt
        .validate(&json!({"userName": "bjensen"}), OperationContext::Create)
        .unwrap_err();
    assert_eq!(errors.errors[0], ValidationError::MissingSchemas);
}

#[test]
fn test_required_extension_missing() {
    let mut registry = SchemaRegistry::new();
    let rt = registry
        .register_resource_type(
            &json!({
                "name": "Device", "endpoint": "/Devices", "schema": "urn:example:Device",
                "schemaExtensions": [{"schema": "urn:example:DeviceOwner", "required": true}]
            }),
            &json!({"id": "urn:example:Device", "name": "Device",
                    "attributes": [{"name": "serial", "type": "string"}]}),
            &[json!({"id": "urn:example:DeviceOwner", "name": "DeviceOwner",
                     "attributes": [{"name": "owner", "type": "string"}]})],
        )
        .unwrap();

    let errors = rt
        .validate(
            &json!({"schemas": ["urn:example:Device"], "serial": "A1"}),
            OperationContext::Create,
        )
        .unwrap_err();
    assert_eq!(errors.scim_type(), crate::error::ScimType::MissingExtension);
}

#[test]
fn test_datetime_and_decimal_parsing() {
    let mut registry = SchemaRegistry::new();
    let rt = registry
        .register_resource_type(
            &json!({"name": "Reading", "endpoint": "/Readings", "schema": "urn:example:Reading"}),
            &json!({"id": "urn:example:Reading", "name": "Reading", "attributes": [
                {"name": "takenAt", "type": "dateTime"},
                {"name": "level", "type": "decimal"},
                {"name": "count", "type": "integer"},
                {"name": "blob", "type": "binary"}
            ]}),
            &[],
        )
        .unwrap();

    let ok = rt.validate(
        &json!({"schemas": ["urn:example:Reading"], "takenAt": "2024-03-01T10:00:00+01:00",
                "level": 0.25, "count": 3, "blob": "aGVsbG8="}),
        OperationContext::Create,
    );
    assert!(ok.is_ok());

    let errors = rt
        .validate(
            &json!({"schemas": ["urn:example:Reading"], "takenAt": "yesterday",
                    "count": 1.5, "blob": "***"}),
            OperationContext::Create,
        )
        .unwrap_err();
    assert_eq!(errors.len(), 3);
}

#[test]
fn test_response_context_hides_never_returned() {
    let rt = users();
    let document = rt
        .validate(
            &json!({"schemas": [USER], "id": "1", "userName": "bjensen", "password": "secret"}),
            OperationContext::Response,
        )
        .unwrap();
    assert!(document.to_json().get("password").is_none());
    assert_eq!(document.id(), Some("1"));
}

#[test]
fn test_replace_keeps_read_only_and_checks_immutable() {
    let mut registry = SchemaRegistry::new();
    let rt = registry
        .register_resource_type(
            &json!({"name": "Badge", "endpoint": "/Badges", "schema": "urn:example:Badge"}),
            &json!({"id": "urn:example:Badge", "name": "Badge", "attributes": [
                {"name": "serial", "type": "string", "mutability": "immutable"},
                {"name": "holder", "type": "string"}
            ]}),
            &[],
        )
        .unwrap();

    let existing = rt
        .validate(
            &json!({"schemas": ["urn:example:Badge"], "id": "b1", "serial": "S-1", "holder": "ann"}),
            OperationContext::Response,
        )
        .unwrap();

    let replaced = SchemaValidator::new(&rt, OperationContext::Replace)
        .with_existing(&existing)
        .validate(&json!({"schemas": ["urn:example:Badge"], "serial": "S-1", "holder": "bob"}))
        .unwrap();
    assert_eq!(replaced.id(), Some("b1"));

    let errors = SchemaValidator::new(&rt, OperationContext::Replace)
        .with_existing(&existing)
        .validate(&json!({"schemas": ["urn:example:Badge"], "serial": "S-2"}))
        .unwrap_err();
    assert!(matches!(
        errors.errors[0],
        ValidationError::ImmutableMutabilityViolation { .. }
    ));
}

#[test]
fn test_schema_conflict_detected() {
    let mut registry = SchemaRegistry::new();
    registry
        .register_schema(&json!({"id": "urn:example:A", "name": "A", "attributes": []}))
        .unwrap();
    assert!(registry
        .register_schema(&json!({"id": "urn:example:A", "name": "A", "attributes": []}))
        .is_ok());
    assert!(matches!(
        registry.register_schema(&json!({"id": "urn:example:A", "name": "B", "attributes": []})),
        Err(crate::error::BuildError::SchemaConflict { .. })
    ));
}

#[test]
fn test_duplicate_endpoint_rejected() {
    let mut registry = registry();
    let result = registry.register_resource_type(
        &json!({"name": "People", "endpoint": "/Users", "schema": "urn:example:People"}),
        &json!({"id": "urn:example:People", "name": "People", "attributes": []}),
        &[],
    );
    assert!(result.is_err());
}
