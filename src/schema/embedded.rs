//! Embedded RFC 7643 schemas and resource types.
//!
//! Applications that serve the standard `/Users` and `/Groups` endpoints can
//! register these directly, see [`SchemaRegistry::with_embedded_schemas`].
//!
//! [`SchemaRegistry::with_embedded_schemas`]: super::SchemaRegistry::with_embedded_schemas

pub const USER_SCHEMA_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const GROUP_SCHEMA_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const ENTERPRISE_USER_SCHEMA_URI: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

/// Attributes every resource carries regardless of its schema (RFC 7643 §3.1).
///
/// They are attached to each resource type under the primary schema's URI
/// unless the primary schema declares them itself.
pub fn common_attributes() -> &'static str {
    r#"[
  {"name": "id", "type": "string", "multiValued": false, "required": false, "caseExact": true,
   "mutability": "readOnly", "returned": "always", "uniqueness": "server",
   "description": "Unique identifier for the SCIM resource as defined by the service provider."},
  {"name": "externalId", "type": "string", "multiValued": false, "required": false, "caseExact": true,
   "mutability": "readWrite", "returned": "default", "uniqueness": "none",
   "description": "Identifier for the resource as defined by the provisioning client."},
  {"name": "meta", "type": "complex", "multiValued": false, "required": false, "caseExact": false,
   "mutability": "readOnly", "returned": "default", "uniqueness": "none",
   "description": "Resource metadata.",
   "subAttributes": [
     {"name": "resourceType", "type": "string", "multiValued": false, "required": false, "caseExact": true,
      "mutability": "readOnly", "returned": "default", "uniqueness": "none"},
     {"name": "created", "type": "dateTime", "multiValued": false, "required": false, "caseExact": false,
      "mutability": "readOnly", "returned": "default", "uniqueness": "none"},
     {"name": "lastModified", "type": "dateTime", "multiValued": false, "required": false, "caseExact": false,
      "mutability": "readOnly", "returned": "default", "uniqueness": "none"},
     {"name": "location", "type": "reference", "referenceTypes": ["uri"], "multiValued": false,
      "required": false, "caseExact": true, "mutability": "readOnly", "returned": "default",
      "uniqueness": "none"},
     {"name": "version", "type": "string", "multiValued": false, "required": false, "caseExact": true,
      "mutability": "readOnly", "returned": "default", "uniqueness": "none"}
   ]}
]"#
}

/// The core User schema.
pub fn core_user_schema() -> &'static str {
    r#"{
  "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Schema"],
  "id": "urn:ietf:params:scim:schemas:core:2.0:User",
  "name": "User",
  "description": "User Account",
  "attributes": [
    {"name": "userName", "type": "string", "multiValued": false, "required": true, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "server",
     "description": "Unique identifier for the User, typically used to authenticate."},
    {"name": "name", "type": "complex", "multiValued": false, "required": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none",
     "description": "The components of the user's real name.",
     "subAttributes": [
       {"name": "formatted", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "familyName", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "givenName", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "middleName", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "honorificPrefix", "type": "string", "multiValued": false, "required": false,
        "caseExact": false, "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "honorificSuffix", "type": "string", "multiValued": false, "required": false,
        "caseExact": false, "mutability": "readWrite", "returned": "default", "uniqueness": "none"}
     ]},
    {"name": "displayName", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "nickName", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "profileUrl", "type": "reference", "referenceTypes": ["external"], "multiValued": false,
     "required": false, "caseExact": false, "mutability": "readWrite", "returned": "default",
     "uniqueness": "none"},
    {"name": "title", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "userType", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "preferredLanguage", "type": "string", "multiValued": false, "required": false,
     "caseExact": false, "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "locale", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "timezone", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "active", "type": "boolean", "multiValued": false, "required": false,
     "mutability": "readWrite", "returned": "default"},
    {"name": "password", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "writeOnly", "returned": "never", "uniqueness": "none"},
    {"name": "emails", "type": "complex", "multiValued": true, "required": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none",
     "subAttributes": [
       {"name": "value", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "display", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "type", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "canonicalValues": ["work", "home", "other"],
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "primary", "type": "boolean", "multiValued": false, "required": false,
        "mutability": "readWrite", "returned": "default"}
     ]},
    {"name": "phoneNumbers", "type": "complex", "multiValued": true, "required": false,
     "mutability": "readWrite", "returned": "default",
     "subAttributes": [
       {"name": "value", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "display", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "type", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "canonicalValues": ["work", "home", "mobile", "fax", "pager", "other"],
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "primary", "type": "boolean", "multiValued": false, "required": false,
        "mutability": "readWrite", "returned": "default"}
     ]},
    {"name": "photos", "type": "complex", "multiValued": true, "required": false,
     "mutability": "readWrite", "returned": "default",
     "subAttributes": [
       {"name": "value", "type": "reference", "referenceTypes": ["external"], "multiValued": false,
        "required": false, "caseExact": false, "mutability": "readWrite", "returned": "default"},
       {"name": "type", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "canonicalValues": ["photo", "thumbnail"], "mutability": "readWrite", "returned": "default"},
       {"name": "primary", "type": "boolean", "multiValued": false, "required": false,
        "mutability": "readWrite", "returned": "default"}
     ]},
    {"name": "addresses", "type": "complex", "multiValued": true, "required": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none",
     "subAttributes": [
       {"name": "formatted", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "streetAddress", "type": "string", "multiValued": false, "required": false,
        "caseExact": false, "mutability": "readWrite", "returned": "default"},
       {"name": "locality", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "region", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "postalCode", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "country", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "type", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "canonicalValues": ["work", "home", "other"], "mutability": "readWrite", "returned": "default"},
       {"name": "primary", "type": "boolean", "multiValued": false, "required": false,
        "mutability": "readWrite", "returned": "default"}
     ]},
    {"name": "groups", "type": "complex", "multiValued": true, "required": false,
     "mutability": "readOnly", "returned": "default",
     "subAttributes": [
       {"name": "value", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readOnly", "returned": "default"},
       {"name": "$ref", "type": "reference", "referenceTypes": ["User", "Group"], "multiValued": false,
        "required": false, "caseExact": false, "mutability": "readOnly", "returned": "default"},
       {"name": "display", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readOnly", "returned": "default"},
       {"name": "type", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "canonicalValues": ["direct", "indirect"], "mutability": "readOnly", "returned": "default"}
     ]},
    {"name": "roles", "type": "complex", "multiValued": true, "required": false,
     "mutability": "readWrite", "returned": "default",
     "subAttributes": [
       {"name": "value", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "display", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "type", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "primary", "type": "boolean", "multiValued": false, "required": false,
        "mutability": "readWrite", "returned": "default"}
     ]}
  ]
}"#
}

/// The core Group schema.
pub fn core_group_schema() -> &'static str {
    r#"{
  "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Schema"],
  "id": "urn:ietf:params:scim:schemas:core:2.0:Group",
  "name": "Group",
  "description": "Group",
  "attributes": [
    {"name": "displayName", "type": "string", "multiValued": false, "required": true, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none",
     "description": "A human-readable name for the Group."},
    {"name": "members", "type": "complex", "multiValued": true, "required": false,
     "mutability": "readWrite", "returned": "default",
     "description": "A list of members of the Group.",
     "subAttributes": [
       {"name": "value", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "immutable", "returned": "default", "uniqueness": "none"},
       {"name": "$ref", "type": "reference", "referenceTypes": ["User", "Group"], "multiValued": false,
        "required": false, "caseExact": false, "mutability": "immutable", "returned": "default"},
       {"name": "display", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default"},
       {"name": "type", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "canonicalValues": ["User", "Group"], "mutability": "immutable", "returned": "default"}
     ]}
  ]
}"#
}

/// The Enterprise User extension schema.
pub fn enterprise_user_schema() -> &'static str {
    r#"{
  "schemas": ["urn:ietf:params:scim:schemas:core:2.0:Schema"],
  "id": "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User",
  "name": "EnterpriseUser",
  "description": "Enterprise User",
  "attributes": [
    {"name": "employeeNumber", "type": "string", "multiValued": false, "required": false,
     "caseExact": false, "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "costCenter", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "organization", "type": "string", "multiValued": false, "required": false,
     "caseExact": false, "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "division", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "department", "type": "string", "multiValued": false, "required": false, "caseExact": false,
     "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
    {"name": "manager", "type": "complex", "multiValued": false, "required": false,
     "mutability": "readWrite", "returned": "default",
     "subAttributes": [
       {"name": "value", "type": "string", "multiValued": false, "required": false, "caseExact": false,
        "mutability": "readWrite", "returned": "default", "uniqueness": "none"},
       {"name": "$ref", "type": "reference", "referenceTypes": ["User"], "multiValued": false,
        "required": false, "caseExact": false, "mutability": "readWrite", "returned": "default"},
       {"name": "displayName", "type": "string", "multiValued": false, "required": false,
        "caseExact": false, "mutability": "readOnly", "returned": "default"}
     ]}
  ]
}"#
}

/// ResourceType document for `/Users`.
pub fn user_resource_type() -> &'static str {
    r#"{
  "schemas": ["urn:ietf:params:scim:schemas:core:2.0:ResourceType"],
  "id": "User",
  "name": "User",
  "endpoint": "/Users",
  "description": "User Account",
  "schema": "urn:ietf:params:scim:schemas:core:2.0:User",
  "schemaExtensions": [
    {"schema": "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User", "required": false}
  ]
}"#
}

/// ResourceType document for `/Groups`.
pub fn group_resource_type() -> &'static str {
    r#"{
  "schemas": ["urn:ietf:params:scim:schemas:core:2.0:ResourceType"],
  "id": "Group",
  "name": "Group",
  "endpoint": "/Groups",
  "description": "Group",
  "schema": "urn:ietf:params:scim:schemas:core:2.0:Group"
}"#
}
