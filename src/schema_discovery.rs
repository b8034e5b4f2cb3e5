//! Service provider configuration and discovery documents.
//!
//! [`ServiceProviderConfig`] mirrors the RFC 7643 §5 resource and is served
//! at `/ServiceProviderConfig`. Its switches also drive the engine: `etag`
//! gates conditional requests, `bulk.maxOperations` caps bulk requests and
//! `filter.maxResults` caps list pages.

use crate::error::{BuildError, BuildResult};
use crate::schema::{ResourceType, Schema};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::Path;

pub const SERVICE_PROVIDER_CONFIG_URI: &str =
    "urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig";
pub const LIST_RESPONSE_URI: &str = "urn:ietf:params:scim:api:messages:2.0:ListResponse";

/// A capability that is either supported or not.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Supported {
    pub supported: bool,
}

impl Supported {
    pub fn new(supported: bool) -> Self {
        Self { supported }
    }
}

/// Bulk capability and limits.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkConfig {
    pub supported: bool,
    pub max_operations: usize,
    pub max_payload_size: usize,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            supported: true,
            max_operations: 1000,
            max_payload_size: 1_048_576,
        }
    }
}

/// Filter capability and the largest page a list may return.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterConfig {
    pub supported: bool,
    pub max_results: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            supported: true,
            max_results: 200,
        }
    }
}

/// Service provider configuration as defined in RFC 7643 §5.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_uri: Option<String>,
    pub patch: Supported,
    pub bulk: BulkConfig,
    pub filter: FilterConfig,
    pub change_password: Supported,
    pub sort: Supported,
    pub etag: Supported,
    #[serde(default)]
    pub authentication_schemes: Vec<AuthenticationScheme>,
}

impl Default for ServiceProviderConfig {
    fn default() -> Self {
        Self {
            documentation_uri: None,
            patch: Supported::new(true),
            bulk: BulkConfig::default(),
            filter: FilterConfig::default(),
            change_password: Supported::new(false),
            sort: Supported::new(true),
            etag: Supported::new(true),
            authentication_schemes: Vec::new(),
        }
    }
}

impl ServiceProviderConfig {
    /// Parse a configuration document.
    pub fn from_json(value: &Value) -> BuildResult<Self> {
        serde_json::from_value(value.clone()).map_err(|e| BuildError::InvalidConfiguration {
            message: format!("Invalid service provider configuration: {}", e),
        })
    }

    /// Load a configuration document from disk.
    pub fn from_file<P: AsRef<Path>>(path: P) -> BuildResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::InvalidConfiguration {
            message: format!("Failed to read {}: {}", path.display(), e),
        })?;
        let value: Value =
            serde_json::from_str(&content).map_err(|e| BuildError::InvalidConfiguration {
                message: format!("Failed to parse {}: {}", path.display(), e),
            })?;
        Self::from_json(&value)
    }

    /// The `/ServiceProviderConfig` resource.
    pub fn to_resource(&self, base_url: &str) -> Value {
        let mut body = serde_json::to_value(self).unwrap_or_else(|_| json!({}));
        if let Some(object) = body.as_object_mut() {
            object.insert("schemas".to_string(), json!([SERVICE_PROVIDER_CONFIG_URI]));
            object.insert(
                "meta".to_string(),
                json!({
                    "resourceType": "ServiceProviderConfig",
                    "location": format!("{}/ServiceProviderConfig", base_url),
                }),
            );
        }
        body
    }
}

/// Authentication scheme definition for service provider config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationScheme {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_uri: Option<String>,
    /// Scheme type, e.g. `oauthbearertoken` or `httpbasic`
    #[serde(rename = "type")]
    pub auth_type: String,
    #[serde(default)]
    pub primary: bool,
}

/// The `/Schemas/{id}` representation of a schema.
pub fn schema_resource(schema: &Schema, base_url: &str) -> Value {
    let mut body = schema.definition().clone();
    if let Some(object) = body.as_object_mut() {
        object.insert(
            "meta".to_string(),
            json!({
                "resourceType": "Schema",
                "location": format!("{}/Schemas/{}", base_url, schema.id),
            }),
        );
    }
    body
}

/// The `/ResourceTypes/{name}` representation of a resource type.
pub fn resource_type_resource(resource_type: &ResourceType, base_url: &str) -> Value {
    resource_type.to_json(base_url)
}

/// Wrap resources in an RFC 7644 §3.4.2 list response.
pub fn list_response(resources: Vec<Value>, total_results: usize, start_index: usize) -> Value {
    json!({
        "schemas": [LIST_RESPONSE_URI],
        "totalResults": total_results,
        "startIndex": start_index,
        "itemsPerPage": resources.len(),
        "Resources": resources,
    })
}
