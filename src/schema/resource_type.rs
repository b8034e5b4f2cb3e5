//! Resource types: an endpoint bound to a primary schema plus extensions.

use super::loader::parse_attribute_list;
use super::types::{Schema, SchemaAttribute};
use super::embedded;
use crate::error::{BuildError, BuildResult};
use serde_json::{Value, json};
use std::collections::HashSet;
use std::sync::Arc;

/// Endpoint operations that can be switched off per resource type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointOperation {
    Create,
    Get,
    List,
    Replace,
    Patch,
    Delete,
}

impl EndpointOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Get => "get",
            Self::List => "list",
            Self::Replace => "replace",
            Self::Patch => "patch",
            Self::Delete => "delete",
        }
    }
}

/// Engine behaviour toggles for one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeFeatures {
    /// Evaluate list filters in the engine instead of the handler
    pub auto_filtering: bool,
    /// Sort list results in the engine instead of the handler
    pub auto_sorting: bool,
    /// The endpoint exposes exactly one resource; a GET without id returns it
    pub singleton_endpoint: bool,
    /// Check `If-Match` and emit ETags (also gated by the server-wide flag)
    pub etag_enabled: bool,
    pub disabled_operations: HashSet<EndpointOperation>,
}

impl Default for ResourceTypeFeatures {
    fn default() -> Self {
        Self {
            auto_filtering: true,
            auto_sorting: true,
            singleton_endpoint: false,
            etag_enabled: true,
            disabled_operations: HashSet::new(),
        }
    }
}

impl ResourceTypeFeatures {
    pub fn disable(mut self, operation: EndpointOperation) -> Self {
        self.disabled_operations.insert(operation);
        self
    }

    pub fn is_enabled(&self, operation: EndpointOperation) -> bool {
        !self.disabled_operations.contains(&operation)
    }
}

/// A schema extension attached to a resource type.
#[derive(Debug, Clone)]
pub struct SchemaExtension {
    pub schema: Arc<Schema>,
    pub required: bool,
}

/// A registered SCIM resource type.
#[derive(Debug, Clone)]
pub struct ResourceType {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Endpoint path, always with a leading slash (`/Users`)
    pub endpoint: String,
    pub schema: Arc<Schema>,
    pub extensions: Vec<SchemaExtension>,
    pub features: ResourceTypeFeatures,
    /// `id`, `externalId` and `meta` unless the primary schema declares them
    common_attributes: Vec<Arc<SchemaAttribute>>,
}

impl ResourceType {
    /// Build a resource type from its RFC 7643 §6 document.
    ///
    /// `schema` and `extensions` must already be resolved; their URIs are
    /// checked against the document's `schema` and `schemaExtensions`.
    pub(crate) fn from_document(
        document: &Value,
        schema: Arc<Schema>,
        extensions: Vec<Arc<Schema>>,
        features: ResourceTypeFeatures,
    ) -> BuildResult<Self> {
        let name = document
            .get("name")
            .and_then(Value::as_str)
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| BuildError::invalid_resource_type("<unknown>", "missing 'name'"))?
            .to_string();

        let endpoint = document
            .get("endpoint")
            .and_then(Value::as_str)
            .filter(|e| !e.trim().is_empty())
            .ok_or_else(|| BuildError::invalid_resource_type(&name, "missing 'endpoint'"))?;
        let endpoint = if endpoint.starts_with('/') {
            endpoint.to_string()
        } else {
            format!("/{}", endpoint)
        };

        match document.get("schema").and_then(Value::as_str) {
            Some(uri) if uri == schema.id => {}
            Some(uri) => {
                return Err(BuildError::invalid_resource_type(
                    &name,
                    format!("declares schema '{}' but '{}' was supplied", uri, schema.id),
                ));
            }
            None => return Err(BuildError::invalid_resource_type(&name, "missing 'schema'")),
        }

        let declared = document
            .get("schemaExtensions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut resolved = Vec::with_capacity(declared.len());
        for entry in &declared {
            let uri = entry.get("schema").and_then(Value::as_str).ok_or_else(|| {
                BuildError::invalid_resource_type(&name, "schema extension without 'schema'")
            })?;
            let extension = extensions.iter().find(|s| s.id == uri).ok_or_else(|| {
                BuildError::invalid_resource_type(
                    &name,
                    format!("no schema document supplied for extension '{}'", uri),
                )
            })?;
            resolved.push(SchemaExtension {
                schema: Arc::clone(extension),
                required: entry.get("required").and_then(Value::as_bool).unwrap_or(false),
            });
        }

        if let Some(extra) = extensions
            .iter()
            .find(|s| !resolved.iter().any(|e| e.schema.id == s.id))
        {
            return Err(BuildError::invalid_resource_type(
                &name,
                format!("extension '{}' is not declared in 'schemaExtensions'", extra.id),
            ));
        }

        let common_attributes = common_attributes_for(&schema)?;

        Ok(Self {
            id: document
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or(&name)
                .to_string(),
            description: document
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            name,
            endpoint,
            schema,
            extensions: resolved,
            features,
            common_attributes,
        })
    }

    /// Top-level attributes of the primary schema plus the common attributes.
    pub fn core_attributes(&self) -> impl Iterator<Item = &Arc<SchemaAttribute>> {
        self.schema.attributes.iter().chain(self.common_attributes.iter())
    }

    /// Top-level core attribute by name, case-insensitively.
    pub fn core_attribute(&self, name: &str) -> Option<&Arc<SchemaAttribute>> {
        self.core_attributes()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Registered extension by URI, case-insensitively.
    pub fn extension(&self, uri: &str) -> Option<&SchemaExtension> {
        self.extensions
            .iter()
            .find(|ext| ext.schema.id.eq_ignore_ascii_case(uri))
    }

    pub fn is_extension_uri(&self, uri: &str) -> bool {
        self.extension(uri).is_some()
    }

    /// Whether `uri` names the primary schema or one of the extensions.
    pub fn has_schema(&self, uri: &str) -> bool {
        self.schema.id.eq_ignore_ascii_case(uri) || self.is_extension_uri(uri)
    }

    /// All schema URIs of this resource type, primary first.
    pub fn schema_uris(&self) -> Vec<String> {
        std::iter::once(self.schema.id.clone())
            .chain(self.extensions.iter().map(|e| e.schema.id.clone()))
            .collect()
    }

    /// Resolve an attribute path.
    ///
    /// Accepts `attr`, `attr.sub`, and either form prefixed with a schema URI
    /// (`urn:...:User:name.givenName`). Unqualified names are looked up in the
    /// primary schema first, then in each extension.
    pub fn find_attribute(&self, path: &str) -> Option<Arc<SchemaAttribute>> {
        if let Some((uri, rest)) = self.split_schema_prefix(path) {
            if uri.eq_ignore_ascii_case(&self.schema.id) {
                return self.find_core(rest);
            }
            return self
                .extension(uri)
                .and_then(|ext| ext.schema.find(rest))
                .cloned();
        }

        self.find_core(path).or_else(|| {
            self.extensions
                .iter()
                .find_map(|ext| ext.schema.find(path).cloned())
        })
    }

    fn find_core(&self, path: &str) -> Option<Arc<SchemaAttribute>> {
        match path.split_once('.') {
            Some((parent, sub)) => self.core_attribute(parent)?.sub_attribute(sub).cloned(),
            None => self.core_attribute(path).cloned(),
        }
    }

    /// Split `urn:...:Schema:attr.sub` into the schema URI and the remainder.
    ///
    /// Only prefixes naming one of this resource type's schemas are split.
    pub fn split_schema_prefix<'p>(&self, path: &'p str) -> Option<(&'p str, &'p str)> {
        self.schema_uris()
            .iter()
            .filter(|uri| {
                path.len() > uri.len() + 1
                    && path.is_char_boundary(uri.len())
                    && path[..uri.len()].eq_ignore_ascii_case(uri)
                    && path.as_bytes()[uri.len()] == b':'
            })
            .max_by_key(|uri| uri.len())
            .map(|uri| (&path[..uri.len()], &path[uri.len() + 1..]))
    }

    /// Attribute holding resource metadata.
    pub fn meta_attribute(&self) -> Option<Arc<SchemaAttribute>> {
        self.core_attribute("meta").cloned()
    }

    /// The RFC 7643 §6 representation served by `/ResourceTypes`.
    pub fn to_json(&self, base_url: &str) -> Value {
        let extensions: Vec<Value> = self
            .extensions
            .iter()
            .map(|ext| json!({"schema": ext.schema.id, "required": ext.required}))
            .collect();
        let mut document = json!({
            "schemas": ["urn:ietf:params:scim:schemas:core:2.0:ResourceType"],
            "id": self.id,
            "name": self.name,
            "description": self.description,
            "endpoint": self.endpoint,
            "schema": self.schema.id,
            "meta": {
                "resourceType": "ResourceType",
                "location": format!("{}/ResourceTypes/{}", base_url.trim_end_matches('/'), self.id),
            }
        });
        if !extensions.is_empty() {
            document["schemaExtensions"] = Value::Array(extensions);
        }
        document
    }
}

fn common_attributes_for(schema: &Schema) -> BuildResult<Vec<Arc<SchemaAttribute>>> {
    let definitions: Value = serde_json::from_str(embedded::common_attributes())
        .map_err(|e| BuildError::invalid_schema(&schema.id, e.to_string()))?;
    let items = definitions.as_array().cloned().unwrap_or_default();
    let parsed = parse_attribute_list(&items, &schema.id, None)?;
    Ok(parsed
        .into_iter()
        .filter(|attr| schema.attribute(&attr.name).is_none())
        .collect())
}
