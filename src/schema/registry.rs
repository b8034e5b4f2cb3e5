//! Schema registry: the immutable catalogue of schemas and resource types.
//!
//! The registry is populated once at startup and shared read-only (behind an
//! `Arc`) by every request afterwards.

use super::embedded;
use super::loader::parse_schema;
use super::resource_type::{ResourceType, ResourceTypeFeatures};
use super::types::Schema;
use crate::error::{BuildError, BuildResult};

use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Registry of SCIM schemas and resource types.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: Vec<Arc<Schema>>,
    schema_index: HashMap<String, usize>,
    resource_types: Vec<Arc<ResourceType>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry serving the RFC 7643 User (with the Enterprise User
    /// extension) and Group resource types.
    pub fn with_embedded_schemas() -> BuildResult<Self> {
        let mut registry = Self::new();
        registry.register_resource_type(
            &parse_embedded(embedded::user_resource_type())?,
            &parse_embedded(embedded::core_user_schema())?,
            &[parse_embedded(embedded::enterprise_user_schema())?],
        )?;
        registry.register_resource_type(
            &parse_embedded(embedded::group_resource_type())?,
            &parse_embedded(embedded::core_group_schema())?,
            &[],
        )?;
        Ok(registry)
    }

    /// Register a resource type with default features.
    pub fn register_resource_type(
        &mut self,
        resource_type: &Value,
        primary_schema: &Value,
        extension_schemas: &[Value],
    ) -> BuildResult<Arc<ResourceType>> {
        self.register_resource_type_with_features(
            resource_type,
            primary_schema,
            extension_schemas,
            ResourceTypeFeatures::default(),
        )
    }

    /// Register a resource type from its document, its primary schema and the
    /// schemas of every declared extension.
    pub fn register_resource_type_with_features(
        &mut self,
        resource_type: &Value,
        primary_schema: &Value,
        extension_schemas: &[Value],
        features: ResourceTypeFeatures,
    ) -> BuildResult<Arc<ResourceType>> {
        let schema = self.register_schema(primary_schema)?;
        let extensions = extension_schemas
            .iter()
            .map(|doc| self.register_schema(doc))
            .collect::<BuildResult<Vec<_>>>()?;

        let resource_type = ResourceType::from_document(resource_type, schema, extensions, features)?;

        if let Some(existing) = self.resource_types.iter().find(|rt| {
            rt.name.eq_ignore_ascii_case(&resource_type.name)
                || rt.endpoint.eq_ignore_ascii_case(&resource_type.endpoint)
        }) {
            return Err(BuildError::invalid_resource_type(
                &resource_type.name,
                format!(
                    "conflicts with registered resource type '{}' at '{}'",
                    existing.name, existing.endpoint
                ),
            ));
        }

        log::info!(
            "Registered resource type '{}' at '{}' ({} extension(s))",
            resource_type.name,
            resource_type.endpoint,
            resource_type.extensions.len()
        );

        let resource_type = Arc::new(resource_type);
        self.resource_types.push(Arc::clone(&resource_type));
        Ok(resource_type)
    }

    /// Parse and register a schema document.
    ///
    /// Registering the same URI again under the same name returns the existing
    /// schema; a different name is a configuration error.
    pub fn register_schema(&mut self, document: &Value) -> BuildResult<Arc<Schema>> {
        let schema = parse_schema(document)?;

        if let Some(&index) = self.schema_index.get(&schema.id) {
            let existing = &self.schemas[index];
            if existing.name != schema.name {
                return Err(BuildError::SchemaConflict {
                    uri: schema.id,
                    existing: existing.name.clone(),
                    name: schema.name,
                });
            }
            return Ok(Arc::clone(existing));
        }

        let schema = Arc::new(schema);
        self.schema_index
            .insert(schema.id.clone(), self.schemas.len());
        self.schemas.push(Arc::clone(&schema));
        Ok(schema)
    }

    /// Load a schema document from a JSON file and register it.
    pub fn register_schema_file<P: AsRef<Path>>(&mut self, path: P) -> BuildResult<Arc<Schema>> {
        let content = fs::read_to_string(&path).map_err(|e| BuildError::InvalidConfiguration {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        let document: Value =
            serde_json::from_str(&content).map_err(|e| BuildError::InvalidConfiguration {
                message: format!("{} is not valid JSON: {}", path.as_ref().display(), e),
            })?;
        self.register_schema(&document)
    }

    pub fn get_schema(&self, uri: &str) -> Option<&Arc<Schema>> {
        self.schema_index
            .get(uri)
            .map(|&index| &self.schemas[index])
            .or_else(|| {
                self.schemas
                    .iter()
                    .find(|schema| schema.id.eq_ignore_ascii_case(uri))
            })
    }

    /// All schemas in registration order.
    pub fn schemas(&self) -> &[Arc<Schema>] {
        &self.schemas
    }

    /// All resource types in registration order.
    pub fn resource_types(&self) -> &[Arc<ResourceType>] {
        &self.resource_types
    }

    pub fn get_resource_type(&self, name: &str) -> Option<&Arc<ResourceType>> {
        self.resource_types
            .iter()
            .find(|rt| rt.name.eq_ignore_ascii_case(name))
    }

    /// Resource type served at `endpoint`; the leading slash is optional.
    pub fn get_resource_type_by_endpoint(&self, endpoint: &str) -> Option<&Arc<ResourceType>> {
        let trimmed = endpoint.trim_start_matches('/');
        self.resource_types
            .iter()
            .find(|rt| rt.endpoint.trim_start_matches('/').eq_ignore_ascii_case(trimmed))
    }
}

fn parse_embedded(document: &str) -> BuildResult<Value> {
    serde_json::from_str(document).map_err(|e| BuildError::InvalidConfiguration {
        message: format!("embedded document is not valid JSON: {}", e),
    })
}
