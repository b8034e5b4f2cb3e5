//! Resolution of PATCH `path` values against a resource type.

use crate::error::{ScimError, ScimResult};
use crate::filter::{FilterNode, PathExpression, parse_path};
use crate::schema::{ResourceType, Schema, SchemaAttribute};
use std::sync::Arc;

/// A resolved PATCH target.
#[derive(Debug, Clone, PartialEq)]
pub enum PatchPath {
    /// The path names a whole schema extension, e.g.
    /// `urn:ietf:params:scim:schemas:extension:enterprise:2.0:User`
    ExtensionRoot(Arc<Schema>),
    Attribute(PathExpression),
}

impl PatchPath {
    pub fn parse(text: &str, resource_type: &ResourceType) -> ScimResult<Self> {
        if let Some(extension) = resource_type.extension(text) {
            return Ok(Self::ExtensionRoot(Arc::clone(&extension.schema)));
        }
        parse_path(text, resource_type)
            .map(Self::Attribute)
            .map_err(|e| ScimError::invalid_path(text, e.to_string()))
    }

    /// Target of a value without an explicit path, keyed by attribute name.
    pub fn for_attribute(attribute: Arc<SchemaAttribute>) -> Self {
        Self::Attribute(PathExpression {
            attribute,
            filter: None,
            sub_attribute: None,
        })
    }
}

/// Borrowed view of an attribute target.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Target<'p> {
    pub attribute: &'p Arc<SchemaAttribute>,
    pub filter: Option<&'p FilterNode>,
    pub sub_attribute: Option<&'p Arc<SchemaAttribute>>,
}

impl<'p> Target<'p> {
    pub fn new(expression: &'p PathExpression) -> Self {
        Self {
            attribute: &expression.attribute,
            filter: expression.filter.as_ref(),
            sub_attribute: expression.sub_attribute.as_ref(),
        }
    }

    /// The attribute the operation ultimately writes.
    pub fn leaf(&self) -> &'p Arc<SchemaAttribute> {
        self.sub_attribute.unwrap_or(self.attribute)
    }
}
