//! Schema registry, resource types and schema validation.
//!
//! # Key Types
//!
//! - [`SchemaRegistry`] - immutable catalogue of schemas and resource types
//! - [`ResourceType`] - an endpoint bound to a primary schema and extensions
//! - [`SchemaAttribute`] - parsed attribute metadata
//! - [`SchemaValidator`] - turns raw JSON into a typed document
//!
//! # Examples
//!
//! ```rust
//! use scim_engine::schema::{OperationContext, SchemaRegistry};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::with_embedded_schemas()?;
//! let users = registry.get_resource_type_by_endpoint("/Users").unwrap();
//! let document = users.validate(
//!     &json!({
//!         "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!         "userName": "bjensen"
//!     }),
//!     OperationContext::Create,
//! )?;
//! assert!(document.id().is_none());
//! # Ok(())
//! # }
//! ```

pub mod embedded;
pub mod loader;
pub mod registry;
pub mod resource_type;
pub mod types;
pub mod validation;

#[cfg(test)]
mod tests;

pub use registry::SchemaRegistry;
pub use resource_type::{EndpointOperation, ResourceType, ResourceTypeFeatures, SchemaExtension};
pub use types::{AttributeType, Mutability, Returned, Schema, SchemaAttribute, Uniqueness};
pub use validation::{OperationContext, SchemaValidator, validate_document};

use crate::error::ValidationResult;
use crate::resource::Document;
use serde_json::Value;

impl ResourceType {
    /// Validate `raw` against this resource type.
    pub fn validate(&self, raw: &Value, context: OperationContext) -> ValidationResult<Document> {
        SchemaValidator::new(self, context).validate(raw)
    }
}
