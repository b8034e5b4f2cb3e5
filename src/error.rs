//! Error types for SCIM engine operations.
//!
//! Every failure the engine can produce is a [`ScimError`]. Each variant maps
//! deterministically to an HTTP status and, where RFC 7644 defines one, a
//! `scimType` code, so transports can render the RFC 7644 §3.12 error body via
//! [`ScimError::to_error_body`] without inspecting the error themselves.

use crate::resource::version::VersionConflict;
use serde_json::{Value, json};
use std::fmt;

/// Schema URI of SCIM error response bodies.
pub const ERROR_RESPONSE_URI: &str = "urn:ietf:params:scim:api:messages:2.0:Error";

/// The `scimType` detail codes defined by RFC 7644 §3.12, plus the
/// implementation-defined `missingExtension`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScimType {
    InvalidFilter,
    TooMany,
    Uniqueness,
    Mutability,
    InvalidSyntax,
    InvalidPath,
    NoTarget,
    InvalidValue,
    InvalidVers,
    Sensitive,
    MissingExtension,
}

impl ScimType {
    /// Wire representation of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFilter => "invalidFilter",
            Self::TooMany => "tooMany",
            Self::Uniqueness => "uniqueness",
            Self::Mutability => "mutability",
            Self::InvalidSyntax => "invalidSyntax",
            Self::InvalidPath => "invalidPath",
            Self::NoTarget => "noTarget",
            Self::InvalidValue => "invalidValue",
            Self::InvalidVers => "invalidVers",
            Self::Sensitive => "sensitive",
            Self::MissingExtension => "missingExtension",
        }
    }
}

impl fmt::Display for ScimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for SCIM engine operations.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// Schema validation failed; carries every offending attribute
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationErrors),

    /// Malformed filter expression
    #[error("Invalid filter: {0}")]
    InvalidFilter(#[from] FilterError),

    /// PATCH path that does not resolve against the resource type
    #[error("Invalid path '{path}': {message}")]
    InvalidPath { path: String, message: String },

    /// PATCH value-path filter matched nothing
    #[error("No target found for path '{path}'")]
    NoTarget { path: String },

    /// Attempt to change an attribute its mutability forbids
    #[error("Attribute '{attribute}' cannot be modified: {message}")]
    Mutability { attribute: String, message: String },

    /// Syntactically broken request document
    #[error("Invalid syntax: {message}")]
    InvalidSyntax { message: String },

    /// Semantically invalid request value
    #[error("Invalid value: {message}")]
    InvalidValue { message: String },

    /// Bulk operation referenced a bulkId that has no successful result yet
    #[error("Unresolved bulkId reference 'bulkId:{bulk_id}'")]
    UnresolvedBulkId { bulk_id: String },

    /// Request exceeds a configured limit
    #[error("Too many operations: {message}")]
    TooMany { message: String },

    /// Resource not found
    #[error("Resource not found: {resource_type} with ID {id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// No resource type is registered for the endpoint
    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// Schema not found
    #[error("Schema not found: {schema_id}")]
    SchemaNotFound { schema_id: String },

    /// Attribute value collides with an existing resource
    #[error("Uniqueness violation: {message}")]
    Uniqueness { message: String },

    /// Generic conflict raised by a resource handler
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Conditional request did not match the stored version
    #[error("{0}")]
    VersionMismatch(#[from] VersionConflict),

    /// Operation is disabled for the resource type or endpoint
    #[error("Unsupported operation '{operation}' for resource type '{resource_type}'")]
    UnsupportedOperation {
        resource_type: String,
        operation: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors from the embedder-supplied resource handler
    #[error("Resource handler error: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Internal errors; never exposed in detail to clients
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

impl ScimError {
    /// Create a resource not found error
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create a schema not found error
    pub fn schema_not_found(schema_id: impl Into<String>) -> Self {
        Self::SchemaNotFound {
            schema_id: schema_id.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid syntax error
    pub fn invalid_syntax(message: impl Into<String>) -> Self {
        Self::InvalidSyntax {
            message: message.into(),
        }
    }

    /// Create an invalid value error
    pub fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a no target error
    pub fn no_target(path: impl Into<String>) -> Self {
        Self::NoTarget { path: path.into() }
    }

    /// Create a mutability error
    pub fn mutability(attribute: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mutability {
            attribute: attribute.into(),
            message: message.into(),
        }
    }

    /// Create a uniqueness error
    pub fn uniqueness(message: impl Into<String>) -> Self {
        Self::Uniqueness {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation(
        resource_type: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::UnsupportedOperation {
            resource_type: resource_type.into(),
            operation: operation.into(),
        }
    }

    /// Wrap a resource handler error
    pub fn handler_error<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Handler(Box::new(error))
    }

    /// HTTP status code this error maps to.
    pub fn status(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::InvalidFilter(_)
            | Self::InvalidPath { .. }
            | Self::NoTarget { .. }
            | Self::Mutability { .. }
            | Self::InvalidSyntax { .. }
            | Self::InvalidValue { .. }
            | Self::UnresolvedBulkId { .. }
            | Self::Json(_) => 400,
            Self::TooMany { .. } => 413,
            Self::ResourceNotFound { .. }
            | Self::UnsupportedResourceType(_)
            | Self::SchemaNotFound { .. } => 404,
            Self::Uniqueness { .. } | Self::Conflict { .. } => 409,
            Self::VersionMismatch(_) => 412,
            Self::UnsupportedOperation { .. } => 501,
            Self::Handler(_) | Self::Internal { .. } => 500,
        }
    }

    /// RFC 7644 `scimType` for this error, if one applies.
    pub fn scim_type(&self) -> Option<ScimType> {
        match self {
            Self::Validation(errors) => Some(errors.scim_type()),
            Self::InvalidFilter(_) => Some(ScimType::InvalidFilter),
            Self::InvalidPath { .. } => Some(ScimType::InvalidPath),
            Self::NoTarget { .. } => Some(ScimType::NoTarget),
            Self::Mutability { .. } => Some(ScimType::Mutability),
            Self::InvalidSyntax { .. } | Self::Json(_) => Some(ScimType::InvalidSyntax),
            Self::InvalidValue { .. } | Self::UnresolvedBulkId { .. } => {
                Some(ScimType::InvalidValue)
            }
            Self::TooMany { .. } => Some(ScimType::TooMany),
            Self::Uniqueness { .. } => Some(ScimType::Uniqueness),
            _ => None,
        }
    }

    /// Render the RFC 7644 §3.12 error response body.
    ///
    /// Internal and handler failures only expose a generic detail.
    pub fn to_error_body(&self) -> Value {
        let detail = match self {
            Self::Internal { .. } | Self::Handler(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };
        let mut body = json!({
            "schemas": [ERROR_RESPONSE_URI],
            "status": self.status().to_string(),
            "detail": detail,
        });
        if let (Some(scim_type), Some(obj)) = (self.scim_type(), body.as_object_mut()) {
            obj.insert(
                "scimType".to_string(),
                Value::String(scim_type.as_str().to_string()),
            );
        }
        body
    }
}

/// One offending attribute found during schema validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Required attribute is missing
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Attribute value doesn't match expected type
    #[error("Attribute '{attribute}' has invalid type, expected {expected}, got {actual}")]
    InvalidDataType {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Multi-valued attribute provided as single value
    #[error("Attribute '{attribute}' must be multi-valued (array)")]
    ExpectedMultiValue { attribute: String },

    /// Single-valued attribute provided as array
    #[error("Attribute '{attribute}' must be single-valued (not array)")]
    ExpectedSingleValue { attribute: String },

    /// Invalid value for attribute with canonical values
    #[error("Attribute '{attribute}' has invalid value '{value}', allowed values: {allowed:?}")]
    InvalidCanonicalValue {
        attribute: String,
        value: String,
        allowed: Vec<String>,
    },

    /// Integer outside the representable range
    #[error("Attribute '{attribute}' has invalid integer value: {value}")]
    InvalidIntegerValue { attribute: String, value: String },

    /// Unparseable dateTime
    #[error("Attribute '{attribute}' has invalid datetime format: {value}")]
    InvalidDateTimeFormat { attribute: String, value: String },

    /// Binary value that is not base64
    #[error("Attribute '{attribute}' has invalid binary data: {details}")]
    InvalidBinaryData { attribute: String, details: String },

    /// Unknown attribute in strict mode
    #[error("Unknown attribute '{attribute}' in schema '{schema_id}'")]
    UnknownAttribute {
        attribute: String,
        schema_id: String,
    },

    /// Missing schemas attribute
    #[error("Missing required 'schemas' attribute")]
    MissingSchemas,

    /// Schemas list does not name the resource type's primary schema
    #[error("'schemas' must contain the base schema '{uri}'")]
    MissingBaseSchema { uri: String },

    /// Schema URI that is neither the primary schema nor a registered extension
    #[error("Unknown schema URI: {uri}")]
    UnknownSchemaUri { uri: String },

    /// Required schema extension absent
    #[error("Required extension '{uri}' is missing")]
    MissingRequiredExtension { uri: String },

    /// More than one entry flagged as primary
    #[error("Attribute '{attribute}' cannot have multiple primary values")]
    MultiplePrimaryValues { attribute: String },

    /// Immutable attribute changed after creation
    #[error("Attribute '{attribute}' is immutable and cannot be modified after creation")]
    ImmutableMutabilityViolation { attribute: String },

    /// General validation error with custom message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid type error
    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidDataType {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }

    /// The `scimType` this single error maps to.
    pub fn scim_type(&self) -> ScimType {
        match self {
            Self::MissingRequiredExtension { .. } => ScimType::MissingExtension,
            Self::ImmutableMutabilityViolation { .. } => ScimType::Mutability,
            Self::MissingSchemas => ScimType::InvalidSyntax,
            _ => ScimType::InvalidValue,
        }
    }
}

/// Every offending attribute of one validation pass.
#[derive(Debug, Clone, PartialEq, Default, thiserror::Error)]
#[error("{}", join_errors(.errors))]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn extend(&mut self, other: ValidationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }

    /// `Ok(value)` when nothing was collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> ValidationResult<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }

    /// Most specific `scimType` among the collected errors.
    pub fn scim_type(&self) -> ScimType {
        let types: Vec<ScimType> = self.errors.iter().map(|e| e.scim_type()).collect();
        [
            ScimType::MissingExtension,
            ScimType::Mutability,
            ScimType::InvalidSyntax,
        ]
        .into_iter()
        .find(|t| types.contains(t))
        .unwrap_or(ScimType::InvalidValue)
    }
}

impl From<ValidationError> for ValidationErrors {
    fn from(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<ValidationError> for ScimError {
    fn from(error: ValidationError) -> Self {
        Self::Validation(error.into())
    }
}

/// Malformed filter or attribute path expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{message} at position {position} near '{fragment}'")]
pub struct FilterError {
    pub message: String,
    /// The offending substring of the expression
    pub fragment: String,
    /// Byte offset of the fragment within the expression
    pub position: usize,
}

impl FilterError {
    pub fn new(message: impl Into<String>, fragment: impl Into<String>, position: usize) -> Self {
        Self {
            message: message.into(),
            fragment: fragment.into(),
            position,
        }
    }
}

/// Errors that can occur while building the registry or the server.
///
/// These are configuration problems detected at startup, never at request time.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Schema document could not be parsed into attribute metadata
    #[error("Invalid schema '{schema_id}': {message}")]
    InvalidSchema { schema_id: String, message: String },

    /// Schema URI already registered under another name
    #[error("Schema '{uri}' is already registered as '{existing}', cannot register it as '{name}'")]
    SchemaConflict {
        uri: String,
        existing: String,
        name: String,
    },

    /// Resource type document is inconsistent
    #[error("Invalid resource type '{name}': {message}")]
    InvalidResourceType { name: String, message: String },

    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl BuildError {
    pub fn invalid_schema(schema_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidSchema {
            schema_id: schema_id.into(),
            message: message.into(),
        }
    }

    pub fn invalid_resource_type(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResourceType {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl From<BuildError> for ScimError {
    fn from(error: BuildError) -> Self {
        Self::internal(error.to_string())
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type ValidationResult<T> = Result<T, ValidationErrors>;
pub type BuildResult<T> = Result<T, BuildError>;
