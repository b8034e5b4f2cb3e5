//! Core schema type definitions for SCIM resources.
//!
//! These are the parsed, immutable forms of RFC 7643 schema documents. A
//! [`SchemaAttribute`] knows the schema it belongs to and, for sub-attributes,
//! the name of its complex parent, so any attribute can report its
//! fully-qualified name without walking back up the tree.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// A parsed SCIM schema.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Schema URI
    pub id: String,
    /// Human-readable schema name
    pub name: String,
    pub description: String,
    /// Top-level attribute definitions, in document order
    pub attributes: Vec<Arc<SchemaAttribute>>,
    /// The document the schema was loaded from, served by `/Schemas`
    pub(crate) definition: Value,
}

impl Schema {
    /// Top-level attribute by name, case-insensitively.
    pub fn attribute(&self, name: &str) -> Option<&Arc<SchemaAttribute>> {
        self.attributes
            .iter()
            .find(|attr| attr.name.eq_ignore_ascii_case(name))
    }

    /// Resolve a dotted `attr` or `attr.sub` path relative to this schema.
    pub fn find(&self, path: &str) -> Option<&Arc<SchemaAttribute>> {
        match path.split_once('.') {
            Some((parent, sub)) => self.attribute(parent)?.sub_attribute(sub),
            None => self.attribute(path),
        }
    }

    /// The source document as loaded.
    pub fn definition(&self) -> &Value {
        &self.definition
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

/// Definition of one SCIM attribute or sub-attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaAttribute {
    pub name: String,
    /// URI of the schema that declares this attribute
    pub schema_uri: String,
    /// Name of the complex parent, for sub-attributes
    pub parent_name: Option<String>,
    pub data_type: AttributeType,
    pub multi_valued: bool,
    pub description: String,
    pub required: bool,
    pub case_exact: bool,
    pub mutability: Mutability,
    pub returned: Returned,
    pub uniqueness: Uniqueness,
    pub canonical_values: Vec<String>,
    pub reference_types: Vec<String>,
    pub sub_attributes: Vec<Arc<SchemaAttribute>>,
}

impl SchemaAttribute {
    /// `name` or `parent.name`.
    pub fn scim_name(&self) -> String {
        match &self.parent_name {
            Some(parent) => format!("{}.{}", parent, self.name),
            None => self.name.clone(),
        }
    }

    /// `schemaUri:name` or `schemaUri:parent.name`.
    pub fn full_name(&self) -> String {
        format!("{}:{}", self.schema_uri, self.scim_name())
    }

    pub fn is_complex(&self) -> bool {
        self.data_type == AttributeType::Complex
    }

    pub fn is_sub_attribute(&self) -> bool {
        self.parent_name.is_some()
    }

    /// Sub-attribute by name, case-insensitively.
    pub fn sub_attribute(&self, name: &str) -> Option<&Arc<SchemaAttribute>> {
        self.sub_attributes
            .iter()
            .find(|sub| sub.name.eq_ignore_ascii_case(name))
    }

    pub fn is_read_only(&self) -> bool {
        self.mutability == Mutability::ReadOnly
    }

    /// True when the attribute is a multi-valued complex attribute with a
    /// boolean `primary` sub-attribute.
    pub fn has_primary(&self) -> bool {
        self.multi_valued
            && self
                .sub_attribute("primary")
                .is_some_and(|p| p.data_type == AttributeType::Boolean)
    }

    /// Whether `value` is allowed by the canonical value list.
    ///
    /// An empty list allows everything.
    pub fn allows_canonical(&self, value: &str) -> bool {
        if self.canonical_values.is_empty() {
            return true;
        }
        self.canonical_values.iter().any(|allowed| {
            if self.case_exact {
                allowed == value
            } else {
                allowed.eq_ignore_ascii_case(value)
            }
        })
    }
}

/// SCIM attribute data types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    #[default]
    String,
    Boolean,
    Decimal,
    Integer,
    /// RFC 3339 timestamp
    DateTime,
    /// Base64 encoded octets
    Binary,
    /// URI reference
    Reference,
    Complex,
    /// Opaque JSON value, stored as-is
    Any,
}

impl AttributeType {
    /// Parse a schema `type` value. Unknown types are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        let parsed = match value.to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "boolean" => Self::Boolean,
            "decimal" => Self::Decimal,
            "integer" => Self::Integer,
            "datetime" => Self::DateTime,
            "binary" => Self::Binary,
            "reference" => Self::Reference,
            "complex" => Self::Complex,
            "any" => Self::Any,
            _ => return None,
        };
        Some(parsed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Decimal => "decimal",
            Self::Integer => "integer",
            Self::DateTime => "dateTime",
            Self::Binary => "binary",
            Self::Reference => "reference",
            Self::Complex => "complex",
            Self::Any => "any",
        }
    }

    /// String-like types, which support the `co`/`sw`/`ew` operators.
    pub fn is_textual(&self) -> bool {
        matches!(self, Self::String | Self::Reference | Self::Binary)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Self::Decimal | Self::Integer)
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attribute mutability characteristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Mutability {
    /// Managed by the service provider
    ReadOnly,
    #[default]
    ReadWrite,
    /// Set once, never modified
    Immutable,
    /// Accepted in requests, never returned
    WriteOnly,
}

impl Mutability {
    /// Parse a schema value; unknown values fall back to `readWrite`.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "readonly" => Self::ReadOnly,
            "immutable" => Self::Immutable,
            "writeonly" => Self::WriteOnly,
            _ => Self::ReadWrite,
        }
    }
}

/// When an attribute is included in responses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Returned {
    Always,
    Never,
    #[default]
    Default,
    /// Only when named in `attributes`
    Request,
}

impl Returned {
    /// Parse a schema value; unknown values fall back to `default`.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "always" => Self::Always,
            "never" => Self::Never,
            "request" => Self::Request,
            _ => Self::Default,
        }
    }
}

/// Attribute uniqueness constraints.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum Uniqueness {
    #[default]
    None,
    Server,
    Global,
}

impl Uniqueness {
    /// Parse a schema value; unknown values fall back to `none`.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "server" => Self::Server,
            "global" => Self::Global,
            _ => Self::None,
        }
    }
}
