//! SCIM filter expressions (RFC 7644 §3.4.2.2).
//!
//! ```rust
//! use scim_engine::filter::parse_filter;
//! use scim_engine::schema::{OperationContext, SchemaRegistry};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::with_embedded_schemas()?;
//! let users = registry.get_resource_type("User").unwrap();
//!
//! let filter = parse_filter(r#"emails[type eq "work" and value co "@example.com"]"#, users)?;
//! let user = users.validate(
//!     &json!({
//!         "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!         "userName": "bjensen",
//!         "emails": [{"type": "work", "value": "bjensen@example.com"}]
//!     }),
//!     OperationContext::Create,
//! )?;
//! assert!(filter.matches(&user));
//! # Ok(())
//! # }
//! ```

pub mod ast;
mod evaluate;
mod lexer;
pub mod parser;


pub use ast::{AttributePath, CompareValue, Comparator, FilterNode};
pub use parser::{PathExpression, parse_filter, parse_path};
