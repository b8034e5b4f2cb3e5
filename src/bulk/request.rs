//! Bulk request and response messages (RFC 7644 §3.7).

use crate::error::{ScimError, ScimResult};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;

pub const BULK_REQUEST_URI: &str = "urn:ietf:params:scim:api:messages:2.0:BulkRequest";
pub const BULK_RESPONSE_URI: &str = "urn:ietf:params:scim:api:messages:2.0:BulkResponse";

/// A parsed bulk request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    #[serde(default)]
    pub schemas: Vec<String>,
    /// Number of failures tolerated before the remaining operations are
    /// skipped. Absent means unlimited.
    #[serde(default)]
    pub fail_on_errors: Option<i64>,
    #[serde(rename = "Operations", alias = "operations", default)]
    pub operations: Vec<BulkOperation>,
}

/// One operation of a bulk request.
///
/// `method` stays textual so an unknown method fails only its own operation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperation {
    pub method: String,
    #[serde(default)]
    pub bulk_id: Option<String>,
    pub path: String,
    #[serde(default)]
    pub data: Option<Value>,
    /// Applied as the `If-Match` value of the operation
    #[serde(default)]
    pub version: Option<String>,
}

impl BulkRequest {
    pub fn from_json(value: &Value) -> ScimResult<Self> {
        let request: Self = serde_json::from_value(value.clone())
            .map_err(|e| ScimError::invalid_syntax(format!("Malformed bulk request: {}", e)))?;
        if !request.schemas.iter().any(|s| s == BULK_REQUEST_URI) {
            return Err(ScimError::invalid_syntax(format!(
                "Bulk request must declare the schema '{}'",
                BULK_REQUEST_URI
            )));
        }
        Ok(request)
    }

    /// Effective `failOnErrors`; values below 1 count as 1.
    pub fn error_budget(&self) -> Option<usize> {
        self.fail_on_errors
            .map(|limit| usize::try_from(limit.max(1)).unwrap_or(usize::MAX))
    }
}

/// HTTP methods allowed inside a bulk request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkMethod {
    Post,
    Put,
    Patch,
    Delete,
}

impl BulkMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for BulkMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BulkMethod {
    type Err = ScimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            _ => Err(ScimError::invalid_syntax(format!(
                "'{}' is not a valid bulk operation method",
                s
            ))),
        }
    }
}

/// Outcome of one bulk operation, in request order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkOperationResult {
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bulk_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(serialize_with = "status_as_string")]
    pub status: u16,
    /// Error body of a failed operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
}

fn status_as_string<S: Serializer>(status: &u16, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&status.to_string())
}

impl BulkOperationResult {
    pub fn is_success(&self) -> bool {
        self.response.is_none()
    }
}

/// The bulk response message.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BulkResponse {
    pub operations: Vec<BulkOperationResult>,
}

impl BulkResponse {
    pub fn to_json(&self) -> Value {
        json!({
            "schemas": [BULK_RESPONSE_URI],
            "Operations": self.operations,
        })
    }
}
