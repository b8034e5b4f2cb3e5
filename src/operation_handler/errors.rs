//! Error handling utilities for operation handlers
//!
//! Every [`ScimError`] is rendered as an RFC 7644 §3.12 error response with
//! the status and `scimType` it maps to.

use crate::{
    ScimError,
    operation_handler::core::{OperationMetadata, ScimOperationResponse},
    resource::version::HttpVersion,
};
use serde_json::Value;

/// Create an error response from a ScimError.
pub fn create_error_response(error: ScimError, request_id: String) -> ScimOperationResponse {
    let status = error.status();
    if status >= 500 {
        log::error!("Request '{}' failed internally: {}", request_id, error);
    }

    let body = error.to_error_body();
    let detail = body
        .get("detail")
        .and_then(Value::as_str)
        .map(str::to_string);

    let mut metadata = OperationMetadata::for_request(request_id);
    match &error {
        ScimError::ResourceNotFound { resource_type, id } => {
            metadata.resource_type = Some(resource_type.clone());
            metadata.resource_id = Some(id.clone());
        }
        ScimError::VersionMismatch(conflict) => {
            metadata.etag = Some(HttpVersion::from(conflict.current.clone()).to_string());
        }
        _ => {}
    }

    ScimOperationResponse {
        success: false,
        status,
        data: Some(body),
        error: detail,
        error_code: error.scim_type().map(|scim_type| scim_type.as_str().to_string()),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::version::{RawVersion, VersionConflict};

    #[test]
    fn test_not_found_response() {
        let response = create_error_response(
            ScimError::resource_not_found("User", "42"),
            "req-1".to_string(),
        );
        assert!(!response.success);
        assert_eq!(response.status, 404);
        assert_eq!(response.data.as_ref().unwrap()["status"], "404");
        assert_eq!(response.metadata.resource_id.as_deref(), Some("42"));
        assert!(response.error_code.is_none());
    }

    #[test]
    fn test_version_conflict_carries_current_etag() {
        let conflict = VersionConflict::standard_message(
            RawVersion::from_hash("old"),
            RawVersion::from_hash("new"),
        );
        let response = create_error_response(conflict.into(), "req-2".to_string());
        assert_eq!(response.status, 412);
        assert_eq!(response.metadata.etag.as_deref(), Some("W/\"new\""));
    }

    #[test]
    fn test_internal_detail_is_generic() {
        let response = create_error_response(
            ScimError::internal("database password is hunter2"),
            "req-3".to_string(),
        );
        assert_eq!(response.status, 500);
        assert_eq!(response.error.as_deref(), Some("An internal error occurred"));
    }

    #[test]
    fn test_scim_type_exposed() {
        let response = create_error_response(ScimError::no_target("emails"), "req-4".to_string());
        assert_eq!(response.error_code.as_deref(), Some("noTarget"));
    }
}
