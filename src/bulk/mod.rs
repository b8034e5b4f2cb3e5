//! Bulk request processing (RFC 7644 §3.7).
//!
//! [`BulkRequest`] is the parsed message; [`BulkOrchestrator`] runs its
//! operations one after another through the regular dispatcher, resolving
//! `bulkId` references and enforcing the `failOnErrors` budget.

pub mod orchestrator;
pub mod request;

pub use orchestrator::BulkOrchestrator;
pub use request::{
    BULK_REQUEST_URI, BULK_RESPONSE_URI, BulkMethod, BulkOperation, BulkOperationResult,
    BulkRequest, BulkResponse,
};
