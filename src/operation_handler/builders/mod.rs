//! Builder methods for [`ScimOperationRequest`](super::ScimOperationRequest)
//! and [`ScimQuery`](super::ScimQuery).

mod query;
mod request;

pub(crate) use request::split_path;
