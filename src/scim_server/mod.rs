//! The schema-driven SCIM server.
//!
//! # Module Organization
//!
//! * [`builder`] - Configuration and the [`ScimServerBuilder`]
//! * [`core`] - The [`ScimServer`] struct and the meta/ETag helpers it shares
//! * [`operations`] - Create, get, list, replace, patch and delete

pub mod builder;
pub mod core;
pub mod operations;


pub use builder::{BulkTransactionMode, ScimServerBuilder, ScimServerConfig};
pub use core::ScimServer;
pub use operations::ListPage;
