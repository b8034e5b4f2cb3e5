//! Operation handler modules
//!
//! This module contains all the specific operation handlers organized by functionality:
//! - CRUD operations (create, get, replace, patch, delete)
//! - Query operations (list)
//! - Discovery operations (schemas, resource types, service provider config)
//! - Bulk requests

pub mod bulk;
pub mod crud;
pub mod query;
pub mod schema;

// Handler functions are accessed directly by the core dispatcher
// No re-exports needed since they're called via super::handlers::module::function
