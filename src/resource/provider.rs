//! The resource handler trait embedders implement for persistence.
//!
//! The engine validates, filters and patches; the handler only stores and
//! retrieves [`Document`]s. One handler serves every registered resource type
//! and receives the [`ResourceType`] with each call.
//!
//! ```rust,no_run
//! use scim_engine::resource::{Document, ListQuery, ListResult, RequestContext, ResourceHandler};
//! use scim_engine::schema::ResourceType;
//! use scim_engine::ScimError;
//! use std::collections::HashMap;
//! use std::future::Future;
//! use tokio::sync::RwLock;
//!
//! #[derive(Default)]
//! struct MemoryHandler {
//!     resources: RwLock<HashMap<(String, String), Document>>,
//! }
//!
//! impl ResourceHandler for MemoryHandler {
//!     type Error = ScimError;
//!
//!     fn create(
//!         &self,
//!         resource_type: &ResourceType,
//!         mut document: Document,
//!         _context: &RequestContext,
//!     ) -> impl Future<Output = Result<Document, Self::Error>> + Send {
//!         async move {
//!             let id = uuid::Uuid::new_v4().to_string();
//!             document.set_id(resource_type, &id);
//!             let key = (resource_type.name.clone(), id);
//!             self.resources.write().await.insert(key, document.clone());
//!             Ok(document)
//!         }
//!     }
//!     # fn get(&self, _: &ResourceType, _: &str, _: &RequestContext) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send { async { Ok(None) } }
//!     # fn list(&self, _: &ResourceType, _: &ListQuery, _: &RequestContext) -> impl Future<Output = Result<ListResult, Self::Error>> + Send { async { Ok(ListResult::default()) } }
//!     # fn update(&self, _: &ResourceType, _: &str, d: Document, _: &RequestContext) -> impl Future<Output = Result<Document, Self::Error>> + Send { async { Ok(d) } }
//!     # fn delete(&self, _: &ResourceType, _: &str, _: &RequestContext) -> impl Future<Output = Result<(), Self::Error>> + Send { async { Ok(()) } }
//! }
//! ```

use super::context::{ListQuery, ListResult, RequestContext};
use super::document::Document;
use crate::error::ScimError;
use crate::schema::ResourceType;
use std::future::Future;

/// Storage operations for SCIM resources.
///
/// Handlers raise typed failures through their error type; anything that
/// converts into [`ScimError`] works, and [`ScimError`] itself is the usual
/// choice (`ScimError::resource_not_found`, `ScimError::uniqueness`, ...).
pub trait ResourceHandler: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static + Into<ScimError>;

    /// Persist a validated new resource and return it with its `id` set.
    fn create(
        &self,
        resource_type: &ResourceType,
        document: Document,
        context: &RequestContext,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send;

    /// Fetch a resource; `Ok(None)` when it does not exist.
    fn get(
        &self,
        resource_type: &ResourceType,
        id: &str,
        context: &RequestContext,
    ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send;

    /// List resources. See [`ListResult`] for who paginates.
    fn list(
        &self,
        resource_type: &ResourceType,
        query: &ListQuery,
        context: &RequestContext,
    ) -> impl Future<Output = Result<ListResult, Self::Error>> + Send;

    /// Store the full new state of an existing resource.
    fn update(
        &self,
        resource_type: &ResourceType,
        id: &str,
        document: Document,
        context: &RequestContext,
    ) -> impl Future<Output = Result<Document, Self::Error>> + Send;

    /// Delete a resource; missing resources should raise not-found.
    fn delete(
        &self,
        resource_type: &ResourceType,
        id: &str,
        context: &RequestContext,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;
}
