//! Request context and list query structures.

use crate::filter::FilterNode;
use crate::resource::document::Document;
use crate::schema::SchemaAttribute;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Caller identity established by the transport.
///
/// The engine never inspects it; it is forwarded to resource handlers and
/// hooks so they can make access decisions.
pub trait Authorization: fmt::Debug + Send + Sync {
    fn client_id(&self) -> Option<&str>;

    fn roles(&self) -> &[String];

    fn has_role(&self, role: &str) -> bool {
        self.roles().iter().any(|r| r == role)
    }
}

/// Plain [`Authorization`] holding a client id and its roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientAuthorization {
    pub client_id: Option<String>,
    pub roles: Vec<String>,
}

impl ClientAuthorization {
    pub fn new(client_id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            roles,
        }
    }
}

impl Authorization for ClientAuthorization {
    fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    fn roles(&self) -> &[String] {
        &self.roles
    }
}

/// Per-request context passed to handlers and hooks.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Unique identifier for this request, used in log lines
    pub request_id: String,
    pub authorization: Option<Arc<dyn Authorization>>,
}

impl RequestContext {
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            authorization: None,
        }
    }

    /// Create a new request context with a generated request ID.
    pub fn with_generated_id() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn with_authorization(mut self, authorization: Arc<dyn Authorization>) -> Self {
        self.authorization = Some(authorization);
        self
    }

    pub fn client_id(&self) -> Option<&str> {
        self.authorization.as_deref().and_then(|a| a.client_id())
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.authorization
            .as_deref()
            .is_some_and(|a| a.has_role(role))
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::with_generated_id()
    }
}

/// Sort direction for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Parse `ascending` / `descending`, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "ascending" => Some(Self::Ascending),
            "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Parsed list query handed to [`ResourceHandler::list`].
///
/// Handlers of resource types with engine-side filtering can ignore
/// everything but pagination hints; the engine applies the filter and sort
/// to whatever the handler returns.
///
/// [`ResourceHandler::list`]: super::provider::ResourceHandler::list
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub filter: Option<FilterNode>,
    /// The filter as the client wrote it
    pub filter_text: Option<String>,
    pub sort_by: Option<Arc<SchemaAttribute>>,
    pub sort_order: SortOrder,
    /// 1-based index of the first result
    pub start_index: usize,
    pub count: Option<usize>,
}

impl ListQuery {
    pub fn new() -> Self {
        Self {
            start_index: 1,
            ..Self::default()
        }
    }

    pub fn with_filter(mut self, text: impl Into<String>, filter: FilterNode) -> Self {
        self.filter_text = Some(text.into());
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, attribute: Arc<SchemaAttribute>, order: SortOrder) -> Self {
        self.sort_by = Some(attribute);
        self.sort_order = order;
        self
    }

    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index.max(1);
        self
    }

    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }
}

/// Resources returned by a handler's list operation.
#[derive(Debug, Clone, Default)]
pub struct ListResult {
    pub resources: Vec<Document>,
    /// Set when the handler already filtered, sorted and paginated; the
    /// engine then passes the page through untouched.
    pub total_results: Option<usize>,
}

impl ListResult {
    /// The complete, unpaginated result set.
    pub fn complete(resources: Vec<Document>) -> Self {
        Self {
            resources,
            total_results: None,
        }
    }

    /// One page out of `total_results` matches.
    pub fn page(resources: Vec<Document>, total_results: usize) -> Self {
        Self {
            resources,
            total_results: Some(total_results),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = RequestContext::with_generated_id();
        let b = RequestContext::with_generated_id();
        assert_ne!(a.request_id, b.request_id);
        assert!(a.client_id().is_none());
    }

    #[test]
    fn test_authorization_forwarding() {
        let context = RequestContext::new("req-1").with_authorization(Arc::new(
            ClientAuthorization::new("provisioner", vec!["admin".to_string()]),
        ));
        assert_eq!(context.client_id(), Some("provisioner"));
        assert!(context.has_role("admin"));
        assert!(!context.has_role("auditor"));
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::parse("DESCENDING"), Some(SortOrder::Descending));
        assert_eq!(SortOrder::parse("sideways"), None);
    }

    #[test]
    fn test_start_index_clamped() {
        assert_eq!(ListQuery::new().with_start_index(0).start_index, 1);
    }
}
