//! Query builder utilities for ScimQuery

use crate::operation_handler::core::ScimQuery;

impl ScimQuery {
    /// Create a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set pagination parameters.
    pub fn with_pagination(mut self, start_index: usize, count: usize) -> Self {
        self.start_index = Some(start_index);
        self.count = Some(count);
        self
    }

    /// Set filter expression.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Set the sort attribute and order (`ascending` / `descending`).
    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: impl Into<String>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = Some(sort_order.into());
        self
    }

    /// Set attributes to include.
    pub fn with_attributes<S: Into<String>>(mut self, attributes: impl IntoIterator<Item = S>) -> Self {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    /// Set attributes to exclude.
    pub fn with_excluded_attributes<S: Into<String>>(
        mut self,
        excluded_attributes: impl IntoIterator<Item = S>,
    ) -> Self {
        self.excluded_attributes = excluded_attributes.into_iter().map(Into::into).collect();
        self
    }
}
