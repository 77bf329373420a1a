//! List query parameters.

use salvo::prelude::*;
use serde::Deserialize;

use nexus_app::pagination::{PageRequest, SortOrder};

use crate::extensions::*;

/// Shared list parameters: `page`, `pageSize`, `sortBy`, `sortOrder`, `search`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ListQuery {
    /// One-based page number
    pub page: Option<i64>,

    /// Items per page (1 to 100)
    pub page_size: Option<i64>,

    /// Resource-specific sort key
    pub sort_by: Option<String>,

    /// `asc` or `desc`
    pub sort_order: Option<String>,

    /// Free-text filter
    pub search: Option<String>,
}

impl ListQuery {
    /// Parse the list parameters from the request's query string.
    pub(crate) fn from_request(req: &mut Request) -> Result<Self, StatusError> {
        req.parse_queries::<Self>()
            .or_400("Invalid list parameters")
    }

    pub(crate) fn page_request(self) -> Result<PageRequest, StatusError> {
        let sort_order = self
            .sort_order
            .as_deref()
            .map(str::parse::<SortOrder>)
            .transpose()
            .or_400("Invalid sortOrder")?;

        Ok(PageRequest::new(self.page, self.page_size)
            .with_sort(self.sort_by, sort_order)
            .with_search(self.search))
    }
}
