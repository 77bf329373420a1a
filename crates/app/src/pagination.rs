//! List pagination and sorting.

use std::str::FromStr;

use thiserror::Error;

/// Page size used when none (or zero) is requested.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page size a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Error)]
#[error("sort order must be `asc` or `desc`")]
pub struct InvalidSortOrder;

impl FromStr for SortOrder {
    type Err = InvalidSortOrder;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.eq_ignore_ascii_case("asc") {
            Ok(Self::Asc)
        } else if value.eq_ignore_ascii_case("desc") {
            Ok(Self::Desc)
        } else {
            Err(InvalidSortOrder)
        }
    }
}

/// Normalised list parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// One-based page number.
    pub page: u32,

    /// Rows per page, within `1..=MAX_PAGE_SIZE`.
    pub page_size: u32,

    /// Requested sort key; resolved against a per-resource whitelist.
    pub sort_by: Option<String>,

    /// Requested sort direction.
    pub sort_order: Option<SortOrder>,

    /// Resource-specific free-text filter.
    pub search: Option<String>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl PageRequest {
    /// Coerce raw values: pages below one become one, a missing, zero or
    /// negative page size becomes [`DEFAULT_PAGE_SIZE`], and oversized pages
    /// are clamped to [`MAX_PAGE_SIZE`].
    #[must_use]
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page
            .filter(|page| *page >= 1)
            .map_or(1, |page| u32::try_from(page).unwrap_or(u32::MAX));

        let page_size = match page_size {
            Some(size) if size > i64::from(MAX_PAGE_SIZE) => MAX_PAGE_SIZE,
            Some(size) if size >= 1 => u32::try_from(size).unwrap_or(MAX_PAGE_SIZE),
            _ => DEFAULT_PAGE_SIZE,
        };

        Self {
            page,
            page_size,
            sort_by: None,
            sort_order: None,
            search: None,
        }
    }

    #[must_use]
    pub fn with_sort(mut self, sort_by: Option<String>, sort_order: Option<SortOrder>) -> Self {
        self.sort_by = sort_by.filter(|value| !value.trim().is_empty());
        self.sort_order = sort_order;
        self
    }

    #[must_use]
    pub fn with_search(mut self, search: Option<String>) -> Self {
        self.search = search
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        self
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.page_size)
    }

    /// `ILIKE` pattern for the search term, if any.
    #[must_use]
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");

            format!("%{escaped}%")
        })
    }

    /// Resolve an `ORDER BY` clause from a whitelist of `(key, column)` pairs.
    ///
    /// Unknown keys fall back to `default`. The identifier column is always
    /// appended as a tie-break so pages are stable.
    #[must_use]
    pub fn order_by(
        &self,
        allowed: &[(&str, &'static str)],
        default: (&'static str, SortOrder),
        tie_break: &'static str,
    ) -> String {
        let (column, default_order) = self
            .sort_by
            .as_deref()
            .and_then(|key| {
                allowed
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(key))
                    .map(|(_, column)| (*column, SortOrder::Asc))
            })
            .unwrap_or(default);

        let order = self.sort_order.unwrap_or(default_order).as_sql();

        format!("{column} {order}, {tie_break} {order}")
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
}

impl<T> Page<T> {
    #[must_use]
    pub fn new(items: Vec<T>, request: &PageRequest, total: i64) -> Self {
        Self {
            items,
            page: request.page,
            page_size: request.page_size,
            total: u64::try_from(total).unwrap_or_default(),
        }
    }

    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_page_size_defaults_to_twenty() {
        let request = PageRequest::new(Some(1), Some(0));

        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 20);
    }

    #[test]
    fn oversized_page_size_is_clamped() {
        assert_eq!(PageRequest::new(None, Some(101)).page_size, 100);
        assert_eq!(PageRequest::new(None, Some(100)).page_size, 100);
        assert_eq!(PageRequest::new(None, Some(1)).page_size, 1);
    }

    #[test]
    fn missing_and_invalid_values_use_defaults() {
        let request = PageRequest::new(Some(0), Some(-5));

        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(PageRequest::default().page, 1);
    }

    #[test]
    fn offset_follows_page_and_size() {
        let request = PageRequest::new(Some(3), Some(25));

        assert_eq!(request.offset(), 50);
        assert_eq!(request.limit(), 25);
    }

    #[test]
    fn order_by_uses_whitelist_and_tie_break() {
        let allowed = [("name", "name"), ("createdAt", "created_at")];
        let default = ("created_at", SortOrder::Desc);

        let request = PageRequest::default().with_sort(Some("createdat".to_string()), None);
        assert_eq!(
            request.order_by(&allowed, default, "uuid"),
            "created_at ASC, uuid ASC"
        );

        let request = PageRequest::default()
            .with_sort(Some("name; DROP TABLE users".to_string()), Some(SortOrder::Asc));
        assert_eq!(
            request.order_by(&allowed, default, "uuid"),
            "created_at ASC, uuid ASC"
        );

        assert_eq!(
            PageRequest::default().order_by(&allowed, default, "uuid"),
            "created_at DESC, uuid DESC"
        );
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        let request = PageRequest::default().with_search(Some(" 50%_off ".to_string()));

        assert_eq!(request.search_pattern().as_deref(), Some("%50\\%\\_off%"));
        assert_eq!(
            PageRequest::default()
                .with_search(Some("  ".to_string()))
                .search_pattern(),
            None
        );
    }

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("DESC".parse::<SortOrder>().ok(), Some(SortOrder::Desc));
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
