//! Pagination types for the directory read path.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::DomainError;

/// Ordering applied to the creation date
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(DomainError::validation(format!(
                "Invalid sort direction '{}', expected 'asc' or 'desc'",
                other
            ))),
        }
    }
}

/// Directory page request. `name` empty means no filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub name: String,
    pub page: u64,
    pub limit: u64,
    pub sort: SortDirection,
}

impl PageQuery {
    /// Build a query, replacing out-of-range values: a page below 1 becomes
    /// the first page, a limit outside 1..=100 becomes the default size.
    pub fn new(name: impl Into<String>, page: i64, limit: i64, sort: SortDirection) -> Self {
        let page = if page < 1 {
            DEFAULT_PAGE_NUMBER
        } else {
            page as u64
        };
        let limit = if limit < 1 || limit as u64 > MAX_PAGE_SIZE {
            DEFAULT_PAGE_SIZE
        } else {
            limit as u64
        };

        Self {
            name: name.into().trim().to_string(),
            page,
            limit,
            sort,
        }
    }

    /// True when no name/email filter applies
    pub fn is_unfiltered(&self) -> bool {
        self.name.is_empty()
    }

    /// Rows to skip before this page, `None` when it overflows
    pub fn offset(&self) -> Option<u64> {
        self.page.saturating_sub(1).checked_mul(self.limit)
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new("", DEFAULT_PAGE_NUMBER as i64, DEFAULT_PAGE_SIZE as i64, SortDirection::Asc)
    }
}

/// One page of results plus the totals needed to navigate the rest
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
    pub data: Vec<T>,
}

impl<T> Paginated<T> {
    /// Create a page; `total_pages` is the ceiling of `total / limit`
    pub fn new(data: Vec<T>, page: u64, limit: u64, total: u64) -> Self {
        let total_pages = if limit > 0 {
            let mut pages = total / limit;
            if total % limit != 0 {
                pages += 1;
            }
            pages
        } else {
            0
        };

        Self {
            total,
            page,
            limit,
            total_pages,
            data,
        }
    }

    /// Convert the items, keeping the totals
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Paginated<U> {
        Paginated {
            total: self.total,
            page: self.page,
            limit: self.limit,
            total_pages: self.total_pages,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_pages_rounds_up() {
        assert_eq!(Paginated::<u8>::new(vec![], 1, 10, 25).total_pages, 3);
        assert_eq!(Paginated::<u8>::new(vec![], 1, 10, 30).total_pages, 3);
        assert_eq!(Paginated::<u8>::new(vec![], 1, 10, 0).total_pages, 0);
        assert_eq!(Paginated::<u8>::new(vec![], 1, 0, 5).total_pages, 0);
    }

    #[test]
    fn test_query_normalization() {
        let query = PageQuery::new("  ada ", 0, 500, SortDirection::Desc);
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, DEFAULT_PAGE_SIZE);
        assert_eq!(query.name, "ada");

        let query = PageQuery::new("", 3, 10, SortDirection::Asc);
        assert_eq!(query.page, 3);
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset(), Some(20));
        assert!(query.is_unfiltered());

        assert_eq!(PageQuery::new("", 1, -4, SortDirection::Asc).limit, DEFAULT_PAGE_SIZE);
        assert_eq!(PageQuery::new("", 1, 100, SortDirection::Asc).limit, 100);
    }

    #[test]
    fn test_offset_of_huge_page() {
        let query = PageQuery::new("", i64::MAX, 10, SortDirection::Asc);
        assert_eq!(query.page, i64::MAX as u64);
        assert_eq!(query.offset(), None);

        let query = PageQuery::new("", i64::MAX, 1, SortDirection::Asc);
        assert_eq!(query.offset(), Some(i64::MAX as u64 - 1));
    }

    #[test]
    fn test_sort_direction_parsing() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Asc);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Desc);
        assert!("sideways".parse::<SortDirection>().is_err());
    }

    #[test]
    fn test_serialized_field_names() {
        let page = Paginated::new(vec![1, 2], 2, 2, 5);
        let json = serde_json::to_value(&page).unwrap();

        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["total"], 5);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
    }
}
