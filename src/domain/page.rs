//! Page - Server-Driven Pagination Types

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_PAGE;

/// One page of a remote listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub total: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            total: 0,
        }
    }
}

/// Sort/pagination cursor of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub sort_by: String,
    pub descending: bool,
    /// 1-based
    pub page: u32,
    pub rows_per_page: u32,
}

impl Pagination {
    pub fn new(sort_by: impl Into<String>, rows_per_page: u32) -> Self {
        Self {
            sort_by: sort_by.into(),
            descending: true,
            page: DEFAULT_PAGE,
            rows_per_page: rows_per_page.max(1),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.rows_per_page)
    }

    /// Number of pages needed for `total` rows; never less than one.
    pub fn total_pages(&self, total: u64) -> u32 {
        let per_page = u64::from(self.rows_per_page.max(1));
        let pages = total.div_ceil(per_page).max(1);
        u32::try_from(pages).unwrap_or(u32::MAX)
    }
}

/// Query sent to a listing endpoint, built from the table's state at fetch time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    pub pagination: Pagination,
    pub search: Option<String>,
    /// Extra filters such as `owner_data_id`
    pub filters: Vec<(String, String)>,
}

impl ListQuery {
    /// Query string pairs in the order the server's filter parser expects.
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let p = &self.pagination;
        let mut pairs = vec![
            ("limit".to_string(), p.rows_per_page.to_string()),
            ("offset".to_string(), p.offset().to_string()),
            ("sortby".to_string(), p.sort_by.clone()),
            (
                "direction".to_string(),
                if p.descending { "desc" } else { "asc" }.to_string(),
            ),
        ];
        if let Some(search) = self.search.as_deref().filter(|s| !s.is_empty()) {
            pairs.push(("search".to_string(), search.to_string()));
        }
        pairs.extend(self.filters.iter().cloned());
        pairs
    }
}
