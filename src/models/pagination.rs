// Shared pagination and sort types for list queries

use serde::{Deserialize, Serialize};

fn default_page() -> i64 {
    1
}
fn default_per_page() -> i64 {
    20
}

/// Pagination parameters
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,

    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl Pagination {
    pub fn new(page: i64, per_page: i64) -> Self {
        Self { page, per_page }
    }

    pub fn offset(&self) -> i64 {
        // Saturate rather than overflow on absurd page numbers.
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }

    pub fn limit(&self) -> i64 {
        self.per_page.clamp(1, 100) // Max 100 per page
    }
}

/// Sort direction for list queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl Default for SortDirection {
    fn default() -> Self {
        SortDirection::Desc
    }
}

/// A page of results with total bookkeeping
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: &Pagination) -> Self {
        let per_page = pagination.limit();
        let total_pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };

        Self {
            items,
            total,
            page: pagination.page.max(1),
            per_page,
            total_pages,
        }
    }
}
