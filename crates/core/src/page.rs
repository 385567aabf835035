//! Paging and sorting primitives shared by list views.
//!
//! The remote API rejects out-of-range paging parameters with `400`, so the
//! same bounds are enforced here before a request is ever built.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Validated paging window (1-based page number).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> DomainResult<Self> {
        if page < 1 {
            return Err(DomainError::validation(
                "invalid page: must be a positive integer",
            ));
        }
        if page_size < 1 || page_size > MAX_PAGE_SIZE {
            return Err(DomainError::validation(format!(
                "invalid page size: must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok(Self { page, page_size })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Request for the following page (saturates at `u32::MAX`).
    pub fn next(&self) -> Self {
        Self {
            page: self.page.saturating_add(1),
            page_size: self.page_size,
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Sort direction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl core::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(DomainError::validation(
                "invalid sort order: must be `asc` or `desc`",
            )),
        }
    }
}

/// One page of results as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
    pub total_count: u64,
}

impl<T> Page<T> {
    /// Whether no page follows this one.
    pub fn is_last(&self) -> bool {
        self.page >= self.total_pages
    }
}
