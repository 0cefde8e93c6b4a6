//! Offset/limit pagination metadata

use serde::{Deserialize, Serialize};

use crate::error::{ImsgError, Result};

/// Default page size when the caller does not supply one
pub const DEFAULT_LIMIT: usize = 100;

/// Largest page size the transport layer lets through
pub const MAX_LIMIT: usize = 200;

/// Pagination metadata attached to every paginated response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
    pub page: usize,
    pub total_pages: usize,
}

impl PaginationMetadata {
    /// Derive page metadata from a total count and the requested window.
    ///
    /// `limit` must be at least 1; a zero limit is treated as 1 rather than
    /// dividing by zero.
    pub fn new(total: usize, limit: usize, offset: usize) -> Self {
        let divisor = limit.max(1);
        Self {
            total,
            limit,
            offset,
            has_more: offset.saturating_add(limit) < total,
            page: offset / divisor + 1,
            total_pages: total.div_ceil(divisor),
        }
    }
}

/// A page of results plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedResult<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMetadata,
}

impl<T> PaginatedResult<T> {
    pub fn new(data: Vec<T>, total: usize, page: PageRequest) -> Self {
        Self {
            data,
            pagination: PaginationMetadata::new(total, page.limit, page.offset),
        }
    }

    /// Slice an already fully materialized list into one page
    pub fn from_full_list(all: Vec<T>, page: PageRequest) -> Self {
        let total = all.len();
        let data = all
            .into_iter()
            .skip(page.offset)
            .take(page.limit)
            .collect();
        Self::new(data, total, page)
    }
}

/// A validated limit/offset window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRequest {
    pub limit: usize,
    pub offset: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

impl PageRequest {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self {
            limit: limit.max(1),
            offset,
        }
    }

    /// Build a window from raw caller arguments.
    ///
    /// A missing limit becomes `default_limit`, any limit is clamped into
    /// `1..=max_limit`, and a negative offset is rejected.
    pub fn from_args(
        limit: Option<i64>,
        offset: Option<i64>,
        default_limit: usize,
        max_limit: usize,
    ) -> Result<Self> {
        let max_limit = max_limit.max(1);
        let limit = match limit {
            Some(l) if l < 1 => 1,
            Some(l) => usize::try_from(l).unwrap_or(max_limit).min(max_limit),
            None => default_limit.clamp(1, max_limit),
        };
        let offset = match offset {
            Some(o) if o < 0 => {
                return Err(ImsgError::InvalidInput(format!(
                    "offset must be non-negative, got {}",
                    o
                )))
            }
            Some(o) => o as usize,
            None => 0,
        };
        Ok(Self { limit, offset })
    }

    pub(crate) fn sql_limit(&self) -> i64 {
        i64::try_from(self.limit).unwrap_or(i64::MAX)
    }

    pub(crate) fn sql_offset(&self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }
}
