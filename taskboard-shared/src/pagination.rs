//! Limit/offset paging for list operations

/// Page size used when the caller asks for nothing or too much
pub const DEFAULT_LIMIT: i64 = 50;

/// Largest page a caller may request
pub const MAX_LIMIT: i64 = 100;

/// Normalized page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    /// Normalizes caller input
    ///
    /// A limit outside `1..=100` becomes 50; a negative offset becomes 0.
    pub fn clamp(limit: i64, offset: i64) -> Self {
        let limit = if limit <= 0 || limit > MAX_LIMIT {
            DEFAULT_LIMIT
        } else {
            limit
        };

        Self {
            limit,
            offset: offset.max(0),
        }
    }

    /// Normalizes optional query parameters
    pub fn from_query(limit: Option<i64>, offset: Option<i64>) -> Self {
        Self::clamp(limit.unwrap_or(0), offset.unwrap_or(0))
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIMIT,
            offset: 0,
        }
    }
}
