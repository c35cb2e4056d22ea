//! Shared query parameter types for API handlers.

use playlistfox_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use serde::Deserialize;

/// Generic pagination parameters (`?limit=&offset=`).
#[derive(Debug, Default, Deserialize)]
pub struct PaginationParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Limit clamped to `1..=MAX_PAGE_LIMIT`, as the Spotify API expects.
    pub fn limit(&self) -> u32 {
        clamp_limit(self.limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT) as u32
    }

    pub fn offset(&self) -> u32 {
        clamp_offset(self.offset).min(i64::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limits_are_clamped_for_spotify() {
        let params = PaginationParams {
            limit: Some(500),
            offset: Some(-4),
        };
        assert_eq!(params.limit(), 50);
        assert_eq!(params.offset(), 0);
        assert_eq!(PaginationParams::default().limit(), 20);
    }
}
