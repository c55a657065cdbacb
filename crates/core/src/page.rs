//! Offset pagination shared by every list operation.

use serde::Deserialize;

/// Offset/limit window for list queries.
///
/// `limit` is clamped to `1..=MAX_LIMIT` by [`Page::normalized`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Page {
    pub skip: u32,
    pub limit: u32,
}

impl Page {
    pub const DEFAULT_LIMIT: u32 = 100;
    pub const MAX_LIMIT: u32 = 500;

    pub fn new(skip: u32, limit: u32) -> Self {
        Self { skip, limit }.normalized()
    }

    pub fn normalized(self) -> Self {
        Self {
            skip: self.skip,
            limit: self.limit.clamp(1, Self::MAX_LIMIT),
        }
    }

    /// Apply the window to an already ordered iterator.
    pub fn apply<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let page = self.normalized();
        items
            .into_iter()
            .skip(page.skip as usize)
            .take(page.limit as usize)
            .collect()
    }
}

impl Default for Page {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_is_clamped() {
        assert_eq!(Page::new(0, 0).limit, 1);
        assert_eq!(Page::new(0, 10_000).limit, Page::MAX_LIMIT);
    }

    #[test]
    fn apply_skips_then_takes() {
        let out = Page::new(2, 3).apply(0..10);
        assert_eq!(out, vec![2, 3, 4]);
    }
}
