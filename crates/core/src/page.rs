//! Offset pagination shared by list operations.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// 1-based page request. Out-of-range values are clamped, never rejected.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }.clamped(MAX_PAGE_SIZE)
    }

    /// Clamp `page` to at least 1 and `page_size` to `1..=max`.
    pub fn clamped(self, max: u32) -> Self {
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max.max(1)),
        }
    }

    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize) * self.page_size as usize
    }

    /// Slice an already ordered result set into a [`Page`].
    pub fn paginate<T>(&self, items: Vec<T>) -> Page<T> {
        let total = items.len();
        let items = items
            .into_iter()
            .skip(self.offset())
            .take(self.page_size as usize)
            .collect();
        Page {
            items,
            total,
            page: self.page,
            page_size: self.page_size,
            pages: total.div_ceil(self.page_size as usize),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            pages: self.pages,
        }
    }
}

/// Skip/limit window used by the finance and invoicing list operations.
pub fn window<T>(items: Vec<T>, skip: usize, limit: Option<usize>) -> Vec<T> {
    let iter = items.into_iter().skip(skip);
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn page_size_is_clamped_to_maximum() {
        let req = PageRequest::new(0, 500);
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, MAX_PAGE_SIZE);
    }

    #[test]
    fn paginate_reports_totals() {
        let page = PageRequest::new(2, 20).paginate((0..45).collect::<Vec<_>>());
        assert_eq!(page.total, 45);
        assert_eq!(page.pages, 3);
        assert_eq!(page.items.first(), Some(&20));
        assert_eq!(page.items.len(), 20);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let page = PageRequest::default().paginate(Vec::<u8>::new());
        assert_eq!(page.pages, 0);
        assert!(page.items.is_empty());
    }

    proptest! {
        #![proptest_config(ProptestConfig { cases: 256, .. ProptestConfig::default() })]

        #[test]
        fn pages_cover_every_item_exactly_once(len in 0usize..300, size in 1u32..=100) {
            let items: Vec<usize> = (0..len).collect();
            let first = PageRequest::new(1, size).paginate(items.clone());
            let mut seen = Vec::new();
            for page in 1..=first.pages.max(1) {
                seen.extend(PageRequest::new(page as u32, size).paginate(items.clone()).items);
            }
            prop_assert_eq!(seen, items);
        }
    }
}
