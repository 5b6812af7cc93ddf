//! Fixed-size page windows over the ordered view.

use serde::Serialize;

/// Where a page sits in the filtered set. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub page: usize,
    pub total_pages: usize,
    pub page_size: usize,
    /// Index of the page's first item in the filtered set
    pub start: usize,
    /// One past the page's last item
    pub end: usize,
}

impl PageInfo {
    /// `total_pages` is at least 1 (an empty set still has one empty page) and
    /// `page` is clamped into `1..=total_pages`. A page size of 0 counts as 1.
    pub fn compute(item_count: usize, page_size: usize, page: usize) -> Self {
        let page_size = page_size.max(1);
        let total_pages = item_count.div_ceil(page_size).max(1);
        let page = page.clamp(1, total_pages);
        let start = ((page - 1) * page_size).min(item_count);
        let end = (start + page_size).min(item_count);
        Self {
            page,
            total_pages,
            page_size,
            start,
            end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Slice one page out of `items`.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> (&[T], PageInfo) {
    let info = PageInfo::compute(items.len(), page_size, page);
    (&items[info.start..info.end], info)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_set_has_one_page() {
        let (page, info) = paginate::<u8>(&[], 100, 1);
        assert!(page.is_empty());
        assert_eq!(info.total_pages, 1);
        assert_eq!(info.page, 1);
        assert!(!info.has_next() && !info.has_previous());
    }

    #[test]
    fn page_is_clamped_down() {
        let items: Vec<u32> = (0..25).collect();
        let (page, info) = paginate(&items, 10, 7);
        assert_eq!(info.page, 3);
        assert_eq!(page, &[20, 21, 22, 23, 24]);
        assert!(info.has_previous());
    }

    #[test]
    fn page_zero_means_first() {
        let items = [1, 2, 3];
        let (page, info) = paginate(&items, 2, 0);
        assert_eq!(info.page, 1);
        assert_eq!(page, &[1, 2]);
    }

    proptest! {
        #[test]
        fn pages_reconstruct_the_set(len in 0usize..500, size in 1usize..60) {
            let items: Vec<usize> = (0..len).collect();
            let total = PageInfo::compute(len, size, 1).total_pages;
            let mut joined = Vec::new();
            for p in 1..=total {
                let (page, info) = paginate(&items, size, p);
                prop_assert_eq!(info.page, p);
                prop_assert!(page.len() <= size);
                joined.extend_from_slice(page);
            }
            prop_assert_eq!(joined, items);
        }
    }
}
