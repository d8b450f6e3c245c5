use std::ops::Range;

use serde::Serialize;

/// Incrementally growing slice of the product catalogue. Page `n` shows the
/// first `n * per_page` products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProductWindow {
    pub page: usize,
    pub per_page: usize,
    pub visible: usize,
    pub total: usize,
    pub has_more: bool,
}

impl ProductWindow {
    pub fn new(total: usize, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let visible = page.saturating_mul(per_page).min(total);
        Self {
            page,
            per_page,
            visible,
            total,
            has_more: visible < total,
        }
    }

    pub fn range(&self) -> Range<usize> {
        0..self.visible
    }

    /// Window after a "load more" request; `None` once everything is shown.
    pub fn next(&self) -> Option<Self> {
        self.has_more
            .then(|| Self::new(self.total, self.page + 1, self.per_page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page_is_capped_by_per_page() {
        let window = ProductWindow::new(120, 1, 50);
        assert_eq!(window.range(), 0..50);
        assert!(window.has_more);
    }

    #[test]
    fn load_more_grows_until_exhausted() {
        let second = ProductWindow::new(120, 1, 50).next().expect("second page");
        assert_eq!(second.visible, 100);
        let third = second.next().expect("third page");
        assert_eq!(third.visible, 120);
        assert!(!third.has_more);
        assert_eq!(third.next(), None);
    }

    #[test]
    fn page_zero_is_treated_as_first() {
        assert_eq!(ProductWindow::new(10, 0, 50).visible, 10);
    }
}
