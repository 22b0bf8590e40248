//! Page arithmetic for meal browsing

use std::ops::Range;

/// Position of one page within a result list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based, clamped to `1..=total_pages` (1 when there are no results)
    pub page: usize,
    pub total_pages: usize,
    /// Index of the first result on the page
    pub offset: usize,
    /// One past the last result on the page
    pub end: usize,
}

impl Pagination {
    /// Result indices on this page
    pub fn range(&self) -> Range<usize> {
        self.offset..self.end
    }
}

/// Locate `requested_page` among `total_results` split into pages of `page_size`
///
/// Out-of-range pages are clamped; a `page_size` of 0 counts as 1.
///
/// ```
/// use mealbox_sf::pagination::calculate_pagination;
///
/// // 25 meals at 9 per page: 9 + 9 + 7
/// let p = calculate_pagination(25, 3, 9);
/// assert_eq!(p.total_pages, 3);
/// assert_eq!(p.range(), 18..25);
///
/// let p = calculate_pagination(25, 99, 9);
/// assert_eq!(p.page, 3);
/// ```
pub fn calculate_pagination(total_results: usize, requested_page: usize, page_size: usize) -> Pagination {
    let page_size = page_size.max(1);
    let total_pages = total_results.div_ceil(page_size);
    let page = requested_page.clamp(1, total_pages.max(1));
    let offset = (page - 1) * page_size;

    Pagination {
        page,
        total_pages,
        offset,
        end: (offset + page_size).min(total_results),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_page_of_two() {
        let p = calculate_pagination(10, 1, 9);
        assert_eq!((p.page, p.total_pages), (1, 2));
        assert_eq!(p.range(), 0..9);
    }

    #[test]
    fn test_page_zero_means_first() {
        assert_eq!(calculate_pagination(10, 0, 9).page, 1);
    }

    #[test]
    fn test_no_results() {
        let p = calculate_pagination(0, 3, 9);
        assert_eq!(p.page, 1);
        assert_eq!(p.total_pages, 0);
        assert!(p.range().is_empty());
    }

    #[test]
    fn test_last_page_is_short() {
        let p = calculate_pagination(10, 2, 9);
        assert_eq!(p.range(), 9..10);

        let p = calculate_pagination(18, 2, 9);
        assert_eq!(p.range(), 9..18);
    }

    #[test]
    fn test_zero_page_size_counts_as_one() {
        let p = calculate_pagination(3, 2, 0);
        assert_eq!(p.total_pages, 3);
        assert_eq!(p.range(), 1..2);
    }
}
