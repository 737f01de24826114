//! Offset pagination envelope for list endpoints.

use serde::{Deserialize, Serialize};

const fn default_page() -> i64 {
    1
}

/// `?page=` query parameter (1-indexed).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: default_page(),
        }
    }
}

impl PageRequest {
    /// Requested page, never below 1.
    #[must_use]
    pub const fn page(self) -> i64 {
        if self.page < 1 { 1 } else { self.page }
    }

    /// SQL `OFFSET` for a page size, saturating at `i64::MAX`.
    #[must_use]
    pub const fn offset(self, per_page: i64) -> i64 {
        (self.page() - 1).saturating_mul(per_page)
    }
}

/// One page of results plus the numbers a pager needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub current_page: i64,
    pub last_page: i64,
    pub per_page: i64,
    pub total: i64,
    /// 1-based position of the first row, `None` on an empty page.
    pub from: Option<i64>,
    /// 1-based position of the last row, `None` on an empty page.
    pub to: Option<i64>,
}

impl<T> Page<T> {
    /// Build the envelope for `data` fetched at `request` with `per_page` rows.
    #[must_use]
    pub fn new(data: Vec<T>, request: PageRequest, per_page: i64, total: i64) -> Self {
        let current_page = request.page();
        let last_page = (total.saturating_add(per_page - 1) / per_page).max(1);
        let count = i64::try_from(data.len()).unwrap_or(i64::MAX);

        let (from, to) = if count == 0 {
            (None, None)
        } else {
            let first = request.offset(per_page).saturating_add(1);
            (Some(first), Some(first.saturating_add(count - 1)))
        };

        Self {
            data,
            current_page,
            last_page,
            per_page,
            total,
            from,
            to,
        }
    }

    /// Transform the rows while keeping the page numbers.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            current_page: self.current_page,
            last_page: self.last_page,
            per_page: self.per_page,
            total: self.total,
            from: self.from,
            to: self.to,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_clamps_to_first_page() {
        assert_eq!(PageRequest { page: 0 }.page(), 1);
        assert_eq!(PageRequest { page: -4 }.offset(10), 0);
        assert_eq!(PageRequest { page: 3 }.offset(15), 30);
    }

    #[test]
    fn test_huge_page_saturates() {
        let request = PageRequest { page: i64::MAX };
        assert_eq!(request.offset(15), i64::MAX);

        let page: Page<i32> = Page::new(vec![], request, 15, 40);
        assert_eq!(page.current_page, i64::MAX);
        assert_eq!(page.last_page, 3);

        let page = Page::new(vec![1], request, 15, 40);
        assert_eq!(page.from, Some(i64::MAX));
        assert_eq!(page.to, Some(i64::MAX));
    }

    #[test]
    fn test_page_numbers() {
        let page = Page::new(vec![11, 12, 13], PageRequest { page: 2 }, 10, 13);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.last_page, 2);
        assert_eq!(page.from, Some(11));
        assert_eq!(page.to, Some(13));
    }

    #[test]
    fn test_empty_page() {
        let page: Page<i32> = Page::new(vec![], PageRequest::default(), 15, 0);
        assert_eq!(page.last_page, 1);
        assert_eq!(page.from, None);
        assert_eq!(page.to, None);

        let json = serde_json::to_value(&page).unwrap();
        assert!(json["from"].is_null());
        assert_eq!(json["per_page"], 15);
    }

    #[test]
    fn test_page_past_the_end_is_empty() {
        let page: Page<i32> = Page::new(vec![], PageRequest { page: 9 }, 10, 25);
        assert_eq!(page.current_page, 9);
        assert_eq!(page.last_page, 3);
        assert!(page.data.is_empty());
    }

    #[test]
    fn test_map_keeps_numbers() {
        let page = Page::new(vec![1, 2], PageRequest::default(), 10, 2).map(|n| n * 10);
        assert_eq!(page.data, vec![10, 20]);
        assert_eq!(page.to, Some(2));
    }
}
