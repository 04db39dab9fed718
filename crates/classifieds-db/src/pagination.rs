/// Requested page of a list query.
///
/// `number` is the raw page the client asked for; `None` means the query
/// parameter was absent or not an integer, which selects the first page.
/// Out-of-range integers (below 1 or past the end) select the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub number: Option<i64>,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(number: Option<i64>, per_page: u64) -> Self {
        Self {
            number,
            per_page: per_page.max(1),
        }
    }

    /// Parses the raw `page` query value.
    pub fn from_query(raw: Option<&str>, per_page: u64) -> Self {
        Self::new(raw.and_then(|v| v.trim().parse().ok()), per_page)
    }

    pub fn resolve(&self, total: u64) -> PageBounds {
        let num_pages = total.div_ceil(self.per_page).max(1);
        let number = match self.number {
            None => 1,
            Some(n) if n < 1 || n as u64 > num_pages => num_pages,
            Some(n) => n as u64,
        };

        PageBounds {
            number,
            num_pages,
            total,
            limit: self.per_page,
            offset: (number - 1) * self.per_page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBounds {
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

impl PageBounds {
    pub fn into_page<T>(self, items: Vec<T>) -> Page<T> {
        Page {
            items,
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            num_pages: self.num_pages,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_still_has_one_page() {
        let bounds = PageRequest::new(None, 10).resolve(0);
        assert_eq!(bounds.num_pages, 1);
        assert_eq!(bounds.number, 1);
        assert_eq!(bounds.offset, 0);
    }

    #[test]
    fn num_pages_rounds_up() {
        assert_eq!(PageRequest::new(None, 10).resolve(10).num_pages, 1);
        assert_eq!(PageRequest::new(None, 10).resolve(11).num_pages, 2);
        assert_eq!(PageRequest::new(None, 3).resolve(7).num_pages, 3);
    }

    #[test]
    fn garbage_page_selects_first() {
        let bounds = PageRequest::from_query(Some("abc"), 5).resolve(20);
        assert_eq!(bounds.number, 1);
    }

    #[test]
    fn out_of_range_page_selects_last() {
        let too_far = PageRequest::from_query(Some("99"), 5).resolve(12);
        assert_eq!(too_far.number, 3);
        assert_eq!(too_far.offset, 10);

        let zero = PageRequest::from_query(Some("0"), 5).resolve(12);
        assert_eq!(zero.number, 3);
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let bounds = PageRequest::new(Some(2), 0).resolve(3);
        assert_eq!(bounds.limit, 1);
        assert_eq!(bounds.number, 2);
        assert_eq!(bounds.offset, 1);
    }
}
