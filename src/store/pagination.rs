/// Page controls derived from a list response's `total` and the filter's `limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
}

impl Pagination {
    pub fn new(page: u32, limit: u32, total: u64) -> Self {
        Pagination { page, limit, total }
    }

    pub fn page_count(&self) -> u32 {
        if self.limit == 0 {
            return 0;
        }
        let pages = self.total.div_ceil(u64::from(self.limit));
        u32::try_from(pages).unwrap_or(u32::MAX)
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count()
    }

    pub fn can_go_to(&self, page: u32) -> bool {
        page >= 1 && page <= self.page_count()
    }
}
