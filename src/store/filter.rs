use parking_lot::RwLock;

pub const DEFAULT_LIMIT: u32 = 10;

/// Search, genre and page state driving the catalog query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BookFilter {
    pub search: String,
    pub genre: String,
    /// 1-based
    pub page: u32,
    pub limit: u32,
}

impl Default for BookFilter {
    fn default() -> Self {
        BookFilter {
            search: String::new(),
            genre: String::new(),
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Partial update; `None` keys keep their current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterPatch {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl FilterPatch {
    pub fn page(page: u32) -> Self {
        FilterPatch {
            page: Some(page),
            ..Default::default()
        }
    }
}

impl BookFilter {
    pub fn merge(&mut self, patch: FilterPatch) {
        if let Some(search) = patch.search {
            self.search = search;
        }
        if let Some(genre) = patch.genre {
            self.genre = genre;
        }
        if let Some(page) = patch.page {
            self.page = page;
        }
        if let Some(limit) = patch.limit {
            self.limit = limit;
        }
    }
}

/// Holds the current filter for the lifetime of a session. Performs no validation.
#[derive(Debug, Default)]
pub struct FilterStore {
    filter: RwLock<BookFilter>,
}

impl FilterStore {
    pub fn new(initial: BookFilter) -> Self {
        FilterStore {
            filter: RwLock::new(initial),
        }
    }

    pub fn filter(&self) -> BookFilter {
        self.filter.read().clone()
    }

    /// Merge `patch` into the current filter and return the result.
    pub fn set_filter(&self, patch: FilterPatch) -> BookFilter {
        let mut filter = self.filter.write();
        filter.merge(patch);
        tracing::debug!(?filter, "filter updated");
        filter.clone()
    }

    pub fn reset(&self) {
        *self.filter.write() = BookFilter::default();
    }
}
