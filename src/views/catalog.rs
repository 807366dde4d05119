use crate::api_client::models::{Book, BookList};
use crate::app::AppContext;
use crate::cache::CacheKey;
use crate::error::Result;
use crate::store::{BookFilter, FilterPatch, Pagination};

use super::Page;

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogPage {
    pub filter: BookFilter,
    pub books: Vec<Book>,
    pub pagination: Pagination,
    pub empty: bool,
}

impl CatalogPage {
    /// True when the "all genres" choice is active.
    pub fn genre_is_unfiltered(&self) -> bool {
        self.filter.genre.is_empty()
    }
}

/// Book list driven by the filter store.
pub struct CatalogView<'a> {
    ctx: &'a AppContext,
}

impl<'a> CatalogView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    async fn fetch(&self, filter: &BookFilter) -> Result<BookList> {
        self.ctx
            .cache
            .get_or_fetch(CacheKey::Books(filter.clone()), || async move {
                self.ctx.books().list_books(filter).await
            })
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load(&self) -> Page<CatalogPage> {
        let filter = self.ctx.filter.filter();
        match self.fetch(&filter).await {
            Ok(list) => Page::Ready(CatalogPage {
                pagination: Pagination::new(filter.page, filter.limit, list.total),
                empty: list.data.is_empty(),
                books: list.data,
                filter,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load books");
                Page::Failed("Failed to load books.".into())
            }
        }
    }

    /// New search text; back to the first page.
    pub fn search(&self, text: &str) -> BookFilter {
        self.ctx.filter.set_filter(FilterPatch {
            search: Some(text.to_string()),
            page: Some(1),
            ..Default::default()
        })
    }

    /// New genre (empty for all genres); back to the first page.
    pub fn genre(&self, genre: &str) -> BookFilter {
        self.ctx.filter.set_filter(FilterPatch {
            genre: Some(genre.to_string()),
            page: Some(1),
            ..Default::default()
        })
    }

    /// Move to `page` if it exists for the current result set. Returns whether the
    /// filter changed.
    pub async fn go_to(&self, page: u32) -> bool {
        let filter = self.ctx.filter.filter();
        let total = match self.fetch(&filter).await {
            Ok(list) => list.total,
            Err(e) => {
                tracing::warn!(error = %e, "cannot paginate without a result set");
                return false;
            }
        };
        let pagination = Pagination::new(filter.page, filter.limit, total);
        if page == filter.page || !pagination.can_go_to(page) {
            return false;
        }
        self.ctx.filter.set_filter(FilterPatch::page(page));
        true
    }

    pub async fn next(&self) -> bool {
        let page = self.ctx.filter.filter().page;
        self.go_to(page.saturating_add(1)).await
    }

    pub async fn prev(&self) -> bool {
        let page = self.ctx.filter.filter().page;
        if page <= 1 {
            return false;
        }
        self.go_to(page - 1).await
    }
}
