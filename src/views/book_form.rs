use crate::api_client::models::{Book, BookPayload, DEFAULT_GENRE, Id};
use crate::app::AppContext;
use crate::cache::CacheKey;
use crate::error::ClientError;

use super::{Access, Outcome, Page, Route, require_user};

/// Editable fields of the create and edit forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookForm {
    pub title: String,
    pub author: String,
    pub description: String,
    pub genre: String,
    pub cover_image_url: String,
}

impl Default for BookForm {
    fn default() -> Self {
        BookForm {
            title: String::new(),
            author: String::new(),
            description: String::new(),
            genre: DEFAULT_GENRE.to_string(),
            cover_image_url: String::new(),
        }
    }
}

impl BookForm {
    /// Prefill from an existing book.
    pub fn from_book(book: &Book) -> Self {
        BookForm {
            title: book.title.clone(),
            author: book.author.clone(),
            description: book.description.clone().unwrap_or_default(),
            genre: book
                .genre
                .clone()
                .unwrap_or_else(|| DEFAULT_GENRE.to_string()),
            cover_image_url: book.cover_image_url.clone().unwrap_or_default(),
        }
    }

    pub fn validate(&self) -> Result<BookPayload, String> {
        let title = self.title.trim();
        let author = self.author.trim();
        if title.is_empty() || author.is_empty() {
            return Err("Title and author are required".into());
        }
        let genre = self.genre.trim();
        let cover = self.cover_image_url.trim();
        Ok(BookPayload {
            title: title.to_string(),
            author: author.to_string(),
            description: self.description.trim().to_string(),
            genre: (!genre.is_empty()).then(|| genre.to_string()),
            cover_image_url: (!cover.is_empty()).then(|| cover.to_string()),
        })
    }
}

fn invalidate_lists(ctx: &AppContext) {
    ctx.cache.invalidate_where(CacheKey::is_book_list);
}

pub struct NewBookView<'a> {
    ctx: &'a AppContext,
}

impl<'a> NewBookView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    pub fn load(&self) -> Page<BookForm> {
        match require_user(self.ctx) {
            Access::Granted(_) => Page::Ready(BookForm::default()),
            Access::Loading => Page::Loading,
            Access::Denied(route) => Page::Redirect(route),
        }
    }

    #[tracing::instrument(level = "debug", skip_all)]
    pub async fn submit(&self, form: &BookForm) -> Outcome {
        if let Access::Denied(route) = require_user(self.ctx) {
            return Outcome::Redirect(route);
        }
        let payload = match form.validate() {
            Ok(p) => p,
            Err(msg) => return Outcome::Invalid(msg),
        };
        match self.ctx.books().create_book(&payload).await {
            Ok(book) => {
                invalidate_lists(self.ctx);
                self.ctx.cache.set(CacheKey::Book(book.id.clone()), book.clone());
                self.ctx
                    .notifier
                    .success("Book created", "The book was added successfully.");
                Outcome::Redirect(Route::Book(book.id))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to create book");
                self.ctx.notifier.error("Failed to create book.");
                Outcome::Failed
            }
        }
    }
}

/// Edit page for a book the viewer owns.
pub struct EditBookView<'a> {
    ctx: &'a AppContext,
}

impl<'a> EditBookView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load(&self, id: &Id) -> Page<BookForm> {
        let user = match require_user(self.ctx) {
            Access::Granted(user) => user,
            Access::Loading => return Page::Loading,
            Access::Denied(route) => return Page::Redirect(route),
        };
        let book = self
            .ctx
            .cache
            .get_or_fetch(CacheKey::Book(id.clone()), || async move {
                self.ctx.books().get_book(id).await
            })
            .await;
        match book {
            Ok(book) if book.is_owned_by(&user) => Page::Ready(BookForm::from_book(&book)),
            Ok(_) => {
                tracing::debug!(book_id = %id, "not the owner, leaving edit page");
                Page::Redirect(Route::Home)
            }
            Err(ClientError::Request { status, .. }) if status.as_u16() == 404 => Page::NotFound,
            Err(e) => {
                tracing::warn!(error = %e, book_id = %id, "failed to load book");
                Page::Failed("Failed to load book.".into())
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self, form))]
    pub async fn submit(&self, id: &Id, form: &BookForm) -> Outcome {
        if let Access::Denied(route) = require_user(self.ctx) {
            return Outcome::Redirect(route);
        }
        let payload = match form.validate() {
            Ok(p) => p,
            Err(msg) => return Outcome::Invalid(msg),
        };
        match self.ctx.books().update_book(id, &payload).await {
            Ok(book) => {
                invalidate_lists(self.ctx);
                self.ctx.cache.set(CacheKey::Book(id.clone()), book);
                self.ctx
                    .notifier
                    .success("Book updated", "The book was updated successfully.");
                Outcome::Redirect(Route::Book(id.clone()))
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to update book");
                self.ctx.notifier.error("Failed to update book.");
                Outcome::Failed
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete(&self, id: &Id) -> Outcome {
        if let Access::Denied(route) = require_user(self.ctx) {
            return Outcome::Redirect(route);
        }
        match self.ctx.books().delete_book(id).await {
            Ok(()) => {
                let book = id.clone();
                self.ctx
                    .cache
                    .invalidate_where(|k| k.is_book_list() || k.concerns_book(&book));
                self.ctx
                    .notifier
                    .success("Book deleted", "The book was deleted successfully.");
                Outcome::Redirect(Route::Home)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to delete book");
                self.ctx.notifier.error("Failed to delete book.");
                Outcome::Failed
            }
        }
    }
}
