use reqwest::Method;

use crate::api_client::ApiClient;
use crate::api_client::models::{Book, BookList, BookPayload, Id};
use crate::error::Result;
use crate::store::BookFilter;

pub struct BookService<'a> {
    pub client: &'a ApiClient,
}

/// Query pairs for `GET /books`. Empty search and genre are left out.
pub fn book_list_query(filter: &BookFilter) -> Vec<(&'static str, String)> {
    let mut q = Vec::with_capacity(4);
    if !filter.search.is_empty() {
        q.push(("search", filter.search.clone()));
    }
    if !filter.genre.is_empty() {
        q.push(("genre", filter.genre.clone()));
    }
    q.push(("page", filter.page.max(1).to_string()));
    q.push(("limit", filter.limit.to_string()));
    q
}

impl<'a> BookService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// GET /books
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_books(&self, filter: &BookFilter) -> Result<BookList> {
        self.client
            .get_json("/books", &book_list_query(filter))
            .await
    }

    /// GET /books/:id
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_book(&self, id: &Id) -> Result<Book> {
        self.client.get_json(&format!("/books/{}", id), &[]).await
    }

    /// POST /books
    #[tracing::instrument(level = "debug", skip(self, payload), fields(title = %payload.title))]
    pub async fn create_book(&self, payload: &BookPayload) -> Result<Book> {
        self.client.send_json(Method::POST, "/books", payload).await
    }

    /// PUT /books/:id
    #[tracing::instrument(level = "debug", skip(self, payload))]
    pub async fn update_book(&self, id: &Id, payload: &BookPayload) -> Result<Book> {
        self.client
            .send_json(Method::PUT, &format!("/books/{}", id), payload)
            .await
    }

    /// DELETE /books/:id
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn delete_book(&self, id: &Id) -> Result<()> {
        self.client
            .send_no_content(Method::DELETE, &format!("/books/{}", id))
            .await
    }
}
