use reqwest::Method;

use crate::api_client::ApiClient;
use crate::api_client::models::{Comment, CommentPage, CommentPayload, Id};
use crate::error::Result;

pub const DEFAULT_COMMENT_PAGE: u32 = 1;
pub const DEFAULT_COMMENT_LIMIT: u32 = 10;

pub struct CommentService<'a> {
    pub client: &'a ApiClient,
}

impl<'a> CommentService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// GET /books/:id/comments
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_comments(&self, book_id: &Id, page: u32, limit: u32) -> Result<CommentPage> {
        self.client
            .get_json(
                &format!("/books/{}/comments", book_id),
                &[("page", page.max(1).to_string()), ("limit", limit.to_string())],
            )
            .await
    }

    /// POST /books/:id/comments
    #[tracing::instrument(level = "debug", skip(self, content))]
    pub async fn post_comment(&self, book_id: &Id, content: &str) -> Result<Comment> {
        self.client
            .send_json(
                Method::POST,
                &format!("/books/{}/comments", book_id),
                &CommentPayload { content },
            )
            .await
    }
}
