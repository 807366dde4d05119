use reqwest::Method;

use crate::api_client::ApiClient;
use crate::api_client::models::{Id, Rating, Review, ReviewPayload};
use crate::error::Result;

pub struct ReviewService<'a> {
    pub client: &'a ApiClient,
}

impl<'a> ReviewService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// GET /books/:id/reviews
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn list_reviews(&self, book_id: &Id) -> Result<Vec<Review>> {
        self.client
            .get_json(&format!("/books/{}/reviews", book_id), &[])
            .await
    }

    /// GET /books/:id/reviews/average. `None` when the book has no ratings yet.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn average_rating(&self, book_id: &Id) -> Result<Option<f64>> {
        let path = format!("/books/{}/reviews/average", book_id);
        // the body is `null` or a bare number
        let avg: Option<Option<f64>> = self.client.fetch(&path, Default::default()).await?;
        Ok(avg.flatten())
    }

    /// POST /books/:id/reviews
    #[tracing::instrument(level = "debug", skip(self, content))]
    pub async fn create_review(&self, book_id: &Id, content: &str, rating: Rating) -> Result<Review> {
        self.client
            .send_json(
                Method::POST,
                &format!("/books/{}/reviews", book_id),
                &ReviewPayload { content, rating },
            )
            .await
    }
}
