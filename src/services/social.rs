use reqwest::Method;

use crate::api_client::ApiClient;
use crate::api_client::models::{Id, User};
use crate::error::Result;

/// Follow relation endpoints.
pub struct SocialService<'a> {
    pub client: &'a ApiClient,
}

impl<'a> SocialService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// GET /users/:id/followers
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn followers(&self, user_id: &Id) -> Result<Vec<User>> {
        self.client
            .get_json(&format!("/users/{}/followers", user_id), &[])
            .await
    }

    /// GET /users/:id/following
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn following(&self, user_id: &Id) -> Result<Vec<User>> {
        self.client
            .get_json(&format!("/users/{}/following", user_id), &[])
            .await
    }

    /// POST /users/:id/follow
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn follow(&self, user_id: &Id) -> Result<()> {
        self.client
            .send_no_content(Method::POST, &format!("/users/{}/follow", user_id))
            .await
    }

    /// DELETE /users/:id/follow
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn unfollow(&self, user_id: &Id) -> Result<()> {
        self.client
            .send_no_content(Method::DELETE, &format!("/users/{}/follow", user_id))
            .await
    }
}
