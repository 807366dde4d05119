use reqwest::Method;

use crate::api_client::ApiClient;
use crate::api_client::models::{ProfileUpdate, User};
use crate::error::Result;

pub struct UserService<'a> {
    pub client: &'a ApiClient,
}

impl<'a> UserService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// GET /users/me
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn me(&self) -> Result<User> {
        self.client.get_json("/users/me", &[]).await
    }

    /// PUT /users/me
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn update_me(&self, patch: &ProfileUpdate) -> Result<User> {
        self.client.send_json(Method::PUT, "/users/me", patch).await
    }
}
