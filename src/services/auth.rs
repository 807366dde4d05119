use reqwest::Method;

use crate::api_client::ApiClient;
use crate::api_client::models::{AuthResponse, LoginRequest, RegisterRequest};
use crate::error::Result;

/// Credential exchange. Storing the returned token is the session's job.
pub struct AuthService<'a> {
    pub client: &'a ApiClient,
}

impl<'a> AuthService<'a> {
    pub fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// POST /auth/login
    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn login(&self, username_or_email: &str, password: &str) -> Result<AuthResponse> {
        let body = LoginRequest {
            username_or_email,
            password,
        };
        self.client
            .send_json(Method::POST, "/auth/login", &body)
            .await
    }

    /// POST /auth/register
    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse> {
        let body = RegisterRequest {
            username,
            email,
            password,
        };
        self.client
            .send_json(Method::POST, "/auth/register", &body)
            .await
    }
}
