use crate::app::AppContext;

use super::{Outcome, Route};

pub struct LoginView<'a> {
    ctx: &'a AppContext,
}

impl<'a> LoginView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn submit(&self, username_or_email: &str, password: &str) -> Outcome {
        if username_or_email.trim().is_empty() || password.is_empty() {
            return Outcome::Invalid("Username and password are required".into());
        }
        match self.ctx.session.login(username_or_email.trim(), password).await {
            Ok(_) => {
                self.ctx.cache.clear();
                Outcome::Redirect(Route::Profile)
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                Outcome::Invalid("Invalid credentials".into())
            }
        }
    }
}

pub struct RegisterView<'a> {
    ctx: &'a AppContext,
}

impl<'a> RegisterView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    #[tracing::instrument(level = "debug", skip(self, password))]
    pub async fn submit(&self, username: &str, email: &str, password: &str) -> Outcome {
        let (username, email) = (username.trim(), email.trim());
        if username.is_empty() || email.is_empty() || password.is_empty() {
            return Outcome::Invalid("All fields are required".into());
        }
        match self.ctx.session.register(username, email, password).await {
            Ok(_) => {
                self.ctx.cache.clear();
                Outcome::Redirect(Route::Profile)
            }
            Err(e) => {
                tracing::warn!(error = %e, "registration failed");
                Outcome::Invalid("Registration failed".into())
            }
        }
    }
}
