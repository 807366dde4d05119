use crate::api_client::models::{Id, ProfileUpdate, User};
use crate::app::AppContext;
use crate::cache::CacheKey;
use crate::error::Result;

use super::{Access, Outcome, Page, Route, require_user};

/// The logged-in user's own page.
pub struct ProfileView<'a> {
    ctx: &'a AppContext,
}

impl<'a> ProfileView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    pub fn load(&self) -> Page<User> {
        match require_user(self.ctx) {
            Access::Granted(user) => Page::Ready(user),
            Access::Loading => Page::Loading,
            Access::Denied(route) => Page::Redirect(route),
        }
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn update(&self, patch: ProfileUpdate) -> Outcome {
        if let Access::Denied(route) = require_user(self.ctx) {
            return Outcome::Redirect(route);
        }
        let patch = ProfileUpdate {
            username: trimmed(patch.username),
            email: trimmed(patch.email),
        };
        if patch.is_empty() {
            return Outcome::Invalid("Nothing to update".into());
        }
        match self.ctx.users().update_me(&patch).await {
            Ok(user) => {
                self.ctx.session.set_user(user);
                self.ctx
                    .notifier
                    .success("Profile updated", "Your profile was updated successfully.");
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to update profile");
                self.ctx.notifier.error("Failed to update profile.");
                Outcome::Failed
            }
        }
    }
}

fn trimmed(field: Option<String>) -> Option<String> {
    field
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub user_id: Id,
    pub followers: Vec<User>,
    pub following: Vec<User>,
}

/// Followers and following of any user.
pub struct UserView<'a> {
    ctx: &'a AppContext,
}

impl<'a> UserView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    async fn followers(&self, id: &Id) -> Result<Vec<User>> {
        self.ctx
            .cache
            .get_or_fetch(CacheKey::Followers(id.clone()), || async move {
                self.ctx.social().followers(id).await
            })
            .await
    }

    async fn following(&self, id: &Id) -> Result<Vec<User>> {
        self.ctx
            .cache
            .get_or_fetch(CacheKey::Following(id.clone()), || async move {
                self.ctx.social().following(id).await
            })
            .await
    }

    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load(&self, user_id: &Id) -> Page<UserPage> {
        let (followers, following) =
            tokio::join!(self.followers(user_id), self.following(user_id));
        match (followers, following) {
            (Ok(followers), Ok(following)) => Page::Ready(UserPage {
                user_id: user_id.clone(),
                followers,
                following,
            }),
            (Err(e), _) | (_, Err(e)) => {
                tracing::warn!(error = %e, user_id = %user_id, "failed to load user");
                if e.status().is_some_and(|s| s.as_u16() == 404) {
                    Page::NotFound
                } else {
                    Page::Failed("Failed to load user.".into())
                }
            }
        }
    }
}
