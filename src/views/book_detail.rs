use crate::api_client::models::{Book, Comment, Id, Rating, Review, User};
use crate::app::AppContext;
use crate::cache::CacheKey;
use crate::error::{ClientError, Result};
use crate::services::comments::{DEFAULT_COMMENT_LIMIT, DEFAULT_COMMENT_PAGE};

use super::{Outcome, Page, Route};

#[derive(Debug, Clone, PartialEq)]
pub struct BookDetail {
    pub book: Book,
    pub viewer: Option<User>,
    pub is_own_book: bool,
    /// Follow button shown: logged in, not the owner, owner known.
    pub can_follow: bool,
    pub is_following: bool,
    pub followers: Vec<User>,
    pub comments: Vec<Comment>,
    pub reviews: Vec<Review>,
    pub average_rating: Option<f64>,
}

impl BookDetail {
    pub fn follower_label(&self) -> String {
        match self.followers.len() {
            1 => "1 follower".to_string(),
            n => format!("{n} followers"),
        }
    }

    pub fn average_label(&self) -> String {
        match self.average_rating {
            Some(avg) if avg > 0.0 => format!("{avg:.1}"),
            _ => "No ratings yet".to_string(),
        }
    }
}

pub struct BookDetailView<'a> {
    ctx: &'a AppContext,
}

impl<'a> BookDetailView<'a> {
    pub fn new(ctx: &'a AppContext) -> Self {
        Self { ctx }
    }

    async fn book(&self, id: &Id) -> Result<Book> {
        self.ctx
            .cache
            .get_or_fetch(CacheKey::Book(id.clone()), || async move {
                self.ctx.books().get_book(id).await
            })
            .await
    }

    async fn comments(&self, id: &Id) -> Result<Vec<Comment>> {
        let key = CacheKey::Comments {
            book: id.clone(),
            page: DEFAULT_COMMENT_PAGE,
            limit: DEFAULT_COMMENT_LIMIT,
        };
        self.ctx
            .cache
            .get_or_fetch(key, || async move {
                self.ctx
                    .comments()
                    .list_comments(id, DEFAULT_COMMENT_PAGE, DEFAULT_COMMENT_LIMIT)
                    .await
                    .map(|page| page.data)
            })
            .await
    }

    async fn reviews(&self, id: &Id) -> Result<Vec<Review>> {
        self.ctx
            .cache
            .get_or_fetch(CacheKey::Reviews(id.clone()), || async move {
                self.ctx.reviews().list_reviews(id).await
            })
            .await
    }

    async fn average(&self, id: &Id) -> Result<Option<f64>> {
        self.ctx
            .cache
            .get_or_fetch(CacheKey::AverageRating(id.clone()), || async move {
                self.ctx.reviews().average_rating(id).await
            })
            .await
    }

    async fn followers(&self, user_id: &Id) -> Result<Vec<User>> {
        self.ctx
            .cache
            .get_or_fetch(CacheKey::Followers(user_id.clone()), || async move {
                self.ctx.social().followers(user_id).await
            })
            .await
    }

    /// Book first, then comments, reviews and rating side by side, with the
    /// author's followers as soon as the owner id is known.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn load(&self, id: &Id) -> Page<BookDetail> {
        let book = match self.book(id).await {
            Ok(book) => book,
            Err(ClientError::Request { status, .. }) if status.as_u16() == 404 => {
                return Page::NotFound;
            }
            Err(e) => {
                tracing::warn!(error = %e, book_id = %id, "failed to load book");
                return Page::Failed("Failed to load book.".into());
            }
        };

        let owner = book.owner_id().cloned();
        let followers_fut = async {
            match &owner {
                Some(owner) => self.followers(owner).await,
                None => Ok(Vec::new()),
            }
        };
        let (comments, reviews, average, followers) = tokio::join!(
            self.comments(id),
            self.reviews(id),
            self.average(id),
            followers_fut
        );

        let comments = or_empty(comments, "comments");
        let reviews = or_empty(reviews, "reviews");
        let followers = or_empty(followers, "followers");
        let average_rating = average.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "failed to load average rating");
            None
        });

        let viewer = self.ctx.session.user();
        let is_own_book = viewer.as_ref().is_some_and(|v| book.is_owned_by(v));
        let is_following = viewer
            .as_ref()
            .is_some_and(|v| followers.iter().any(|f| f.id == v.id));
        let can_follow = viewer.is_some() && !is_own_book && owner.is_some();

        Page::Ready(BookDetail {
            book,
            viewer,
            is_own_book,
            can_follow,
            is_following,
            followers,
            comments,
            reviews,
            average_rating,
        })
    }

    #[tracing::instrument(level = "debug", skip(self, content))]
    pub async fn post_comment(&self, book_id: &Id, content: &str) -> Outcome {
        if self.ctx.session.user().is_none() {
            return Outcome::Redirect(Route::Login);
        }
        if content.trim().is_empty() {
            return Outcome::Invalid("Comment cannot be empty".into());
        }
        match self.ctx.comments().post_comment(book_id, content).await {
            Ok(_) => {
                let book = book_id.clone();
                self.ctx.cache.invalidate_where(|k| {
                    matches!(k, CacheKey::Comments { book: b, .. } if *b == book)
                        || *k == CacheKey::Book(book.clone())
                });
                self.ctx
                    .notifier
                    .success("Comment posted!", "Your comment was added.");
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to post comment");
                self.ctx.notifier.error("Failed to post comment.");
                Outcome::Failed
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self, content))]
    pub async fn post_review(&self, book_id: &Id, content: &str, rating: u8) -> Outcome {
        if self.ctx.session.user().is_none() {
            return Outcome::Redirect(Route::Login);
        }
        if content.trim().is_empty() {
            return Outcome::Invalid("Review content is required".into());
        }
        let rating = match Rating::new(rating) {
            Ok(r) => r,
            Err(msg) => return Outcome::Invalid(msg),
        };
        match self
            .ctx
            .reviews()
            .create_review(book_id, content, rating)
            .await
        {
            Ok(_) => {
                self.ctx.cache.invalidate(&CacheKey::Reviews(book_id.clone()));
                self.ctx
                    .cache
                    .invalidate(&CacheKey::AverageRating(book_id.clone()));
                self.ctx
                    .notifier
                    .success("Review posted!", "Your review was added.");
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to post review");
                self.ctx.notifier.error("Failed to post review.");
                Outcome::Failed
            }
        }
    }

    /// Follow the book's author, or unfollow when already following.
    pub async fn toggle_follow(&self, book: &Book) -> Outcome {
        let Some(viewer) = self.ctx.session.user() else {
            return Outcome::Redirect(Route::Login);
        };
        let Some(owner) = book.owner_id() else {
            return Outcome::Invalid("This book has no known author account".into());
        };
        let following = match self.followers(owner).await {
            Ok(followers) => followers.iter().any(|f| f.id == viewer.id),
            Err(e) => {
                tracing::warn!(error = %e, "failed to load followers");
                self.ctx.notifier.error("Failed to load followers.");
                return Outcome::Failed;
            }
        };
        if following {
            self.unfollow_author(book).await
        } else {
            self.follow_author(book).await
        }
    }

    #[tracing::instrument(level = "debug", skip(self, book), fields(book_id = %book.id))]
    pub async fn follow_author(&self, book: &Book) -> Outcome {
        let (viewer, owner, name) = match self.follow_target(book) {
            Ok(t) => t,
            Err(outcome) => return outcome,
        };
        match self.ctx.social().follow(&owner).await {
            Ok(()) => {
                self.after_follow_change(&viewer, &owner);
                self.ctx
                    .notifier
                    .success("Followed!", &format!("You are now following {name}."));
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to follow user");
                self.ctx.notifier.error("Failed to follow user.");
                Outcome::Failed
            }
        }
    }

    #[tracing::instrument(level = "debug", skip(self, book), fields(book_id = %book.id))]
    pub async fn unfollow_author(&self, book: &Book) -> Outcome {
        let (viewer, owner, name) = match self.follow_target(book) {
            Ok(t) => t,
            Err(outcome) => return outcome,
        };
        match self.ctx.social().unfollow(&owner).await {
            Ok(()) => {
                self.after_follow_change(&viewer, &owner);
                self.ctx
                    .notifier
                    .info("Unfollowed", &format!("You have unfollowed {name}."));
                Outcome::Done
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to unfollow user");
                self.ctx.notifier.error("Failed to unfollow user.");
                Outcome::Failed
            }
        }
    }

    fn follow_target(&self, book: &Book) -> std::result::Result<(User, Id, String), Outcome> {
        let viewer = self
            .ctx
            .session
            .user()
            .ok_or(Outcome::Redirect(Route::Login))?;
        let owner = book
            .created_by
            .as_ref()
            .and_then(|u| u.id.clone().map(|id| (id, u.username.clone())));
        let Some((owner, name)) = owner else {
            return Err(Outcome::Invalid(
                "This book has no known author account".into(),
            ));
        };
        if owner == viewer.id {
            return Err(Outcome::Invalid("You cannot follow yourself".into()));
        }
        Ok((viewer, owner, name))
    }

    fn after_follow_change(&self, viewer: &User, owner: &Id) {
        self.ctx.cache.invalidate(&CacheKey::Followers(owner.clone()));
        self.ctx
            .cache
            .invalidate(&CacheKey::Following(viewer.id.clone()));
    }
}

fn or_empty<T>(res: Result<Vec<T>>, what: &str) -> Vec<T> {
    res.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load {}", what);
        Vec::new()
    })
}
