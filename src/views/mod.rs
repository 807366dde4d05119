//! Page controllers.
//!
//! Each page reads through the [`QueryCache`](crate::cache::QueryCache), runs its
//! mutations through the service layer and turns every request failure into a toast
//! or an inline message. Nothing here aborts the application.

pub mod auth;
pub mod book_detail;
pub mod book_form;
pub mod catalog;
pub mod profile;

use std::fmt;

use crate::api_client::models::{Id, User, UserSummary};
use crate::app::AppContext;

pub use auth::{LoginView, RegisterView};
pub use book_detail::{BookDetail, BookDetailView};
pub use book_form::{BookForm, EditBookView, NewBookView};
pub use catalog::{CatalogPage, CatalogView};
pub use profile::{ProfileView, UserPage, UserView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Login,
    Register,
    Profile,
    NewBook,
    Book(Id),
    EditBook(Id),
    User(Id),
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Home => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Profile => write!(f, "/profile"),
            Route::NewBook => write!(f, "/books/new"),
            Route::Book(id) => write!(f, "/books/{}", id),
            Route::EditBook(id) => write!(f, "/books/{}/edit", id),
            Route::User(id) => write!(f, "/users/{}", id),
        }
    }
}

/// Result of loading a page.
#[derive(Debug, Clone, PartialEq)]
pub enum Page<T> {
    /// Session restore still running.
    Loading,
    Ready(T),
    Redirect(Route),
    NotFound,
    /// Inline error message.
    Failed(String),
}

impl<T> Page<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Page::Ready(v) => Some(v),
            _ => None,
        }
    }
}

/// Result of a form submission or button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Redirect(Route),
    /// Rejected before any request; message shown inline.
    Invalid(String),
    /// Request failed; an error toast was raised.
    Failed,
}

pub enum Access {
    Granted(User),
    Loading,
    Denied(Route),
}

/// Owner-only pages send anonymous visitors to the login page.
pub fn require_user(ctx: &AppContext) -> Access {
    let state = ctx.session.state();
    match state.user {
        Some(user) => Access::Granted(user),
        None if state.loading => Access::Loading,
        None => Access::Denied(Route::Login),
    }
}

pub(crate) fn display_name(user: Option<&UserSummary>) -> &str {
    user.map(|u| u.username.as_str()).unwrap_or("Unknown")
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::app::AppContext;
    use crate::storage::{LocalStorage, MemoryStorage};
    use crate::test_support::MockServer;

    /// Context wired to the mock backend, with `user` logged in when given.
    pub async fn context(server: &MockServer, user: Option<(&str, &str)>) -> AppContext {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::new());
        let ctx = AppContext::new(server.client(storage), 10);
        ctx.start().await;
        if let Some((name, password)) = user {
            ctx.session.login(name, password).await.unwrap();
        }
        ctx
    }
}
