pub mod auth;
pub mod books;
pub mod comments;
pub mod reviews;
pub mod social;
pub mod users;

pub use auth::AuthService;
pub use books::BookService;
pub use comments::CommentService;
pub use reviews::ReviewService;
pub use social::SocialService;
pub use users::UserService;
