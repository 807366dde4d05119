//! Client side of a book sharing site: REST client, session handling, query
//! cache and page controllers, driven from the `bookshelf` terminal front end.

pub mod api_client;
pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod notify;
pub mod services;
pub mod session;
pub mod storage;
pub mod store;
pub mod views;

#[cfg(test)]
mod test_support;

pub use api_client::ApiClient;
pub use app::AppContext;
pub use config::Config;
pub use error::{ClientError, Result};
