use std::sync::Arc;

use crate::api_client::ApiClient;
use crate::cache::QueryCache;
use crate::config::Config;
use crate::error::Result;
use crate::notify::Notifier;
use crate::services::{BookService, CommentService, ReviewService, SocialService, UserService};
use crate::session::{AuthState, Session};
use crate::storage::{FileStorage, LocalStorage};
use crate::store::{BookFilter, FilterStore};

/// Everything a page needs, built once at start and passed down explicitly.
#[derive(Debug)]
pub struct AppContext {
    pub client: ApiClient,
    pub session: Session,
    pub cache: QueryCache,
    pub filter: FilterStore,
    pub notifier: Notifier,
}

impl AppContext {
    pub fn new(client: ApiClient, page_limit: u32) -> Self {
        AppContext {
            session: Session::new(client.clone()),
            client,
            cache: QueryCache::new(),
            filter: FilterStore::new(BookFilter {
                limit: page_limit,
                ..Default::default()
            }),
            notifier: Notifier::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let storage: Arc<dyn LocalStorage> = Arc::new(FileStorage::new(&config.storage_path));
        let client = ApiClient::new(&config.api_url, storage)?;
        Ok(Self::new(client, config.page_limit))
    }

    /// Restore the session from storage.
    pub async fn start(&self) -> AuthState {
        self.session.init().await
    }

    /// Tear down the session and drop everything cached for it.
    pub fn logout(&self) -> Result<()> {
        self.cache.clear();
        self.session.logout()
    }

    pub fn books(&self) -> BookService<'_> {
        BookService::new(&self.client)
    }

    pub fn comments(&self) -> CommentService<'_> {
        CommentService::new(&self.client)
    }

    pub fn reviews(&self) -> ReviewService<'_> {
        ReviewService::new(&self.client)
    }

    pub fn social(&self) -> SocialService<'_> {
        SocialService::new(&self.client)
    }

    pub fn users(&self) -> UserService<'_> {
        UserService::new(&self.client)
    }
}
